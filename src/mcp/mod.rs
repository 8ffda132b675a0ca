//! Protocol dispatch engine and its HTTP transport.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Protocol Server                        │
//! │                                                              │
//! │   ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │   │  Transport  │───▶│ Dispatcher  │───▶│ Registries  │      │
//! │   │   (HTTP)    │    │ (validator) │    │ (handlers)  │      │
//! │   └─────────────┘    └─────────────┘    └─────────────┘      │
//! │          │                  │                  │             │
//! │          ▼                  ▼                  ▼             │
//! │   ┌───────────────────────────────────────────────────┐      │
//! │   │          Request / Response Envelopes             │      │
//! │   └───────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! Initialisation always reports protocol version `1.0`.

pub mod dispatcher;
pub mod protocol;
pub mod registry;
pub mod transport;
pub mod validator;

pub use dispatcher::ProtocolDispatcher;
pub use protocol::{ErrorCode, Request, RequestKind, ResponseEnvelope, PROTOCOL_VERSION};
pub use registry::{
    HandlerResult, ResourceDescriptor, ResourceHandler, ToolDescriptor, ToolHandler,
};
pub use transport::build_router;
pub use validator::{classify, Classification};
