//! component-docs-mcp: protocol server for a UI component documentation
//! knowledge base
//!
//! AI assistants and scripts talk to this server with small JSON envelopes
//! carried over HTTP. They negotiate a session, discover the available
//! operations, then invoke named tools or fetch named resources.
//!
//! # Architecture
//!
//! - **Context**: configuration snapshot, rate limiting, CORS and security
//!   header policy, gated protocol logging
//! - **Dispatcher**: request classification, registry lookup, handler
//!   invocation with uniform error envelopes
//! - **Transport**: axum routes carrying envelopes, error codes mapped to
//!   HTTP statuses
//! - **Docs**: the documentation store, reached only through registered
//!   handler closures
//!
//! # Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`context`]: Shared server context
//! - [`docs`]: Documentation tools and resources
//! - [`error`]: Error types
//! - [`mcp`]: Protocol dispatch and HTTP transport
//! - [`rate_limit`]: Per-client rate limiting

pub mod config;
pub mod context;
pub mod docs;
pub mod error;
pub mod mcp;
pub mod rate_limit;
