//! Request and response envelope types.
//!
//! Requests arrive as untyped JSON and are turned into a [`Request`] by the
//! validator. Responses are always a [`ResponseEnvelope`]:
//!
//! ```json
//! {"status": "success", "result": {...}}
//! {"status": "error", "error": {"code": "TOOL_NOT_FOUND", "message": "..."}}
//! ```
//!
//! [`ErrorCode::http_status`] maps error codes to the HTTP status used by
//! the transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mcp::registry::{ResourceDescriptor, ToolDescriptor};

/// Protocol version returned in every initialisation response.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Client identity sent with an initialisation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    pub version: String,
}

/// Which registries a discovery request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryType {
    /// Tools only.
    Tools,
    /// Resources only.
    Resources,
    /// Both tools and resources.
    All,
}

impl DiscoveryType {
    /// Parses the wire value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tools" => Some(Self::Tools),
            "resources" => Some(Self::Resources),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Whether tools are included.
    #[must_use]
    pub const fn includes_tools(self) -> bool {
        matches!(self, Self::Tools | Self::All)
    }

    /// Whether resources are included.
    #[must_use]
    pub const fn includes_resources(self) -> bool {
        matches!(self, Self::Resources | Self::All)
    }
}

/// The kind a raw envelope was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Session negotiation.
    Init,
    /// Tool/resource listing.
    Discovery,
    /// Tool invocation.
    ToolCall,
    /// Resource fetch.
    ResourceCall,
    /// Not recognisable as any request.
    Unknown,
}

impl RequestKind {
    /// Short name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Discovery => "discovery",
            Self::ToolCall => "tool",
            Self::ResourceCall => "resource",
            Self::Unknown => "unknown",
        }
    }
}

/// A validated request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// `{version, client: {name, version}}`
    Init {
        /// Version string sent by the client (accepted as-is).
        version: String,
        /// Client identity.
        client: ClientInfo,
    },
    /// `{type: "tools" | "resources" | "all"}`
    Discovery(DiscoveryType),
    /// `{tool, params}`
    ToolCall {
        /// Tool name.
        tool: String,
        /// Tool parameters (always an object).
        params: Value,
    },
    /// `{resource, params?}`
    ResourceCall {
        /// Resource name.
        resource: String,
        /// Optional parameters (an object when present).
        params: Option<Value>,
    },
}

impl Request {
    /// Returns the kind of this request.
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::Init { .. } => RequestKind::Init,
            Self::Discovery(_) => RequestKind::Discovery,
            Self::ToolCall { .. } => RequestKind::ToolCall,
            Self::ResourceCall { .. } => RequestKind::ResourceCall,
        }
    }
}

/// Protocol error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or unclassifiable envelope.
    InvalidRequest,
    /// Recognised shape with failed field constraints.
    ValidationError,
    /// No tool (or resource) registered under the requested name.
    ToolNotFound,
    /// Documentation lookup miss.
    ComponentNotFound,
    /// Client exceeded its request budget.
    RateLimitExceeded,
    /// A handler failed.
    InternalError,
}

impl ErrorCode {
    /// Returns the wire string for this code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ToolNotFound => "TOOL_NOT_FOUND",
            Self::ComponentNotFound => "COMPONENT_NOT_FOUND",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Parses a wire string. Unknown strings map to `InternalError`.
    #[must_use]
    pub fn from_wire(code: &str) -> Self {
        match code {
            "INVALID_REQUEST" => Self::InvalidRequest,
            "VALIDATION_ERROR" => Self::ValidationError,
            "TOOL_NOT_FOUND" => Self::ToolNotFound,
            "COMPONENT_NOT_FOUND" => Self::ComponentNotFound,
            "RATE_LIMIT_EXCEEDED" => Self::RateLimitExceeded,
            _ => Self::InternalError,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidRequest => 400,
            Self::ValidationError => 422,
            Self::ToolNotFound | Self::ComponentNotFound => 404,
            Self::RateLimitExceeded => 429,
            Self::InternalError => 500,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a wire error code to an HTTP status; unknown codes give 500.
#[must_use]
pub fn status_for_code(code: &str) -> u16 {
    ErrorCode::from_wire(code).http_status()
}

/// Status discriminant of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// The request succeeded.
    Success,
    /// The request failed; see `error`.
    Error,
}

/// Error object of an error envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Human-readable summary.
    pub message: String,
    /// Extra detail (validation messages, handler error text).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Server identity returned by an initialisation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// Server description.
    pub description: String,
    /// Advertised capabilities.
    pub capabilities: Vec<String>,
}

/// A response envelope. Only the fields relevant to the request kind are
/// serialised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    /// Outcome.
    pub status: ResponseStatus,
    /// Protocol version (init only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Server identity (init only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerInfo>,
    /// Registered tools (discovery only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDescriptor>>,
    /// Registered resources (discovery only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<ResourceDescriptor>>,
    /// Tool call result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Resource call data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ResponseEnvelope {
    const fn empty(status: ResponseStatus) -> Self {
        Self {
            status,
            version: None,
            server: None,
            tools: None,
            resources: None,
            result: None,
            data: None,
            error: None,
        }
    }

    /// Builds an initialisation response.
    #[must_use]
    pub fn init(server: ServerInfo) -> Self {
        Self {
            version: Some(PROTOCOL_VERSION.to_string()),
            server: Some(server),
            ..Self::empty(ResponseStatus::Success)
        }
    }

    /// Builds a discovery response.
    #[must_use]
    pub fn discovery(
        tools: Option<Vec<ToolDescriptor>>,
        resources: Option<Vec<ResourceDescriptor>>,
    ) -> Self {
        Self {
            tools,
            resources,
            ..Self::empty(ResponseStatus::Success)
        }
    }

    /// Builds a successful tool call response.
    #[must_use]
    pub fn tool_result(result: Value) -> Self {
        Self {
            result: Some(result),
            ..Self::empty(ResponseStatus::Success)
        }
    }

    /// Builds a successful resource call response.
    #[must_use]
    pub fn resource_data(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::empty(ResponseStatus::Success)
        }
    }

    /// Builds an error response.
    #[must_use]
    pub fn error(code: ErrorCode, message: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            error: Some(ErrorBody {
                code,
                message: message.into(),
                details,
            }),
            ..Self::empty(ResponseStatus::Error)
        }
    }

    /// Returns `true` for a success envelope.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Returns the error code of an error envelope.
    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }

    /// Returns the HTTP status for this envelope.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.error_code().map_or(200, ErrorCode::http_status)
    }
}
