//! Request classification and validation.
//!
//! A raw envelope is matched against the request shapes in a fixed order:
//! Init, Discovery, ToolCall, ResourceCall. The first shape whose marker
//! keys are present wins, even if its field constraints then fail, so an
//! object carrying both `type` and `tool` is always a Discovery request.

use serde_json::{Map, Value};

use crate::mcp::protocol::{ClientInfo, DiscoveryType, Request, RequestKind};

/// Outcome of classifying a raw envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// The shape the envelope matched.
    pub kind: RequestKind,
    /// Human-readable constraint failures.
    pub errors: Vec<String>,
    /// The typed request, present only when `errors` is empty.
    pub request: Option<Request>,
}

impl Classification {
    /// Returns `true` if no constraint failed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn failed(kind: RequestKind, errors: Vec<String>) -> Self {
        Self {
            kind,
            errors,
            request: None,
        }
    }

    fn finish(kind: RequestKind, errors: Vec<String>, build: impl FnOnce() -> Request) -> Self {
        if errors.is_empty() {
            Self {
                kind,
                errors,
                request: Some(build()),
            }
        } else {
            Self::failed(kind, errors)
        }
    }
}

/// Classifies and validates a raw envelope.
#[must_use]
pub fn classify(raw: &Value) -> Classification {
    let Some(obj) = raw.as_object() else {
        return Classification::failed(RequestKind::Unknown, vec!["must be object".to_string()]);
    };

    if obj.contains_key("version") && obj.contains_key("client") {
        classify_init(obj)
    } else if obj.contains_key("type") {
        classify_discovery(obj)
    } else if obj.contains_key("tool") {
        classify_tool_call(obj)
    } else if obj.contains_key("resource") {
        classify_resource_call(obj)
    } else {
        Classification::failed(
            RequestKind::Unknown,
            vec!["unrecognized request shape".to_string()],
        )
    }
}

fn classify_init(obj: &Map<String, Value>) -> Classification {
    let mut errors = Vec::new();

    let version = obj.get("version").and_then(Value::as_str);
    if version.is_none() {
        errors.push("version must be a string".to_string());
    }

    let mut client_name = None;
    let mut client_version = None;
    match obj.get("client").and_then(Value::as_object) {
        Some(client) => {
            client_name = client.get("name").and_then(Value::as_str);
            if client_name.is_none() {
                errors.push("client.name must be a string".to_string());
            }
            client_version = client.get("version").and_then(Value::as_str);
            if client_version.is_none() {
                errors.push("client.version must be a string".to_string());
            }
        }
        None => errors.push("client must be an object".to_string()),
    }

    Classification::finish(RequestKind::Init, errors, || Request::Init {
        version: version.unwrap_or_default().to_string(),
        client: ClientInfo {
            name: client_name.unwrap_or_default().to_string(),
            version: client_version.unwrap_or_default().to_string(),
        },
    })
}

fn classify_discovery(obj: &Map<String, Value>) -> Classification {
    let mut errors = Vec::new();
    let mut discovery = None;

    match obj.get("type").and_then(Value::as_str) {
        Some(s) => {
            discovery = DiscoveryType::parse(s);
            if discovery.is_none() {
                errors.push(format!(
                    "type must be one of tools, resources, all (got '{s}')"
                ));
            }
        }
        None => errors.push("type must be a string".to_string()),
    }

    Classification::finish(RequestKind::Discovery, errors, || {
        Request::Discovery(discovery.unwrap_or(DiscoveryType::All))
    })
}

fn classify_tool_call(obj: &Map<String, Value>) -> Classification {
    let mut errors = Vec::new();

    let tool = obj.get("tool").and_then(Value::as_str);
    if tool.is_none() {
        errors.push("tool must be a string".to_string());
    }

    let params = obj.get("params").filter(|p| p.is_object());
    if params.is_none() {
        errors.push("params must be an object".to_string());
    }

    Classification::finish(RequestKind::ToolCall, errors, || Request::ToolCall {
        tool: tool.unwrap_or_default().to_string(),
        params: params.cloned().unwrap_or_default(),
    })
}

fn classify_resource_call(obj: &Map<String, Value>) -> Classification {
    let mut errors = Vec::new();

    let resource = obj.get("resource").and_then(Value::as_str);
    if resource.is_none() {
        errors.push("resource must be a string".to_string());
    }

    let params = obj.get("params");
    if params.is_some_and(|p| !p.is_object()) {
        errors.push("params must be an object when present".to_string());
    }

    Classification::finish(RequestKind::ResourceCall, errors, || {
        Request::ResourceCall {
            resource: resource.unwrap_or_default().to_string(),
            params: params.cloned(),
        }
    })
}
