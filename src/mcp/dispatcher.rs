//! Protocol dispatcher.
//!
//! The dispatcher is the single entry point for a raw request:
//!
//! 1. **Rate limit** (only through [`ProtocolDispatcher::handle`])
//! 2. **Classification**: shape detection and field validation
//! 3. **Execution**: Init, Discovery, ToolCall or ResourceCall
//! 4. **Envelope**: success or error, never a raw handler failure
//!
//! Handlers run in their own task so that a panicking handler is reported
//! like any other handler error and leaves shared state intact.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::LogLevel;
use crate::context::ServerContext;
use crate::mcp::protocol::{DiscoveryType, ErrorCode, Request, ResponseEnvelope, ServerInfo};
use crate::mcp::registry::{
    HandlerResult, ResourceDescriptor, ResourceHandler, ResourceRegistry, ToolDescriptor,
    ToolHandler, ToolRegistry,
};
use crate::mcp::validator::classify;

/// Routes validated requests to registered handlers.
#[derive(Debug)]
pub struct ProtocolDispatcher {
    context: Arc<ServerContext>,
    tools: ToolRegistry,
    resources: ResourceRegistry,
}

impl ProtocolDispatcher {
    /// Creates a dispatcher with empty registries.
    #[must_use]
    pub fn new(context: Arc<ServerContext>) -> Self {
        Self {
            context,
            tools: ToolRegistry::new(),
            resources: ResourceRegistry::new(),
        }
    }

    /// Returns the shared server context.
    #[must_use]
    pub const fn context(&self) -> &Arc<ServerContext> {
        &self.context
    }

    /// Registers a tool, replacing any tool with the same name.
    pub fn register_tool(
        &self,
        descriptor: ToolDescriptor,
        handler: impl ToolHandler + 'static,
    ) -> Option<ToolDescriptor> {
        let name = descriptor.name.clone();
        let replaced = self.tools.register(descriptor, Arc::new(handler));
        if replaced.is_some() {
            tracing::debug!(tool = %name, "Replaced existing tool registration");
        }
        replaced
    }

    /// Registers a resource, replacing any resource with the same name.
    pub fn register_resource(
        &self,
        descriptor: ResourceDescriptor,
        handler: impl ResourceHandler + 'static,
    ) -> Option<ResourceDescriptor> {
        let name = descriptor.name.clone();
        let replaced = self.resources.register(descriptor, Arc::new(handler));
        if replaced.is_some() {
            tracing::debug!(resource = %name, "Replaced existing resource registration");
        }
        replaced
    }

    /// Snapshot of registered tools.
    #[must_use]
    pub fn tools(&self) -> Vec<ToolDescriptor> {
        self.tools.descriptors()
    }

    /// Snapshot of registered resources.
    #[must_use]
    pub fn resources(&self) -> Vec<ResourceDescriptor> {
        self.resources.descriptors()
    }

    /// Applies the client's rate limit, then processes the request.
    ///
    /// A rate limited request is rejected before classification, so no
    /// handler runs.
    pub async fn handle(&self, client_id: &str, raw: &Value) -> ResponseEnvelope {
        if self.context.check_rate_limit(client_id) {
            let policy = self.context.get_config().rate_limit;
            self.context.log(
                LogLevel::Warn,
                "Rate limit exceeded",
                Some(&json!({"clientId": client_id})),
            );
            return ResponseEnvelope::error(
                ErrorCode::RateLimitExceeded,
                format!("Rate limit exceeded, retry after {} ms", policy.window_ms),
                Some(json!({
                    "maxRequests": policy.max_requests,
                    "windowMs": policy.window_ms,
                })),
            );
        }

        self.process_request(raw).await
    }

    /// Classifies, validates and executes one request.
    pub async fn process_request(&self, raw: &Value) -> ResponseEnvelope {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!("request", id = %request_id);
        self.process_classified(raw).instrument(span).await
    }

    async fn process_classified(&self, raw: &Value) -> ResponseEnvelope {
        let classification = classify(raw);

        let Some(request) = classification.request else {
            self.context.log(
                LogLevel::Debug,
                "Rejected invalid request",
                Some(&json!({
                    "kind": classification.kind.as_str(),
                    "errors": classification.errors,
                })),
            );
            return ResponseEnvelope::error(
                ErrorCode::InvalidRequest,
                format!("Invalid request: {}", classification.errors.join("; ")),
                Some(json!(classification.errors)),
            );
        };

        self.context.log(
            LogLevel::Debug,
            "Dispatching request",
            Some(&json!({"kind": request.kind().as_str()})),
        );

        match request {
            Request::Init { version, client } => {
                self.context.log(
                    LogLevel::Info,
                    "Client initialised",
                    Some(&json!({
                        "clientName": client.name,
                        "clientVersion": client.version,
                        "requestedVersion": version,
                    })),
                );
                self.handle_init()
            }
            Request::Discovery(discovery) => self.handle_discovery(discovery),
            Request::ToolCall { tool, params } => self.handle_tool_call(&tool, params).await,
            Request::ResourceCall { resource, params } => {
                self.handle_resource_call(&resource, params).await
            }
        }
    }

    fn handle_init(&self) -> ResponseEnvelope {
        let config = self.context.get_config();
        ResponseEnvelope::init(ServerInfo {
            name: config.name,
            version: config.version,
            description: config.description,
            capabilities: config.capabilities,
        })
    }

    fn handle_discovery(&self, discovery: DiscoveryType) -> ResponseEnvelope {
        let tools = discovery.includes_tools().then(|| self.tools());
        let resources = discovery.includes_resources().then(|| self.resources());
        ResponseEnvelope::discovery(tools, resources)
    }

    async fn handle_tool_call(&self, tool: &str, params: Value) -> ResponseEnvelope {
        let Some(handler) = self.tools.handler(tool) else {
            return ResponseEnvelope::error(
                ErrorCode::ToolNotFound,
                format!("Tool not found: {tool}"),
                None,
            );
        };

        match invoke(async move { handler.call(params).await }).await {
            Ok(result) => ResponseEnvelope::tool_result(result),
            Err(message) => {
                self.context.log(
                    LogLevel::Error,
                    "Tool handler failed",
                    Some(&json!({"tool": tool, "error": message})),
                );
                ResponseEnvelope::error(
                    ErrorCode::InternalError,
                    format!("Tool '{tool}' failed"),
                    Some(Value::String(message)),
                )
            }
        }
    }

    // Resource misses share the tool not-found code; callers match on it.
    async fn handle_resource_call(
        &self,
        resource: &str,
        params: Option<Value>,
    ) -> ResponseEnvelope {
        let Some(handler) = self.resources.handler(resource) else {
            return ResponseEnvelope::error(
                ErrorCode::ToolNotFound,
                format!("Resource not found: {resource}"),
                None,
            );
        };

        match invoke(async move { handler.fetch(params).await }).await {
            Ok(data) => ResponseEnvelope::resource_data(data),
            Err(message) => {
                self.context.log(
                    LogLevel::Error,
                    "Resource handler failed",
                    Some(&json!({"resource": resource, "error": message})),
                );
                ResponseEnvelope::error(
                    ErrorCode::InternalError,
                    format!("Resource '{resource}' failed"),
                    Some(Value::String(message)),
                )
            }
        }
    }
}

/// Runs a handler future to completion in its own task.
///
/// Returns the handler's value, or the message of its error or panic.
async fn invoke<F>(future: F) -> Result<Value, String>
where
    F: Future<Output = HandlerResult> + Send + 'static,
{
    match tokio::spawn(future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.message().to_string()),
        Err(join_error) if join_error.is_panic() => Err(panic_message(&*join_error.into_panic())),
        Err(join_error) => Err(join_error.to_string()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}
