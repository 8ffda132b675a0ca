//! Tool and resource registries.
//!
//! A registry maps a name to a descriptor and an async handler. Registering
//! a name that already exists replaces the previous entry in place; no
//! error is raised. Listing returns a snapshot in registration order.

use std::future::Future;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::HandlerError;

/// Result returned by every handler.
pub type HandlerResult = Result<Value, HandlerError>;

/// Handler invoked for a tool call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Runs the tool with its parameters object.
    async fn call(&self, params: Value) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, params: Value) -> HandlerResult {
        self(params).await
    }
}

/// Handler invoked for a resource fetch.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Fetches the resource, with optional parameters.
    async fn fetch(&self, params: Option<Value>) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> ResourceHandler for F
where
    F: Fn(Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn fetch(&self, params: Option<Value>) -> HandlerResult {
        self(params).await
    }
}

/// A descriptor that can be stored in a [`Registry`].
pub trait Named {
    /// The registry key.
    fn name(&self) -> &str;
}

/// Public description of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the parameters object.
    pub parameter_schema: Value,
}

impl ToolDescriptor {
    /// Creates a tool descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameter_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema,
        }
    }
}

impl Named for ToolDescriptor {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Public description of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    /// Unique resource name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Path under which the resource is conventionally addressed.
    pub path: String,
}

impl ResourceDescriptor {
    /// Creates a resource descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            path: path.into(),
        }
    }
}

impl Named for ResourceDescriptor {
    fn name(&self) -> &str {
        &self.name
    }
}

struct Entry<D, H: ?Sized> {
    descriptor: D,
    handler: Arc<H>,
}

/// Name-keyed map of descriptors to handlers.
pub struct Registry<D, H: ?Sized> {
    entries: RwLock<IndexMap<String, Entry<D, H>>>,
}

/// Registry of tools.
pub type ToolRegistry = Registry<ToolDescriptor, dyn ToolHandler>;

/// Registry of resources.
pub type ResourceRegistry = Registry<ResourceDescriptor, dyn ResourceHandler>;

impl<D: Named + Clone, H: ?Sized> Registry<D, H> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
        }
    }

    /// Registers `handler` under the descriptor's name.
    ///
    /// Returns the descriptor that was replaced, if any.
    pub fn register(&self, descriptor: D, handler: Arc<H>) -> Option<D> {
        let name = descriptor.name().to_string();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries
            .insert(
                name,
                Entry {
                    descriptor,
                    handler,
                },
            )
            .map(|old| old.descriptor)
    }

    /// Looks up the handler registered under `name`.
    #[must_use]
    pub fn handler(&self, name: &str) -> Option<Arc<H>> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .map(|entry| Arc::clone(&entry.handler))
    }

    /// Returns whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }

    /// Returns a snapshot of all descriptors in registration order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<D> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<D: Named + Clone, H: ?Sized> Default for Registry<D, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: std::fmt::Debug, H: ?Sized> std::fmt::Debug for Registry<D, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        f.debug_list()
            .entries(entries.values().map(|entry| &entry.descriptor))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn tool(name: &str, description: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, description, json!({"type": "object"}))
    }

    fn constant(value: Value) -> Arc<dyn ToolHandler> {
        Arc::new(move |_params: Value| {
            let value = value.clone();
            async move { Ok::<_, HandlerError>(value) }
        })
    }

    #[test]
    fn descriptors_in_registration_order() {
        let registry = ToolRegistry::new();
        registry.register(tool("b", ""), constant(json!(1)));
        registry.register(tool("a", ""), constant(json!(2)));
        registry.register(tool("c", ""), constant(json!(3)));

        let names: Vec<_> = registry.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn listing_is_idempotent() {
        let registry = ToolRegistry::new();
        registry.register(tool("x", "first"), constant(json!(null)));
        registry.register(tool("y", "second"), constant(json!(null)));
        assert_eq!(registry.descriptors(), registry.descriptors());
    }

    #[tokio::test]
    async fn re_registration_overwrites() {
        let registry = ToolRegistry::new();
        assert!(registry
            .register(tool("x", "old"), constant(json!("old")))
            .is_none());
        let replaced = registry.register(tool("x", "new"), constant(json!("new")));

        assert_eq!(replaced.map(|d| d.description), Some("old".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.descriptors()[0].description, "new");

        let handler = registry.handler("x").unwrap();
        assert_eq!(handler.call(json!({})).await.unwrap(), json!("new"));
    }

    #[test]
    fn missing_name_has_no_handler() {
        let registry = ToolRegistry::new();
        assert!(registry.handler("nope").is_none());
        assert!(!registry.contains("nope"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn resource_closure_receives_optional_params() {
        let registry = ResourceRegistry::new();
        let handler: Arc<dyn ResourceHandler> =
            Arc::new(|params: Option<Value>| async move {
                Ok::<_, HandlerError>(json!({"got": params}))
            });
        registry.register(
            ResourceDescriptor::new("r", "test resource", "/resources/r"),
            handler,
        );

        let handler = registry.handler("r").unwrap();
        assert_eq!(handler.fetch(None).await.unwrap(), json!({"got": null}));
        assert_eq!(
            handler.fetch(Some(json!({"k": 1}))).await.unwrap(),
            json!({"got": {"k": 1}})
        );
    }

    #[test]
    fn tool_descriptor_serialises_camel_case() {
        let json = serde_json::to_value(tool("echo", "Echo")).unwrap();
        assert!(json.get("parameterSchema").is_some());
    }
}
