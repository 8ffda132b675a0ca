//! Documentation lookup tools and resources.
//!
//! The dispatcher never talks to the documentation store directly. This
//! module registers handler closures that capture a [`ComponentStore`], so
//! any backend implementing the trait can be substituted.
//!
//! # Tools
//!
//! | Tool | Parameters |
//! |---|---|
//! | `get_component` | `name` |
//! | `search_components` | `query` |
//! | `get_components_by_category` | `category` |
//! | `get_installation_guide` | `framework` |
//!
//! # Resources
//!
//! | Resource | Optional parameters |
//! |---|---|
//! | `components` | `category` |
//! | `categories` | |
//! | `installation` | `framework` |

mod catalog;

pub use catalog::{Catalog, ComponentDoc, InstallationGuide, PropDoc};

use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::HandlerError;
use crate::mcp::dispatcher::ProtocolDispatcher;
use crate::mcp::registry::{HandlerResult, ResourceDescriptor, ToolDescriptor};

/// Read-only access to component documentation.
pub trait ComponentStore: Send + Sync {
    /// Looks up a component by name.
    fn get_component(&self, name: &str) -> Option<ComponentDoc>;

    /// Returns components matching a free-text query.
    fn search_components(&self, query: &str) -> Vec<ComponentDoc>;

    /// Returns all components in a category.
    fn get_components_by_category(&self, category: &str) -> Vec<ComponentDoc>;

    /// Returns the installation guide for a framework.
    fn get_installation_guide(&self, framework: &str) -> Option<InstallationGuide>;

    /// Returns all known categories.
    fn categories(&self) -> Vec<String>;

    /// Returns all frameworks with an installation guide.
    fn frameworks(&self) -> Vec<String>;

    /// Returns every component.
    fn components(&self) -> Vec<ComponentDoc>;
}

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, HandlerError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerError::new(format!("Missing required parameter: {key}")))
}

fn optional_str<'a>(params: Option<&'a Value>, key: &str) -> Option<&'a str> {
    params
        .and_then(|p| p.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn string_param_schema(key: &str, description: &str) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert(
        key.to_string(),
        json!({"type": "string", "description": description}),
    );
    json!({
        "type": "object",
        "properties": properties,
        "required": [key],
    })
}

fn summary(doc: &ComponentDoc) -> Value {
    json!({
        "name": doc.name,
        "category": doc.category,
        "description": doc.description,
    })
}

fn get_component(store: &dyn ComponentStore, params: &Value) -> HandlerResult {
    let name = required_str(params, "name")?;
    let doc = store
        .get_component(name)
        .ok_or_else(|| HandlerError::new(format!("Component not found: {name}")))?;
    Ok(serde_json::to_value(doc)?)
}

fn search_components(store: &dyn ComponentStore, params: &Value) -> HandlerResult {
    let query = required_str(params, "query")?;
    let results: Vec<Value> = store.search_components(query).iter().map(summary).collect();
    Ok(json!({
        "query": query,
        "total": results.len(),
        "results": results,
    }))
}

fn get_components_by_category(store: &dyn ComponentStore, params: &Value) -> HandlerResult {
    let category = required_str(params, "category")?;
    let components: Vec<Value> = store
        .get_components_by_category(category)
        .iter()
        .map(summary)
        .collect();
    Ok(json!({
        "category": category,
        "components": components,
    }))
}

fn get_installation_guide(store: &dyn ComponentStore, params: &Value) -> HandlerResult {
    let framework = required_str(params, "framework")?;
    let guide = store.get_installation_guide(framework).ok_or_else(|| {
        HandlerError::new(format!(
            "No installation guide for '{framework}'. Supported: {}",
            store.frameworks().join(", ")
        ))
    })?;
    Ok(serde_json::to_value(guide)?)
}

fn components_resource(store: &dyn ComponentStore, params: Option<&Value>) -> HandlerResult {
    let docs = match optional_str(params, "category") {
        Some(category) => store.get_components_by_category(category),
        None => store.components(),
    };
    Ok(Value::Array(docs.iter().map(summary).collect()))
}

fn installation_resource(store: &dyn ComponentStore, params: Option<&Value>) -> HandlerResult {
    match optional_str(params, "framework") {
        Some(framework) => get_installation_guide(store, &json!({"framework": framework})),
        None => Ok(json!({"frameworks": store.frameworks()})),
    }
}

/// Registers a tool whose handler is a synchronous lookup against `store`.
fn register_lookup_tool(
    dispatcher: &ProtocolDispatcher,
    store: &Arc<dyn ComponentStore>,
    descriptor: ToolDescriptor,
    lookup: fn(&dyn ComponentStore, &Value) -> HandlerResult,
) {
    let store = Arc::clone(store);
    dispatcher.register_tool(descriptor, move |params: Value| {
        let result = lookup(store.as_ref(), &params);
        async move { result }
    });
}

/// Registers a resource whose handler is a synchronous lookup against
/// `store`.
fn register_lookup_resource(
    dispatcher: &ProtocolDispatcher,
    store: &Arc<dyn ComponentStore>,
    descriptor: ResourceDescriptor,
    lookup: fn(&dyn ComponentStore, Option<&Value>) -> HandlerResult,
) {
    let store = Arc::clone(store);
    dispatcher.register_resource(descriptor, move |params: Option<Value>| {
        let result = lookup(store.as_ref(), params.as_ref());
        async move { result }
    });
}

/// Registers every documentation tool and resource on `dispatcher`.
pub fn register_documentation(dispatcher: &ProtocolDispatcher, store: Arc<dyn ComponentStore>) {
    register_lookup_tool(
        dispatcher,
        &store,
        ToolDescriptor::new(
            "get_component",
            "Get full documentation for a component: description, import statement, \
             usage snippet and props.",
            string_param_schema("name", "Component name, e.g. Button (case-insensitive)"),
        ),
        get_component,
    );
    register_lookup_tool(
        dispatcher,
        &store,
        ToolDescriptor::new(
            "search_components",
            "Search components by name, description or category.",
            string_param_schema("query", "Free-text search query"),
        ),
        search_components,
    );
    register_lookup_tool(
        dispatcher,
        &store,
        ToolDescriptor::new(
            "get_components_by_category",
            "List the components in a category.",
            string_param_schema("category", "Category name, e.g. inputs"),
        ),
        get_components_by_category,
    );
    register_lookup_tool(
        dispatcher,
        &store,
        ToolDescriptor::new(
            "get_installation_guide",
            "Get setup steps for a framework.",
            string_param_schema("framework", "Framework identifier, e.g. next or vite"),
        ),
        get_installation_guide,
    );

    register_lookup_resource(
        dispatcher,
        &store,
        ResourceDescriptor::new(
            "components",
            "Summary of every documented component, optionally filtered by category.",
            "/resources/components",
        ),
        components_resource,
    );
    register_lookup_resource(
        dispatcher,
        &store,
        ResourceDescriptor::new(
            "categories",
            "All component categories.",
            "/resources/categories",
        ),
        |store, _params| Ok(json!(store.categories())),
    );
    register_lookup_resource(
        dispatcher,
        &store,
        ResourceDescriptor::new(
            "installation",
            "Installation guide for a framework, or the list of supported frameworks.",
            "/resources/installation",
        ),
        installation_resource,
    );

    tracing::debug!(
        tools = dispatcher.tools().len(),
        resources = dispatcher.resources().len(),
        "Documentation handlers registered"
    );
}
