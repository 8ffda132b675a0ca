//! In-memory component documentation catalog.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::docs::ComponentStore;
use crate::error::CatalogError;

const BUILTIN_CATALOG: &str = include_str!("../../catalog/default.json");

/// Documentation for one component property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropDoc {
    /// Property name.
    pub name: String,
    /// Type signature as written in the component's source language.
    #[serde(rename = "type")]
    pub type_signature: String,
    /// What the property does.
    pub description: String,
    /// Default value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Documentation for one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentDoc {
    /// Component name, e.g. `Button`.
    pub name: String,
    /// Category, e.g. `inputs`.
    pub category: String,
    /// One-paragraph description.
    pub description: String,
    /// Import statement.
    pub import: String,
    /// Minimal usage snippet.
    pub usage: String,
    /// Documented properties.
    #[serde(default)]
    pub props: Vec<PropDoc>,
}

/// Installation steps for one framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallationGuide {
    /// Framework identifier, e.g. `next`.
    pub framework: String,
    /// Ordered setup steps.
    pub steps: Vec<String>,
    /// Extra notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A catalog loaded from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    components: Vec<ComponentDoc>,
    #[serde(default)]
    installation: Vec<InstallationGuide>,
}

impl Catalog {
    /// Parses a catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the catalog format.
    pub fn from_json(json: &str, origin: &Path) -> Result<Self, CatalogError> {
        serde_json::from_str(json).map_err(|e| CatalogError::Parse {
            path: origin.to_path_buf(),
            source: e,
        })
    }

    /// Loads a catalog file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents, path)
    }

    /// Returns the catalog bundled with the binary.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled JSON is malformed.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG, &PathBuf::from("<built-in>"))
    }

    /// Number of documented components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if the catalog documents no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

fn matches_query(doc: &ComponentDoc, needle: &str) -> bool {
    doc.name.to_lowercase().contains(needle)
        || doc.description.to_lowercase().contains(needle)
        || doc.category.to_lowercase().contains(needle)
}

impl ComponentStore for Catalog {
    fn get_component(&self, name: &str) -> Option<ComponentDoc> {
        self.components
            .iter()
            .find(|doc| doc.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    fn search_components(&self, query: &str) -> Vec<ComponentDoc> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.components
            .iter()
            .filter(|doc| matches_query(doc, &needle))
            .cloned()
            .collect()
    }

    fn get_components_by_category(&self, category: &str) -> Vec<ComponentDoc> {
        self.components
            .iter()
            .filter(|doc| doc.category.eq_ignore_ascii_case(category))
            .cloned()
            .collect()
    }

    fn get_installation_guide(&self, framework: &str) -> Option<InstallationGuide> {
        self.installation
            .iter()
            .find(|guide| guide.framework.eq_ignore_ascii_case(framework))
            .cloned()
    }

    fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for doc in &self.components {
            if !categories.contains(&doc.category) {
                categories.push(doc.category.clone());
            }
        }
        categories
    }

    fn frameworks(&self) -> Vec<String> {
        self.installation
            .iter()
            .map(|guide| guide.framework.clone())
            .collect()
    }

    fn components(&self) -> Vec<ComponentDoc> {
        self.components.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    #[test]
    fn builtin_catalog_parses() {
        let catalog = catalog();
        assert!(!catalog.is_empty());
        assert!(!catalog.frameworks().is_empty());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog = catalog();
        let doc = catalog.get_component("button").unwrap();
        assert_eq!(doc.name, "Button");
        assert!(catalog.get_component("Carousel").is_none());
    }

    #[test]
    fn search_matches_description_and_category() {
        let catalog = catalog();
        let by_description = catalog.search_components("modal");
        assert!(by_description.iter().any(|d| d.name == "Dialog"));

        let by_category = catalog.search_components("OVERLAYS");
        assert_eq!(by_category.len(), 2);

        assert!(catalog.search_components("   ").is_empty());
    }

    #[test]
    fn category_filter() {
        let catalog = catalog();
        let inputs = catalog.get_components_by_category("inputs");
        assert_eq!(inputs.len(), 3);
        assert!(inputs.iter().all(|d| d.category == "inputs"));
        assert!(catalog.get_components_by_category("charts").is_empty());
    }

    #[test]
    fn categories_keep_first_seen_order() {
        assert_eq!(
            catalog().categories(),
            vec!["inputs", "overlays", "layout", "data-display"]
        );
    }

    #[test]
    fn installation_guides() {
        let catalog = catalog();
        let guide = catalog.get_installation_guide("Vite").unwrap();
        assert_eq!(guide.framework, "vite");
        assert!(!guide.steps.is_empty());
        assert!(catalog.get_installation_guide("angular").is_none());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"components": [{"name": "Badge", "category": "data-display",
                "description": "Small status label", "import": "x", "usage": "<Badge />"}]}"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.frameworks().is_empty());
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{"widgets": []}"#).unwrap();

        let err = Catalog::load(&path).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }
}
