//! Reconciliation settings.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```yaml
//! exclusive_attributes:
//!   - [class, delegateExpression, expression]
//! root_element_scopes: ["bpmn:Error"]
//! error_id_prefix: Error
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::loader::parse_file;

/// Tunables of the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Groups of plain attributes of which at most one may be set. Setting one
    /// through a `property` binding clears the others in its group.
    pub exclusive_attributes: Vec<Vec<String>>,
    /// Scope types whose backing object lives in the document's root elements.
    pub root_element_scopes: Vec<String>,
    /// Prefix of synthesized error ids: `<prefix>_<errorRef>_<suffix>`.
    pub error_id_prefix: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            exclusive_attributes: vec![vec![
                "class".to_string(),
                "delegateExpression".to_string(),
                "expression".to_string(),
            ]],
            root_element_scopes: vec!["bpmn:Error".to_string()],
            error_id_prefix: "Error".to_string(),
        }
    }
}

impl ReconcileConfig {
    pub fn is_root_element_scope(&self, scope_type: &str) -> bool {
        self.root_element_scopes.iter().any(|s| s == scope_type)
    }

    /// Other members of the exclusive group `attribute` belongs to, if any.
    pub fn exclusive_siblings<'a>(&'a self, attribute: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.exclusive_attributes
            .iter()
            .filter(move |group| group.iter().any(|a| a == attribute))
            .flat_map(|group| group.iter())
            .map(String::as_str)
            .filter(move |a| *a != attribute)
    }
}

/// Load settings from a JSON or YAML file. Missing keys take their defaults.
pub fn load_at(path: &Path) -> Result<ReconcileConfig, LoadError> {
    parse_file(path)
}
