//! Scope declaration normalizer.
//!
//! Templates declare scopes as a list:
//!
//! ```json
//! "scopes": [ { "type": "activiti:Connector", "properties": [ ... ] } ]
//! ```
//!
//! Older templates use a map keyed by scope type:
//!
//! ```json
//! "scopes": { "activiti:Connector": { "properties": [ ... ] } }
//! ```
//!
//! Both shapes are normalized into `Vec<ScopeTemplate>` while the template is
//! deserialized, so the legacy shape never reaches the reconciliation engine.
//! Map order is preserved.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::types::{ScopeTemplate, TemplateProperty};

/// Raw scope declarations, as authored.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ScopeDeclarations {
    Current(Vec<ScopeTemplate>),
    Legacy(LegacyScopes),
}

/// Legacy map shape: `(scope type, body)` pairs in declaration order.
#[derive(Debug, Default)]
pub struct LegacyScopes(pub Vec<(String, LegacyScope)>);

/// Body of a legacy scope entry; the type comes from the map key.
#[derive(Debug, Deserialize)]
pub struct LegacyScope {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: Vec<TemplateProperty>,
}

/// Normalize any scope declaration shape into a list of scope templates.
pub fn normalize(declarations: ScopeDeclarations) -> Vec<ScopeTemplate> {
    match declarations {
        ScopeDeclarations::Current(scopes) => scopes,
        ScopeDeclarations::Legacy(LegacyScopes(entries)) => entries
            .into_iter()
            .map(|(scope_type, body)| ScopeTemplate {
                scope_type,
                id: body.id,
                properties: body.properties,
            })
            .collect(),
    }
}

/// `deserialize_with` adapter for [`crate::types::Template::scopes`].
pub(crate) fn deserialize_scopes<'de, D>(deserializer: D) -> Result<Vec<ScopeTemplate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ScopeDeclarations>::deserialize(deserializer)?
        .map(normalize)
        .unwrap_or_default())
}

impl<'de> Deserialize<'de> for LegacyScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LegacyScopesVisitor;

        impl<'de> Visitor<'de> for LegacyScopesVisitor {
            type Value = LegacyScopes;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of scope type to scope declaration")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((scope_type, body)) = map.next_entry::<String, LegacyScope>()? {
                    entries.push((scope_type, body));
                }
                Ok(LegacyScopes(entries))
            }
        }

        deserializer.deserialize_map(LegacyScopesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Binding, Template};

    #[test]
    fn current_shape_passes_through() {
        let template: Template = serde_json::from_str(
            r#"{
                "id": "t",
                "scopes": [
                    { "type": "activiti:Connector", "properties": [] },
                    { "type": "bpmn:Error", "id": "E1", "properties": [] }
                ]
            }"#,
        )
        .expect("deserialize");
        assert_eq!(template.scopes.len(), 2);
        assert_eq!(template.scopes[1].scope_type, "bpmn:Error");
        assert_eq!(template.scopes[1].id.as_deref(), Some("E1"));
    }

    #[test]
    fn legacy_map_is_flattened_in_declaration_order() {
        let template: Template = serde_json::from_str(
            r#"{
                "id": "t",
                "scopes": {
                    "activiti:Connector": {
                        "properties": [
                            { "value": "mail", "binding": { "type": "property", "name": "connectorId" } }
                        ]
                    },
                    "activiti:ExecutionListener": { "properties": [] }
                }
            }"#,
        )
        .expect("deserialize");
        let types: Vec<_> = template.scopes.iter().map(|s| s.scope_type.as_str()).collect();
        assert_eq!(types, ["activiti:Connector", "activiti:ExecutionListener"]);
        assert!(matches!(
            template.scopes[0].properties[0].binding,
            Binding::Property(_)
        ));
    }

    #[test]
    fn missing_and_null_scopes_are_empty() {
        let template: Template = serde_json::from_str(r#"{ "id": "t" }"#).expect("deserialize");
        assert!(template.scopes.is_empty());
        let template: Template =
            serde_json::from_str(r#"{ "id": "t", "scopes": null }"#).expect("deserialize");
        assert!(template.scopes.is_empty());
    }

    #[test]
    fn legacy_yaml_shape_is_normalized() {
        let yaml = "id: t\nscopes:\n  activiti:Connector:\n    properties: []\n";
        let template: Template = serde_yaml::from_str(yaml).expect("deserialize");
        assert_eq!(template.scopes[0].scope_type, "activiti:Connector");
    }
}
