//! Binding model for element templates.
//!
//! A [`Template`] is a versioned list of [`TemplateProperty`] entries, each one a
//! [`Binding`] plus the value it resolves to. Bindings are a closed sum type
//! tagged by the `type` field templates are authored with; every kind carries
//! its own identity and behavior fields.
//!
//! All types are serializable/deserializable via serde (JSON or YAML).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed template identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(pub String);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TemplateId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TemplateId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The `variables` mode of an in/out mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variables {
    Local,
    All,
}

impl fmt::Display for Variables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variables::Local => write!(f, "local"),
            Variables::All => write!(f, "all"),
        }
    }
}

/// Discriminant of a [`Binding`], used to filter a template by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingKind {
    Property,
    Field,
    ExecutionListener,
    In,
    InBusinessKey,
    Out,
    InputParameter,
    OutputParameter,
    NamedProperty,
    ErrorEventDefinition,
}

impl BindingKind {
    /// The `type` tag this kind is authored with.
    pub fn type_tag(self) -> &'static str {
        match self {
            BindingKind::Property => "property",
            BindingKind::Field => "activiti:field",
            BindingKind::ExecutionListener => "activiti:executionListener",
            BindingKind::In => "activiti:in",
            BindingKind::InBusinessKey => "activiti:in:businessKey",
            BindingKind::Out => "activiti:out",
            BindingKind::InputParameter => "activiti:inputParameter",
            BindingKind::OutputParameter => "activiti:outputParameter",
            BindingKind::NamedProperty => "activiti:property",
            BindingKind::ErrorEventDefinition => "activiti:errorEventDefinition",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

impl Serialize for BindingKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.type_tag())
    }
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// Plain attribute on the business object (`property`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyBinding {
    pub name: String,
    /// Only meaningful for `conditionExpression`, where it becomes the
    /// expression language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_format: Option<String>,
}

/// Field injection (`activiti:field`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBinding {
    pub name: String,
    /// Store the value as `expression` instead of `string`.
    #[serde(default)]
    pub expression: bool,
}

/// Execution listener (`activiti:executionListener`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionListenerBinding {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_format: Option<String>,
}

/// Input mapping of a call activity or signal event (`activiti:in`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub expression: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Variables>,
    #[serde(default)]
    pub local: bool,
}

/// Business key input mapping (`activiti:in:businessKey`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InBusinessKeyBinding {}

/// Output mapping of a call activity (`activiti:out`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Variables>,
    #[serde(default)]
    pub local: bool,
}

/// Input parameter inside `activiti:InputOutput`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputParameterBinding {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_format: Option<String>,
}

/// Output parameter inside `activiti:InputOutput`. The resolved value becomes
/// the parameter name; `source` becomes its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputParameterBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_format: Option<String>,
}

/// Named entry inside `activiti:Properties` (`activiti:property`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedPropertyBinding {
    pub name: String,
}

/// Error event definition (`activiti:errorEventDefinition`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEventDefinitionBinding {
    pub error_ref: String,
}

/// One typed configuration slot of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Binding {
    #[serde(rename = "property")]
    Property(PropertyBinding),
    #[serde(rename = "activiti:field")]
    Field(FieldBinding),
    #[serde(rename = "activiti:executionListener")]
    ExecutionListener(ExecutionListenerBinding),
    #[serde(rename = "activiti:in")]
    In(InBinding),
    #[serde(rename = "activiti:in:businessKey")]
    InBusinessKey(InBusinessKeyBinding),
    #[serde(rename = "activiti:out")]
    Out(OutBinding),
    #[serde(rename = "activiti:inputParameter")]
    InputParameter(InputParameterBinding),
    #[serde(rename = "activiti:outputParameter")]
    OutputParameter(OutputParameterBinding),
    #[serde(rename = "activiti:property")]
    NamedProperty(NamedPropertyBinding),
    #[serde(rename = "activiti:errorEventDefinition")]
    ErrorEventDefinition(ErrorEventDefinitionBinding),
}

impl Binding {
    pub fn kind(&self) -> BindingKind {
        match self {
            Binding::Property(_) => BindingKind::Property,
            Binding::Field(_) => BindingKind::Field,
            Binding::ExecutionListener(_) => BindingKind::ExecutionListener,
            Binding::In(_) => BindingKind::In,
            Binding::InBusinessKey(_) => BindingKind::InBusinessKey,
            Binding::Out(_) => BindingKind::Out,
            Binding::InputParameter(_) => BindingKind::InputParameter,
            Binding::OutputParameter(_) => BindingKind::OutputParameter,
            Binding::NamedProperty(_) => BindingKind::NamedProperty,
            Binding::ErrorEventDefinition(_) => BindingKind::ErrorEventDefinition,
        }
    }

    /// Short human-readable key naming the slot, for logs and reports.
    pub fn label(&self) -> String {
        match self {
            Binding::Property(b) => b.name.clone(),
            Binding::Field(b) => b.name.clone(),
            Binding::ExecutionListener(b) => b.event.clone(),
            Binding::In(b) => match (&b.target, b.variables) {
                (Some(target), _) => target.clone(),
                (None, Some(variables)) => format!("variables={variables}"),
                (None, None) => "-".to_string(),
            },
            Binding::InBusinessKey(_) => "businessKey".to_string(),
            Binding::Out(b) => match (&b.source, &b.source_expression, b.variables) {
                (Some(source), _, _) => source.clone(),
                (None, Some(expression), _) => expression.clone(),
                (None, None, Some(variables)) => format!("variables={variables}"),
                (None, None, None) => "-".to_string(),
            },
            Binding::InputParameter(b) => b.name.clone(),
            Binding::OutputParameter(b) => b.source.clone().unwrap_or_else(|| "-".to_string()),
            Binding::NamedProperty(b) => b.name.clone(),
            Binding::ErrorEventDefinition(b) => b.error_ref.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A binding together with the value it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateProperty {
    #[serde(
        default,
        deserialize_with = "deserialize_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
    pub binding: Binding,
}

impl TemplateProperty {
    pub fn new(value: impl Into<String>, binding: Binding) -> Self {
        Self { value: Some(value.into()), binding }
    }

    pub fn kind(&self) -> BindingKind {
        self.binding.kind()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// A nested sub-object context with its own bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeTemplate {
    /// Node type tag of the backing object, e.g. `activiti:Connector`.
    #[serde(rename = "type")]
    pub scope_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: Vec<TemplateProperty>,
}

/// A versioned element template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Vec<TemplateProperty>,
    #[serde(default, deserialize_with = "crate::scopes::deserialize_scopes")]
    pub scopes: Vec<ScopeTemplate>,
}

impl Template {
    pub fn new(id: impl Into<TemplateId>) -> Self {
        Self {
            id: id.into(),
            version: None,
            name: None,
            properties: vec![],
            scopes: vec![],
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_property(mut self, property: TemplateProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_scope(mut self, scope: ScopeTemplate) -> Self {
        self.scopes.push(scope);
        self
    }
}

/// Template property values are strings, but authored templates also carry
/// booleans and numbers (`"value": true`).
fn deserialize_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Flag(bool),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(s) => s,
        Scalar::Flag(b) => b.to_string(),
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(TemplateId::from("com.example.mail").to_string(), "com.example.mail");
    }

    #[test]
    fn binding_kind_display_matches_type_tag() {
        assert_eq!(BindingKind::InBusinessKey.to_string(), "activiti:in:businessKey");
        assert_eq!(BindingKind::Property.to_string(), "property");
    }

    #[test]
    fn binding_deserializes_from_type_tag() {
        let binding: Binding = serde_json::from_str(
            r#"{ "type": "activiti:out", "sourceExpression": "${a}", "variables": "local" }"#,
        )
        .expect("deserialize");
        assert_eq!(
            binding,
            Binding::Out(OutBinding {
                source: None,
                source_expression: Some("${a}".to_string()),
                variables: Some(Variables::Local),
                local: false,
            })
        );
        assert_eq!(binding.kind(), BindingKind::Out);
    }

    #[test]
    fn business_key_binding_has_no_fields() {
        let binding: Binding =
            serde_json::from_str(r#"{ "type": "activiti:in:businessKey" }"#).expect("deserialize");
        assert_eq!(binding.kind(), BindingKind::InBusinessKey);
        assert_eq!(binding.label(), "businessKey");
    }

    #[test]
    fn unknown_binding_type_is_rejected() {
        let result: Result<Binding, _> =
            serde_json::from_str(r#"{ "type": "activiti:somethingElse", "name": "x" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn boolean_and_numeric_values_become_strings() {
        let property: TemplateProperty = serde_json::from_str(
            r#"{ "value": true, "binding": { "type": "property", "name": "asyncBefore" } }"#,
        )
        .expect("deserialize");
        assert_eq!(property.value(), Some("true"));

        let property: TemplateProperty = serde_json::from_str(
            r#"{ "value": 3, "binding": { "type": "property", "name": "retries" } }"#,
        )
        .expect("deserialize");
        assert_eq!(property.value(), Some("3"));
    }

    #[test]
    fn missing_value_is_none() {
        let property: TemplateProperty = serde_json::from_str(
            r#"{ "binding": { "type": "activiti:field", "name": "x", "expression": true } }"#,
        )
        .expect("deserialize");
        assert!(property.value.is_none());
        assert_eq!(
            property.binding,
            Binding::Field(FieldBinding { name: "x".to_string(), expression: true })
        );
    }
}
