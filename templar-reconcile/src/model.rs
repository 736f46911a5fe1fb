//! Document object model.
//!
//! A process document is a graph of typed objects. Each object has a type tag
//! (`bpmn:ServiceTask`, `activiti:Field`, ...), a parent, and named attributes.
//! Attribute values are scalars, a reference to another object, or an ordered
//! list of objects:
//!
//! | JSON                  | [`Value`]          |
//! |-----------------------|--------------------|
//! | `"text"`              | `Str`              |
//! | `true`                | `Bool`             |
//! | `42`                  | `Int`              |
//! | `{ "ref": 7 }`        | `Ref`              |
//! | `{ "items": [3, 4] }` | `List`             |

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of an object inside a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Bool(bool),
    Int(i64),
    Ref {
        #[serde(rename = "ref")]
        target: ObjectId,
    },
    List {
        items: Vec<ObjectId>,
    },
}

impl Value {
    pub fn reference(target: ObjectId) -> Self {
        Value::Ref { target }
    }

    pub fn list(items: Vec<ObjectId>) -> Self {
        Value::List { items }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Ref { target } => Some(*target),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ObjectId]> {
        match self {
            Value::List { items } => Some(items),
            _ => None,
        }
    }

    /// Scalar value rendered as text; `None` for references and lists.
    pub fn text(&self) -> Option<String> {
        match self {
            Value::Str(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Ref { .. } | Value::List { .. } => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::reference(id)
    }
}

/// Attribute assignments. `None` unsets the attribute.
pub type Props = BTreeMap<String, Option<Value>>;

/// Build a [`Props`] map from `(name, value)` pairs.
pub fn props<const N: usize>(entries: [(&str, Option<Value>); N]) -> Props {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Wrap an optional template value as an attribute value.
pub fn text_value(value: Option<&str>) -> Option<Value> {
    value.map(Value::from)
}

/// Attribute name for a `property` binding name. Bindings may be written
/// with a namespace prefix (`activiti:asyncBefore`); attributes are stored
/// without it.
pub fn attribute_name(binding_name: &str) -> &str {
    binding_name
        .strip_prefix("activiti:")
        .or_else(|| binding_name.strip_prefix("bpmn:"))
        .unwrap_or(binding_name)
}

/// Object type tags the engine creates or inspects.
pub mod tags {
    pub const DEFINITIONS: &str = "bpmn:Definitions";
    pub const EXTENSION_ELEMENTS: &str = "bpmn:ExtensionElements";
    pub const FORMAL_EXPRESSION: &str = "bpmn:FormalExpression";
    pub const SIGNAL_EVENT_DEFINITION: &str = "bpmn:SignalEventDefinition";
    pub const ERROR: &str = "bpmn:Error";

    pub const INPUT_OUTPUT: &str = "activiti:InputOutput";
    pub const INPUT_PARAMETER: &str = "activiti:InputParameter";
    pub const OUTPUT_PARAMETER: &str = "activiti:OutputParameter";
    pub const PROPERTIES: &str = "activiti:Properties";
    pub const PROPERTY: &str = "activiti:Property";
    pub const CONNECTOR: &str = "activiti:Connector";
    pub const EXECUTION_LISTENER: &str = "activiti:ExecutionListener";
    pub const TASK_LISTENER: &str = "activiti:TaskListener";
    pub const FIELD: &str = "activiti:Field";
    pub const IN: &str = "activiti:In";
    pub const OUT: &str = "activiti:Out";
    pub const SCRIPT: &str = "activiti:Script";
    pub const ERROR_EVENT_DEFINITION: &str = "activiti:ErrorEventDefinition";
}
