//! Sub-object fabricators.
//!
//! Each fabricator turns a binding and its resolved value into a
//! [`Blueprint`]: a detached object tree the engine materializes in the store
//! before attaching it with a list command. Fabricators are pure; nothing here
//! touches a store.

use sha2::{Digest, Sha256};

use templar_core::{
    BindingKind, ExecutionListenerBinding, FieldBinding, InBinding, InputParameterBinding,
    NamedPropertyBinding, OutBinding, OutputParameterBinding, Variables,
};

use crate::error::ReconcileError;
use crate::model::{props, tags, text_value, ObjectId, Props, Value};

/// A detached object tree: attributes plus nested single-valued children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blueprint {
    pub type_tag: &'static str,
    pub attributes: Props,
    pub children: Vec<(&'static str, Blueprint)>,
}

impl Blueprint {
    pub fn new(type_tag: &'static str, attributes: Props) -> Self {
        Self {
            type_tag,
            attributes,
            children: Vec::new(),
        }
    }

    fn with_child(mut self, name: &'static str, child: Blueprint) -> Self {
        self.children.push((name, child));
        self
    }

    /// A set attribute, for inspection.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).and_then(Option::as_ref)
    }

    pub fn child(&self, name: &str) -> Option<&Blueprint> {
        self.children.iter().find(|(n, _)| *n == name).map(|(_, c)| c)
    }
}

fn script(script_format: &str, value: Option<&str>) -> Blueprint {
    Blueprint::new(
        tags::SCRIPT,
        props([
            ("scriptFormat", Some(script_format.into())),
            ("value", text_value(value)),
        ]),
    )
}

// ----- 1. Containers -----

pub fn extension_elements() -> Blueprint {
    Blueprint::new(
        tags::EXTENSION_ELEMENTS,
        props([("values", Some(Value::list(Vec::new())))]),
    )
}

pub fn input_output() -> Blueprint {
    Blueprint::new(tags::INPUT_OUTPUT, Props::new())
}

pub fn properties() -> Blueprint {
    Blueprint::new(tags::PROPERTIES, Props::new())
}

pub fn formal_expression(body: Option<&str>, language: Option<&str>) -> Blueprint {
    Blueprint::new(
        tags::FORMAL_EXPRESSION,
        props([("body", text_value(body)), ("language", text_value(language))]),
    )
}

// ----- 2. List members -----

pub fn field(binding: &FieldBinding, value: Option<&str>) -> Blueprint {
    let slot = if binding.expression { "expression" } else { "string" };
    Blueprint::new(
        tags::FIELD,
        props([("name", Some(binding.name.as_str().into())), (slot, text_value(value))]),
    )
}

pub fn execution_listener(binding: &ExecutionListenerBinding, value: Option<&str>) -> Blueprint {
    let mut attributes = props([("event", Some(binding.event.as_str().into()))]);
    match &binding.script_format {
        Some(format) => {
            Blueprint::new(tags::EXECUTION_LISTENER, attributes).with_child("script", script(format, value))
        }
        None => {
            attributes.insert("value".to_string(), text_value(value));
            Blueprint::new(tags::EXECUTION_LISTENER, attributes)
        }
    }
}

pub fn input_parameter(binding: &InputParameterBinding, value: Option<&str>) -> Blueprint {
    let mut attributes = props([("name", Some(binding.name.as_str().into()))]);
    match &binding.script_format {
        Some(format) => {
            Blueprint::new(tags::INPUT_PARAMETER, attributes).with_child("definition", script(format, value))
        }
        None => {
            attributes.insert("value".to_string(), text_value(value));
            Blueprint::new(tags::INPUT_PARAMETER, attributes)
        }
    }
}

/// The resolved value names the parameter; `source` is what it carries.
pub fn output_parameter(binding: &OutputParameterBinding, value: Option<&str>) -> Blueprint {
    let mut attributes = props([("name", text_value(value))]);
    let source = binding.source.as_deref();
    match &binding.script_format {
        Some(format) => {
            Blueprint::new(tags::OUTPUT_PARAMETER, attributes).with_child("definition", script(format, source))
        }
        None => {
            attributes.insert("value".to_string(), text_value(source));
            Blueprint::new(tags::OUTPUT_PARAMETER, attributes)
        }
    }
}

pub fn named_property(binding: &NamedPropertyBinding, value: Option<&str>) -> Blueprint {
    Blueprint::new(
        tags::PROPERTY,
        props([
            ("name", Some(binding.name.as_str().into())),
            ("value", Some(value.unwrap_or_default().into())),
        ]),
    )
}

pub fn in_business_key(value: Option<&str>) -> Blueprint {
    Blueprint::new(tags::IN, props([("businessKey", text_value(value))]))
}

pub fn in_mapping(binding: &InBinding, value: Option<&str>) -> Result<Blueprint, ReconcileError> {
    Ok(Blueprint::new(tags::IN, in_attributes(binding, value)?))
}

pub fn out_mapping(binding: &OutBinding, value: Option<&str>) -> Result<Blueprint, ReconcileError> {
    Ok(Blueprint::new(tags::OUT, out_attributes(binding, value)?))
}

/// Attributes of an `activiti:In` for each supported `(target, expression,
/// variables)` combination. An empty target counts as absent.
pub fn in_attributes(binding: &InBinding, value: Option<&str>) -> Result<Props, ReconcileError> {
    let target = binding.target.as_deref().filter(|t| !t.is_empty());
    let value = text_value(value);
    let local = || Some(Value::Bool(true));
    let all = || Some(Value::from("all"));

    Ok(match (target, binding.expression, binding.variables) {
        (Some(target), false, None) => props([("target", Some(target.into())), ("source", value)]),
        (Some(target), true, None) => props([("target", Some(target.into())), ("sourceExpression", value)]),
        (None, false, Some(Variables::Local)) => props([("local", local()), ("variables", all())]),
        (Some(target), false, Some(Variables::Local)) => props([
            ("local", local()),
            ("source", value),
            ("target", Some(target.into())),
        ]),
        (Some(target), true, Some(Variables::Local)) => props([
            ("local", local()),
            ("sourceExpression", value),
            ("target", Some(target.into())),
        ]),
        (None, false, Some(Variables::All)) => props([("variables", all())]),
        (target, expression, variables) => {
            return Err(ReconcileError::configuration(
                BindingKind::In,
                format!(
                    "unsupported combination target={} expression={expression} variables={}",
                    target.unwrap_or("-"),
                    variables.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
                ),
            ))
        }
    })
}

/// Attributes of an `activiti:Out` for each supported `(source,
/// sourceExpression, variables)` combination. Empty strings count as absent.
pub fn out_attributes(binding: &OutBinding, value: Option<&str>) -> Result<Props, ReconcileError> {
    let source = binding.source.as_deref().filter(|s| !s.is_empty());
    let expression = binding.source_expression.as_deref().filter(|s| !s.is_empty());
    let value = text_value(value);
    let local = || Some(Value::Bool(true));
    let all = || Some(Value::from("all"));

    Ok(match (source, expression, binding.variables) {
        (Some(source), None, None) => props([("target", value), ("source", Some(source.into()))]),
        (None, Some(expression), None) => props([
            ("target", value),
            ("sourceExpression", Some(expression.into())),
        ]),
        (None, None, Some(Variables::All)) => props([("variables", all())]),
        (Some(source), None, Some(Variables::Local)) => props([
            ("local", local()),
            ("source", Some(source.into())),
            ("target", value),
        ]),
        (None, Some(expression), Some(Variables::Local)) => props([
            ("local", local()),
            ("sourceExpression", Some(expression.into())),
            ("target", value),
        ]),
        (None, None, Some(Variables::Local)) => props([("local", local()), ("variables", all())]),
        (source, expression, variables) => {
            return Err(ReconcileError::configuration(
                BindingKind::Out,
                format!(
                    "unsupported combination source={} sourceExpression={} variables={}",
                    source.unwrap_or("-"),
                    expression.unwrap_or("-"),
                    variables.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
                ),
            ))
        }
    })
}

// ----- 3. Errors -----

pub fn error_event_definition(value: Option<&str>, error: ObjectId) -> Blueprint {
    Blueprint::new(
        tags::ERROR_EVENT_DEFINITION,
        props([
            ("expression", text_value(value)),
            ("errorRef", Some(Value::reference(error))),
        ]),
    )
}

pub fn error(id: &str) -> Blueprint {
    Blueprint::new(tags::ERROR, props([("id", Some(id.into()))]))
}

/// Id of the `existing + 1`-th error synthesized for `error_ref`:
/// `<prefix>_<errorRef>_<7 hex digits>`. The suffix hashes the reference and
/// the count, so repeated runs over the same document produce the same ids.
pub fn error_id(prefix: &str, error_ref: &str, existing: usize) -> String {
    let digest = Sha256::digest(format!("{error_ref}:{existing}").as_bytes());
    let suffix = hex::encode(digest);
    format!("{}{}", crate::lookup::error_id_stem(prefix, error_ref), &suffix[..7])
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
