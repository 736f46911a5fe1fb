//! Hand-edit detection.
//!
//! A live sub-object is *stale* when its current value no longer equals the
//! value the old template put there, which means someone edited it by hand.
//! Stale objects keep their value; only always-override fields are updated.
//!
//! | Kind                 | Compared attribute                               |
//! |----------------------|--------------------------------------------------|
//! | property             | the named attribute on the owner                 |
//! | field                | `string`, or `expression` for expression fields  |
//! | executionListener    | `script.value` if scripted, else `value`         |
//! | in                   | `sourceExpression` or `source`                   |
//! | inBusinessKey        | `businessKey`                                    |
//! | out                  | `target`                                         |
//! | inputParameter       | `definition.value` if scripted, else `value`     |
//! | outputParameter      | `name`                                           |
//! | namedProperty        | `value` (absent reads as empty)                  |
//! | errorEventDefinition | `expression`                                     |
//!
//! Stored scalars compare as text, so a `true` written by another tool equals
//! a template value of `"true"`.

use templar_core::{Binding, TemplateProperty};

use crate::model::{attribute_name, ObjectId, Value};
use crate::store::ObjectStore;

fn stored_text(store: &dyn ObjectStore, object: ObjectId, attribute: &str) -> Option<String> {
    store.get(object, attribute).and_then(Value::text)
}

fn differs(store: &dyn ObjectStore, object: ObjectId, attribute: &str, expected: Option<&str>) -> bool {
    stored_text(store, object, attribute).as_deref() != expected
}

/// Compare a nested script's `value`. A missing script counts as edited.
fn nested_differs(store: &dyn ObjectStore, object: ObjectId, nested: &str, expected: Option<&str>) -> bool {
    match store.get_ref(object, nested) {
        Some(script) => differs(store, script, "value", expected),
        None => true,
    }
}

/// Whether `live`, created for `old`, was edited since.
pub fn is_stale(store: &dyn ObjectStore, live: ObjectId, old: &TemplateProperty) -> bool {
    let expected = old.value();
    match &old.binding {
        Binding::Property(b) => differs(store, live, attribute_name(&b.name), expected),
        Binding::Field(b) => {
            let slot = if b.expression { "expression" } else { "string" };
            differs(store, live, slot, expected)
        }
        Binding::ExecutionListener(b) if b.script_format.is_some() => {
            nested_differs(store, live, "script", expected)
        }
        Binding::ExecutionListener(_) => differs(store, live, "value", expected),
        Binding::In(b) => {
            let slot = if b.expression { "sourceExpression" } else { "source" };
            differs(store, live, slot, expected)
        }
        Binding::InBusinessKey(_) => differs(store, live, "businessKey", expected),
        Binding::Out(_) => differs(store, live, "target", expected),
        Binding::InputParameter(b) if b.script_format.is_some() => {
            nested_differs(store, live, "definition", expected)
        }
        Binding::InputParameter(_) => differs(store, live, "value", expected),
        Binding::OutputParameter(_) => differs(store, live, "name", expected),
        // Named properties are created with an empty value when none is given.
        Binding::NamedProperty(_) => differs(store, live, "value", Some(expected.unwrap_or_default())),
        Binding::ErrorEventDefinition(_) => differs(store, live, "expression", expected),
    }
}

/// Independent drift of a condition expression's two parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConditionDrift {
    pub body: bool,
    pub language: bool,
}

/// Compare a live `bpmn:FormalExpression` with the `conditionExpression`
/// property binding that created it.
pub fn condition_drift(store: &dyn ObjectStore, expression: ObjectId, old: &TemplateProperty) -> ConditionDrift {
    let language = match &old.binding {
        Binding::Property(b) => b.script_format.as_deref(),
        _ => None,
    };
    ConditionDrift {
        body: differs(store, expression, "body", old.value()),
        language: differs(store, expression, "language", language),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{props, tags, Props};
    use crate::store::MemoryStore;
    use templar_core::{
        ExecutionListenerBinding, FieldBinding, InputParameterBinding, PropertyBinding,
    };

    fn property(name: &str, value: &str) -> TemplateProperty {
        TemplateProperty::new(
            value,
            Binding::Property(PropertyBinding {
                name: name.to_string(),
                script_format: None,
            }),
        )
    }

    #[test]
    fn untouched_property_is_fresh() {
        let mut store = MemoryStore::new();
        let task = store.create("bpmn:ServiceTask", props([("asyncBefore", Some(true.into()))]));
        assert!(!is_stale(&store, task, &property("activiti:asyncBefore", "true")));
        assert!(is_stale(&store, task, &property("asyncBefore", "false")));
    }

    #[test]
    fn unset_attribute_equals_absent_value() {
        let mut store = MemoryStore::new();
        let task = store.create("bpmn:ServiceTask", Props::new());
        let old = TemplateProperty {
            value: None,
            binding: Binding::Property(PropertyBinding {
                name: "class".into(),
                script_format: None,
            }),
        };
        assert!(!is_stale(&store, task, &old));
    }

    #[test]
    fn field_compares_the_slot_it_was_written_to() {
        let mut store = MemoryStore::new();
        let field = store.create(
            tags::FIELD,
            props([("name", Some("x".into())), ("expression", Some("${a}".into()))]),
        );
        let expression = TemplateProperty::new(
            "${a}",
            Binding::Field(FieldBinding {
                name: "x".into(),
                expression: true,
            }),
        );
        assert!(!is_stale(&store, field, &expression));
        let literal = TemplateProperty::new(
            "${a}",
            Binding::Field(FieldBinding {
                name: "x".into(),
                expression: false,
            }),
        );
        assert!(is_stale(&store, field, &literal));
    }

    #[test]
    fn scripted_values_live_in_nested_script() {
        let mut store = MemoryStore::new();
        let script = store.create(tags::SCRIPT, props([("value", Some("run()".into()))]));
        let listener = store.create(
            tags::EXECUTION_LISTENER,
            props([("event", Some("start".into())), ("script", Some(Value::reference(script)))]),
        );
        let old = TemplateProperty::new(
            "run()",
            Binding::ExecutionListener(ExecutionListenerBinding {
                event: "start".into(),
                script_format: Some("groovy".into()),
            }),
        );
        assert!(!is_stale(&store, listener, &old));
    }

    #[test]
    fn scripted_parameter_without_definition_is_stale() {
        let mut store = MemoryStore::new();
        let parameter = store.create(
            tags::INPUT_PARAMETER,
            props([("name", Some("p".into())), ("value", Some("run()".into()))]),
        );
        let old = TemplateProperty::new(
            "run()",
            Binding::InputParameter(InputParameterBinding {
                name: "p".into(),
                script_format: Some("groovy".into()),
            }),
        );
        assert!(is_stale(&store, parameter, &old));
    }

    #[test]
    fn condition_body_and_language_drift_independently() {
        let mut store = MemoryStore::new();
        let expression = store.create(
            tags::FORMAL_EXPRESSION,
            props([("body", Some("${ok}".into())), ("language", Some("juel".into()))]),
        );
        let old = TemplateProperty::new(
            "${ok}",
            Binding::Property(PropertyBinding {
                name: "conditionExpression".into(),
                script_format: Some("groovy".into()),
            }),
        );
        let drift = condition_drift(&store, expression, &old);
        assert_eq!(
            drift,
            ConditionDrift {
                body: false,
                language: true
            }
        );
    }
}
