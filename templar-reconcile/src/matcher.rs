//! Identity matching.
//!
//! Two questions are answered here, per binding kind:
//!
//! 1. Which binding of the old template occupies the same slot as a binding
//!    of the new template? ([`find_old_property`])
//! 2. Which live sub-object did an old binding create? ([`find_live`])
//!
//! Live matching only looks at the candidates still unclaimed in the current
//! pass, so one live object is never matched twice.

use templar_core::{Binding, BindingKind, OutBinding, ReconcileConfig, ScopeTemplate, Template, TemplateProperty};

use crate::lookup::ElementLookup;
use crate::model::{tags, ObjectId};
use crate::store::ObjectStore;

/// Whether `old` and `new` identify the same configuration slot.
pub fn same_slot(old: &Binding, new: &Binding) -> bool {
    match (old, new) {
        (Binding::Property(o), Binding::Property(n)) => o.name == n.name,
        (Binding::Field(o), Binding::Field(n)) => o.name == n.name,
        (Binding::ExecutionListener(o), Binding::ExecutionListener(n)) => {
            o.event == n.event && o.script_format == n.script_format
        }
        (Binding::In(o), Binding::In(n)) => o.target == n.target && o.expression == n.expression,
        (Binding::InBusinessKey(_), Binding::InBusinessKey(_)) => true,
        (Binding::Out(o), Binding::Out(n)) => same_out_slot(o, n),
        (Binding::InputParameter(o), Binding::InputParameter(n)) => {
            o.name == n.name && o.script_format == n.script_format
        }
        (Binding::OutputParameter(o), Binding::OutputParameter(n)) => {
            o.source == n.source && o.script_format == n.script_format
        }
        (Binding::NamedProperty(o), Binding::NamedProperty(n)) => o.name == n.name,
        (Binding::ErrorEventDefinition(o), Binding::ErrorEventDefinition(n)) => o.error_ref == n.error_ref,
        _ => false,
    }
}

/// Outs share a slot through a source or source expression both set to the
/// same value. Outs with neither are keyed by their `variables` mode.
fn same_out_slot(o: &OutBinding, n: &OutBinding) -> bool {
    let sourced = |b: &OutBinding| b.source.is_some() || b.source_expression.is_some();
    if !sourced(o) && !sourced(n) {
        return o.variables == n.variables;
    }
    (o.source.is_some() && o.source == n.source)
        || (o.source_expression.is_some() && o.source_expression == n.source_expression)
}

/// The first old property among `unclaimed` (indices into `old`) occupying
/// the same slot as `new`, with its index.
pub fn find_old_property<'a>(
    old: &'a [TemplateProperty],
    unclaimed: &[usize],
    new: &TemplateProperty,
) -> Option<(usize, &'a TemplateProperty)> {
    unclaimed
        .iter()
        .filter_map(|&index| old.get(index).map(|o| (index, o)))
        .find(|(_, o)| same_slot(&o.binding, &new.binding))
}

/// The live sub-object among `candidates` that `old` created.
pub fn find_live(
    store: &dyn ObjectStore,
    lookup: &dyn ElementLookup,
    element: ObjectId,
    candidates: &[ObjectId],
    old: &TemplateProperty,
) -> Option<ObjectId> {
    let text = |object: ObjectId, attribute: &str| store.get_str(object, attribute);
    let find = |type_tag: &str, matches: &dyn Fn(ObjectId) -> bool| {
        candidates
            .iter()
            .copied()
            .find(|c| store.is(*c, type_tag) && matches(*c))
    };

    match &old.binding {
        // Plain attributes live on the owner, not in a list.
        Binding::Property(_) => None,
        Binding::Field(b) => find(tags::FIELD, &|c| text(c, "name") == Some(b.name.as_str())),
        Binding::ExecutionListener(b) => find(tags::EXECUTION_LISTENER, &|c| {
            text(c, "event") == Some(b.event.as_str())
                && store.get_ref(c, "script").is_some() == b.script_format.is_some()
        }),
        Binding::In(b) => find(tags::IN, &|c| {
            store.get(c, "businessKey").is_none() && text(c, "target") == b.target.as_deref()
        }),
        Binding::InBusinessKey(_) => find(tags::IN, &|c| text(c, "businessKey").is_some()),
        Binding::Out(b) => find(tags::OUT, &|c| {
            text(c, "source") == b.source.as_deref()
                || is_set(text(c, "sourceExpression"))
                || is_set(b.source_expression.as_deref())
        }),
        Binding::InputParameter(b) => find(tags::INPUT_PARAMETER, &|c| text(c, "name") == Some(b.name.as_str())),
        Binding::OutputParameter(b) => find(tags::OUTPUT_PARAMETER, &|c| {
            let holder = if b.script_format.is_some() {
                store.get_ref(c, "definition")
            } else {
                Some(c)
            };
            holder.is_some_and(|h| text(h, "value") == b.source.as_deref())
        }),
        Binding::NamedProperty(b) => find(tags::PROPERTY, &|c| text(c, "name") == Some(b.name.as_str())),
        Binding::ErrorEventDefinition(b) => lookup
            .error_event_definition(store, element, &b.error_ref)
            .filter(|definition| candidates.contains(definition)),
    }
}

fn is_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Binding kind a live sub-object was created for, from its type tag.
pub fn kind_of(store: &dyn ObjectStore, object: ObjectId) -> Option<BindingKind> {
    Some(match store.type_of(object)? {
        tags::FIELD => BindingKind::Field,
        tags::EXECUTION_LISTENER => BindingKind::ExecutionListener,
        tags::IN if store.get(object, "businessKey").is_some() => BindingKind::InBusinessKey,
        tags::IN => BindingKind::In,
        tags::OUT => BindingKind::Out,
        tags::INPUT_PARAMETER => BindingKind::InputParameter,
        tags::OUTPUT_PARAMETER => BindingKind::OutputParameter,
        tags::PROPERTY => BindingKind::NamedProperty,
        tags::ERROR_EVENT_DEFINITION => BindingKind::ErrorEventDefinition,
        _ => return None,
    })
}

// ----- Scopes -----

/// The old template's counterpart of `scope`: same type, or for root-element
/// scopes the same id.
pub fn find_old_scope<'a>(
    scope: &ScopeTemplate,
    old: Option<&'a Template>,
    config: &ReconcileConfig,
) -> Option<&'a ScopeTemplate> {
    let old = old?;
    if config.is_root_element_scope(&scope.scope_type) {
        old.scopes
            .iter()
            .find(|s| s.scope_type == scope.scope_type && s.id.is_some() && s.id == scope.id)
    } else {
        old.scopes.iter().find(|s| s.scope_type == scope.scope_type)
    }
}

/// The error-event-definition binding of `template` whose `errorRef` is `id`.
pub fn find_error_binding<'a>(template: &'a Template, id: &str) -> Option<&'a TemplateProperty> {
    template
        .properties
        .iter()
        .find(|p| matches!(&p.binding, Binding::ErrorEventDefinition(b) if b.error_ref == id))
}
