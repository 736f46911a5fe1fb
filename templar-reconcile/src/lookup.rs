//! Navigation helpers over an [`ObjectStore`].

use templar_core::ReconcileConfig;

use crate::model::{tags, ObjectId};
use crate::store::ObjectStore;

/// Element-scoped lookups the engine delegates to the host.
pub trait ElementLookup {
    /// The signal event definition of an event element, if it has one.
    fn signal_event_definition(&self, store: &dyn ObjectStore, element: ObjectId) -> Option<ObjectId>;

    /// The error event definition on `element` whose referenced error was
    /// synthesized for `error_ref`.
    fn error_event_definition(
        &self,
        store: &dyn ObjectStore,
        element: ObjectId,
        error_ref: &str,
    ) -> Option<ObjectId>;
}

/// Default lookups for Activiti-flavored BPMN documents.
#[derive(Debug, Clone)]
pub struct BpmnLookup {
    error_id_prefix: String,
}

impl BpmnLookup {
    pub fn new(config: &ReconcileConfig) -> Self {
        Self {
            error_id_prefix: config.error_id_prefix.clone(),
        }
    }
}

impl Default for BpmnLookup {
    fn default() -> Self {
        Self::new(&ReconcileConfig::default())
    }
}

impl ElementLookup for BpmnLookup {
    fn signal_event_definition(&self, store: &dyn ObjectStore, element: ObjectId) -> Option<ObjectId> {
        store
            .get_list(element, "eventDefinitions")
            .into_iter()
            .find(|d| store.is(*d, tags::SIGNAL_EVENT_DEFINITION))
    }

    fn error_event_definition(
        &self,
        store: &dyn ObjectStore,
        element: ObjectId,
        error_ref: &str,
    ) -> Option<ObjectId> {
        let prefix = error_id_stem(&self.error_id_prefix, error_ref);
        extensions_of(store, element, &[tags::ERROR_EVENT_DEFINITION])
            .into_iter()
            .find(|definition| {
                store
                    .get_ref(*definition, "errorRef")
                    .and_then(|error| store.get_str(error, "id"))
                    .is_some_and(|id| id.starts_with(&prefix))
            })
    }
}

/// `<prefix>_<errorRef>_`, the common start of every error id synthesized
/// for `error_ref`.
pub fn error_id_stem(prefix: &str, error_ref: &str) -> String {
    format!("{prefix}_{error_ref}_")
}

/// Members of `owner.extensionElements.values` with one of the given types.
pub fn extensions_of(store: &dyn ObjectStore, owner: ObjectId, types: &[&str]) -> Vec<ObjectId> {
    let Some(container) = store.get_ref(owner, "extensionElements") else {
        return Vec::new();
    };
    members_of(store, container, "values", types)
}

/// Members of `container.<list>` with one of the given types.
pub fn members_of(store: &dyn ObjectStore, container: ObjectId, list: &str, types: &[&str]) -> Vec<ObjectId> {
    store
        .get_list(container, list)
        .into_iter()
        .filter(|m| store.type_of(*m).is_some_and(|t| types.contains(&t)))
        .collect()
}

/// Walk parents up to the topmost ancestor (the definitions object in a
/// well-formed document).
pub fn root_of(store: &dyn ObjectStore, object: ObjectId) -> ObjectId {
    let mut current = object;
    while let Some(parent) = store.parent(current) {
        current = parent;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{props, Props, Value};
    use crate::store::MemoryStore;

    fn with_error_definition(error_id: &str) -> (MemoryStore, ObjectId, ObjectId) {
        let mut store = MemoryStore::new();
        let definitions = store.create(tags::DEFINITIONS, Props::new());
        let error = store
            .add_child(definitions, "rootElements", tags::ERROR, props([("id", Some(error_id.into()))]))
            .expect("error");
        let task = store.create("bpmn:ServiceTask", Props::new());
        store.set_parent(task, Some(definitions)).expect("parent");
        let ext = store.create(tags::EXTENSION_ELEMENTS, Props::new());
        store
            .set(task, "extensionElements", Some(Value::reference(ext)))
            .expect("ext");
        let definition = store
            .add_child(
                ext,
                "values",
                tags::ERROR_EVENT_DEFINITION,
                props([("errorRef", Some(Value::reference(error)))]),
            )
            .expect("definition");
        (store, task, definition)
    }

    #[test]
    fn error_definition_found_by_synthesized_id_prefix() {
        let (store, task, definition) = with_error_definition("Error_E1_3f2a9c1");
        let lookup = BpmnLookup::default();
        assert_eq!(lookup.error_event_definition(&store, task, "E1"), Some(definition));
    }

    #[test]
    fn error_ref_prefix_of_another_ref_does_not_match() {
        let (store, task, _) = with_error_definition("Error_E10_3f2a9c1");
        let lookup = BpmnLookup::default();
        assert_eq!(lookup.error_event_definition(&store, task, "E1"), None);
    }

    #[test]
    fn signal_definition_is_found_among_event_definitions() {
        let mut store = MemoryStore::new();
        let event = store.create("bpmn:IntermediateThrowEvent", Props::new());
        store
            .add_child(event, "eventDefinitions", "bpmn:TimerEventDefinition", Props::new())
            .expect("timer");
        let signal = store
            .add_child(event, "eventDefinitions", tags::SIGNAL_EVENT_DEFINITION, Props::new())
            .expect("signal");
        let lookup = BpmnLookup::default();
        assert_eq!(lookup.signal_event_definition(&store, event), Some(signal));
    }

    #[test]
    fn root_is_topmost_ancestor() {
        let (store, task, definition) = with_error_definition("Error_E1_x");
        let root = root_of(&store, definition);
        assert!(store.is(root, tags::DEFINITIONS));
        assert_eq!(root_of(&store, task), root);
    }
}
