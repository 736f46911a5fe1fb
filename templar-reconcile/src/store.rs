//! Object store port and its in-memory implementation.
//!
//! The engine never touches a document directly; it reads through
//! [`ObjectStore`] and writes through a [`crate::command::CommandLog`], which
//! in turn calls the store's mutators. [`MemoryStore`] persists to a JSON
//! document file:
//!
//! ```json
//! { "objects": [
//!     { "id": 1, "type": "bpmn:Definitions",
//!       "attributes": { "rootElements": { "items": [2] } } },
//!     { "id": 2, "type": "bpmn:Process", "parent": 1,
//!       "attributes": { "id": "Process_1" } }
//! ] }
//! ```
//!
//! Parentless objects are document roots. Objects no root reaches through
//! reference or list attributes (members removed by a swap, objects created
//! by an aborted apply) stay in memory for undo but are not saved.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ReconcileError, StoreError};
use crate::model::{ObjectId, Props, Value};

/// Read and mutate typed objects.
pub trait ObjectStore {
    fn type_of(&self, object: ObjectId) -> Option<&str>;
    fn get(&self, object: ObjectId, property: &str) -> Option<&Value>;
    fn parent(&self, object: ObjectId) -> Option<ObjectId>;

    /// Create a detached object. Unset (`None`) properties are skipped.
    fn create(&mut self, type_tag: &str, properties: Props) -> ObjectId;

    /// Re-parent an object, returning the previous parent.
    fn set_parent(
        &mut self,
        object: ObjectId,
        parent: Option<ObjectId>,
    ) -> Result<Option<ObjectId>, StoreError>;

    /// Set or unset one attribute, returning the previous value.
    fn set(
        &mut self,
        object: ObjectId,
        property: &str,
        value: Option<Value>,
    ) -> Result<Option<Value>, StoreError>;

    fn is(&self, object: ObjectId, type_tag: &str) -> bool {
        self.type_of(object) == Some(type_tag)
    }

    fn get_str(&self, object: ObjectId, property: &str) -> Option<&str> {
        self.get(object, property).and_then(Value::as_str)
    }

    fn get_ref(&self, object: ObjectId, property: &str) -> Option<ObjectId> {
        self.get(object, property).and_then(Value::as_object)
    }

    /// Members of a list attribute; empty when unset.
    fn get_list(&self, object: ObjectId, property: &str) -> Vec<ObjectId> {
        self.get(object, property)
            .and_then(Value::as_list)
            .map(<[ObjectId]>::to_vec)
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// One object as persisted in a document file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ObjectId>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// On-disk document payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFile {
    pub objects: Vec<StoredObject>,
}

/// [`ObjectStore`] backed by a `BTreeMap`, so iteration and serialization
/// follow id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    objects: BTreeMap<ObjectId, StoredObject>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: DocumentFile) -> Self {
        let next_id = document.objects.iter().map(|o| o.id.0 + 1).max().unwrap_or(0);
        let objects = document.objects.into_iter().map(|o| (o.id, o)).collect();
        Self { objects, next_id }
    }

    /// The reachable objects, in id order.
    pub fn to_document(&self) -> DocumentFile {
        let reachable = self.reachable();
        DocumentFile {
            objects: self
                .objects
                .values()
                .filter(|o| reachable.contains(&o.id))
                .cloned()
                .collect(),
        }
    }

    /// Objects reachable from the parentless roots.
    fn reachable(&self) -> BTreeSet<ObjectId> {
        let mut seen = BTreeSet::new();
        let mut pending: Vec<ObjectId> = self
            .objects
            .values()
            .filter(|o| o.parent.is_none())
            .map(|o| o.id)
            .collect();
        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(object) = self.objects.get(&id) else {
                continue;
            };
            for value in object.attributes.values() {
                match value {
                    Value::Ref { target } => pending.push(*target),
                    Value::List { items } => pending.extend(items.iter().copied()),
                    _ => {}
                }
            }
        }
        seen
    }

    /// Load a document file.
    pub fn load_at(path: &Path) -> Result<Self, ReconcileError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let document: DocumentFile = serde_json::from_str(&contents)?;
        Ok(Self::from_document(document))
    }

    /// Save the document atomically.
    ///
    /// Writes to `<path>.tmp` then renames to `<path>`.
    pub fn save_at(&self, path: &Path) -> Result<(), ReconcileError> {
        let json = serde_json::to_string_pretty(&self.to_document())?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
        Ok(())
    }

    pub fn object(&self, id: ObjectId) -> Option<&StoredObject> {
        self.objects.get(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Find a reachable object by its document-level `id` attribute.
    pub fn find_by_id(&self, id: &str) -> Option<ObjectId> {
        let reachable = self.reachable();
        self.objects
            .values()
            .filter(|o| reachable.contains(&o.id))
            .find(|o| o.attributes.get("id").and_then(Value::as_str) == Some(id))
            .map(|o| o.id)
    }

    /// Create an object and append it to `parent.<list>`.
    pub fn add_child(
        &mut self,
        parent: ObjectId,
        list: &str,
        type_tag: &str,
        properties: Props,
    ) -> Result<ObjectId, StoreError> {
        let child = self.create(type_tag, properties);
        let mut items = self.get_list(parent, list);
        items.push(child);
        self.set(parent, list, Some(Value::list(items)))?;
        self.set_parent(child, Some(parent))?;
        Ok(child)
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut StoredObject, StoreError> {
        self.objects.get_mut(&id).ok_or(StoreError::UnknownObject(id))
    }
}

impl ObjectStore for MemoryStore {
    fn type_of(&self, object: ObjectId) -> Option<&str> {
        self.objects.get(&object).map(|o| o.type_tag.as_str())
    }

    fn get(&self, object: ObjectId, property: &str) -> Option<&Value> {
        self.objects.get(&object)?.attributes.get(property)
    }

    fn parent(&self, object: ObjectId) -> Option<ObjectId> {
        self.objects.get(&object)?.parent
    }

    fn create(&mut self, type_tag: &str, properties: Props) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let attributes = properties
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect();
        self.objects.insert(
            id,
            StoredObject {
                id,
                type_tag: type_tag.to_string(),
                parent: None,
                attributes,
            },
        );
        id
    }

    fn set_parent(
        &mut self,
        object: ObjectId,
        parent: Option<ObjectId>,
    ) -> Result<Option<ObjectId>, StoreError> {
        let stored = self.object_mut(object)?;
        Ok(std::mem::replace(&mut stored.parent, parent))
    }

    fn set(
        &mut self,
        object: ObjectId,
        property: &str,
        value: Option<Value>,
    ) -> Result<Option<Value>, StoreError> {
        let stored = self.object_mut(object)?;
        Ok(match value {
            Some(value) => stored.attributes.insert(property.to_string(), value),
            None => stored.attributes.remove(property),
        })
    }
}
