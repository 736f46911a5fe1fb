//! Undoable commands.
//!
//! Every mutation the engine makes to an attached object goes through one of
//! three commands:
//!
//! | Command            | Effect                                              |
//! |--------------------|-----------------------------------------------------|
//! | `UpdateTopLevel`   | set attributes on the element being templated       |
//! | `UpdateAttributes` | set attributes on any other object                  |
//! | `UpdateList`       | add/remove members of a list attribute              |
//!
//! A [`CommandLog`] receives them. [`CommandStack`] executes each against the
//! store, records how to revert it, and groups one `apply` into one undo unit.

use serde::Serialize;

use crate::error::{ReconcileError, StoreError};
use crate::model::{ObjectId, Props, Value};
use crate::store::ObjectStore;

/// A single document mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Command {
    UpdateTopLevel {
        element: ObjectId,
        properties: Props,
    },
    UpdateAttributes {
        object: ObjectId,
        properties: Props,
    },
    UpdateList {
        container: ObjectId,
        property: String,
        add: Vec<ObjectId>,
        remove: Vec<ObjectId>,
    },
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Command::UpdateTopLevel { .. } => "update-top-level",
            Command::UpdateAttributes { .. } => "update-attributes",
            Command::UpdateList { .. } => "update-list",
        }
    }

    /// The object the command mutates.
    pub fn target(&self) -> ObjectId {
        match self {
            Command::UpdateTopLevel { element, .. } => *element,
            Command::UpdateAttributes { object, .. } => *object,
            Command::UpdateList { container, .. } => *container,
        }
    }
}

/// Sink for the commands of one template application.
pub trait CommandLog {
    /// Open a unit; everything until [`CommandLog::commit`] undoes together.
    fn begin(&mut self, _label: &str) {}

    fn execute(&mut self, store: &mut dyn ObjectStore, command: Command) -> Result<(), ReconcileError>;

    fn commit(&mut self) {}
}

/// One step that restores state touched by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revert {
    Attribute {
        object: ObjectId,
        property: String,
        previous: Option<Value>,
    },
    Parent {
        object: ObjectId,
        previous: Option<ObjectId>,
    },
}

/// Run a command against a store, returning the steps that undo it.
pub fn execute_on(store: &mut dyn ObjectStore, command: &Command) -> Result<Vec<Revert>, StoreError> {
    let mut reverts = Vec::new();
    match command {
        Command::UpdateTopLevel {
            element: object,
            properties,
        }
        | Command::UpdateAttributes { object, properties } => {
            for (property, value) in properties {
                let previous = store.set(*object, property, value.clone())?;
                reverts.push(Revert::Attribute {
                    object: *object,
                    property: property.clone(),
                    previous,
                });
            }
        }
        Command::UpdateList {
            container,
            property,
            add,
            remove,
        } => {
            let current = match store.get(*container, property) {
                None => Vec::new(),
                Some(Value::List { items }) => items.clone(),
                Some(_) => {
                    return Err(StoreError::NotAList {
                        object: *container,
                        property: property.clone(),
                    })
                }
            };
            let mut items: Vec<ObjectId> = current.into_iter().filter(|i| !remove.contains(i)).collect();
            for item in add {
                if !items.contains(item) {
                    items.push(*item);
                }
            }
            let previous = store.set(*container, property, Some(Value::list(items)))?;
            reverts.push(Revert::Attribute {
                object: *container,
                property: property.clone(),
                previous,
            });
            for item in add {
                let previous = store.set_parent(*item, Some(*container))?;
                reverts.push(Revert::Parent {
                    object: *item,
                    previous,
                });
            }
        }
    }
    Ok(reverts)
}

fn revert_all(store: &mut dyn ObjectStore, reverts: &[Revert]) -> Result<(), StoreError> {
    for revert in reverts.iter().rev() {
        match revert {
            Revert::Attribute {
                object,
                property,
                previous,
            } => {
                store.set(*object, property, previous.clone())?;
            }
            Revert::Parent { object, previous } => {
                store.set_parent(*object, *previous)?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Command stack
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Entry {
    command: Command,
    reverts: Vec<Revert>,
}

#[derive(Debug, Clone)]
struct Unit {
    label: String,
    entries: Vec<Entry>,
}

/// Undo/redo history of executed commands.
#[derive(Debug, Default)]
pub struct CommandStack {
    done: Vec<Unit>,
    undone: Vec<Unit>,
    open: Option<Unit>,
}

impl CommandStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command still applied, oldest first.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.done
            .iter()
            .chain(self.open.iter())
            .flat_map(|u| u.entries.iter().map(|e| &e.command))
    }

    /// Labels of the committed units, oldest first.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.done.iter().map(|u| u.label.as_str())
    }

    pub fn can_undo(&self) -> bool {
        self.open.is_none() && !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.open.is_none() && !self.undone.is_empty()
    }

    /// Revert the most recent committed unit. Returns `false` when there is
    /// nothing to undo.
    pub fn undo(&mut self, store: &mut dyn ObjectStore) -> Result<bool, StoreError> {
        if !self.can_undo() {
            return Ok(false);
        }
        let Some(unit) = self.done.pop() else {
            return Ok(false);
        };
        for entry in unit.entries.iter().rev() {
            revert_all(store, &entry.reverts)?;
        }
        tracing::debug!(unit = %unit.label, "undone");
        self.undone.push(unit);
        Ok(true)
    }

    /// Re-execute the most recently undone unit.
    pub fn redo(&mut self, store: &mut dyn ObjectStore) -> Result<bool, StoreError> {
        if !self.can_redo() {
            return Ok(false);
        }
        let Some(mut unit) = self.undone.pop() else {
            return Ok(false);
        };
        for entry in &mut unit.entries {
            entry.reverts = execute_on(store, &entry.command)?;
        }
        tracing::debug!(unit = %unit.label, "redone");
        self.done.push(unit);
        Ok(true)
    }

    /// Revert and drop the open unit, e.g. after a failed apply.
    pub fn abort(&mut self, store: &mut dyn ObjectStore) -> Result<(), StoreError> {
        if let Some(unit) = self.open.take() {
            for entry in unit.entries.iter().rev() {
                revert_all(store, &entry.reverts)?;
            }
            tracing::debug!(unit = %unit.label, "aborted");
        }
        Ok(())
    }
}

impl CommandLog for CommandStack {
    fn begin(&mut self, label: &str) {
        if let Some(unit) = self.open.take() {
            self.done.push(unit);
        }
        self.open = Some(Unit {
            label: label.to_string(),
            entries: Vec::new(),
        });
    }

    fn execute(&mut self, store: &mut dyn ObjectStore, command: Command) -> Result<(), ReconcileError> {
        let reverts = execute_on(store, &command)?;
        let entry = Entry { command, reverts };
        self.undone.clear();
        match &mut self.open {
            Some(unit) => unit.entries.push(entry),
            None => self.done.push(Unit {
                label: entry.command.label().to_string(),
                entries: vec![entry],
            }),
        }
        Ok(())
    }

    fn commit(&mut self) {
        if let Some(unit) = self.open.take() {
            self.done.push(unit);
        }
    }
}
