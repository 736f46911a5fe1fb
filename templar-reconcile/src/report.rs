//! Result of one template application.

use std::fmt;

use serde::Serialize;

use templar_core::{BindingKind, TemplateId};

use crate::model::ObjectId;

/// What happened to one binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// A new sub-object or attribute was written.
    Created,
    /// The existing sub-object was updated to the new value.
    Updated,
    /// Already up to date; nothing was issued.
    Unchanged,
    /// Hand-edited; the value was kept.
    Preserved,
    /// Not part of the new template; removed.
    Removed,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Created => "created",
            Action::Updated => "updated",
            Action::Unchanged => "unchanged",
            Action::Preserved => "preserved",
            Action::Removed => "removed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub kind: BindingKind,
    /// Identifying key of the slot (name, target, event, ...).
    pub key: String,
    pub action: Action,
    /// Scope type when the slot belongs to a scope, e.g. `activiti:Connector`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Summary returned by [`crate::engine::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub element: ObjectId,
    /// The template now stamped on the element; `None` after removal.
    pub template: Option<TemplateId>,
    pub version: Option<u32>,
    pub outcomes: Vec<Outcome>,
    /// Number of commands handed to the command log.
    pub commands: usize,
}

impl ApplyReport {
    pub fn new(element: ObjectId) -> Self {
        Self {
            element,
            template: None,
            version: None,
            outcomes: Vec::new(),
            commands: 0,
        }
    }

    pub fn count(&self, action: Action) -> usize {
        self.outcomes.iter().filter(|o| o.action == action).count()
    }

    pub fn find(&self, kind: BindingKind, key: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.kind == kind && o.key == key)
    }
}
