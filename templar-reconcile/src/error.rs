//! Error types for templar-reconcile.

use std::path::PathBuf;

use thiserror::Error;

use templar_core::BindingKind;

use crate::model::ObjectId;

/// Failures reported by an [`crate::store::ObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The object id does not exist in the store.
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),

    /// A list update targeted a property holding something other than a list.
    #[error("property '{property}' of {object} is not a list")]
    NotAList { object: ObjectId, property: String },
}

/// All errors that can arise while applying a template.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The template binding cannot be turned into a model object.
    #[error("invalid {kind} binding: {reason}")]
    Configuration { kind: BindingKind, reason: String },

    /// The object store rejected an update.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document file could not be parsed or serialized.
    #[error("document JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReconcileError {
    pub(crate) fn configuration(kind: BindingKind, reason: impl Into<String>) -> Self {
        ReconcileError::Configuration {
            kind,
            reason: reason.into(),
        }
    }
}

/// Convenience constructor for [`ReconcileError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ReconcileError {
    ReconcileError::Io {
        path: path.into(),
        source,
    }
}
