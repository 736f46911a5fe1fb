//! # templar-reconcile
//!
//! Swaps the element template bound to a process element.
//!
//! Call [`apply`] with the element, the template it currently carries and the
//! template to bind. The engine reads the document through an
//! [`ObjectStore`], issues every mutation as a [`Command`] to a
//! [`CommandLog`], and keeps hand-edited values intact.
//!
//! ```ignore
//! let mut store = MemoryStore::load_at(path)?;
//! let mut stack = CommandStack::new();
//! let lookup = BpmnLookup::new(&config);
//! let host = Host::new(&mut store, &mut stack, &lookup, &config);
//! let report = apply(host, element, old.as_ref(), Some(&new))?;
//! ```

pub mod command;
pub mod engine;
pub mod error;
pub mod fabricate;
pub mod lookup;
pub mod matcher;
pub mod model;
pub mod report;
pub mod staleness;
pub mod store;
pub mod worklist;

pub use command::{Command, CommandLog, CommandStack};
pub use engine::{apply, Host};
pub use error::{ReconcileError, StoreError};
pub use lookup::{BpmnLookup, ElementLookup};
pub use model::{ObjectId, Props, Value};
pub use report::{Action, ApplyReport, Outcome};
pub use store::{DocumentFile, MemoryStore, ObjectStore, StoredObject};
