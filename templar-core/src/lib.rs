//! Templar core library — element template model, scope normalization,
//! catalog loading and reconciliation settings.
//!
//! Public API surface:
//! - [`types`] — templates, bindings and binding kinds
//! - [`scopes`] — current and legacy scope declaration shapes
//! - [`loader`] — catalog files and template selection
//! - [`config`] — [`ReconcileConfig`]
//! - [`error`] — [`LoadError`]

pub mod config;
pub mod error;
pub mod loader;
pub mod scopes;
pub mod types;

pub use config::ReconcileConfig;
pub use error::LoadError;
pub use loader::{find_template, load_templates_at, TemplateRef};
pub use types::{
    Binding, BindingKind, ErrorEventDefinitionBinding, ExecutionListenerBinding, FieldBinding,
    InBinding, InBusinessKeyBinding, InputParameterBinding, NamedPropertyBinding, OutBinding,
    OutputParameterBinding, PropertyBinding, ScopeTemplate, Template, TemplateId,
    TemplateProperty, Variables,
};
