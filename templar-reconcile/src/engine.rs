//! Template application engine.
//!
//! ## `apply` — pass order
//!
//! 1. Stamp the element with the new template's id and version (or clear it).
//! 2. Stop if the template is being removed; authored content stays.
//! 3. Reconcile the element's bindings one kind at a time: plain attributes,
//!    execution listeners, fields, in/out mappings, input/output parameters,
//!    named properties, error event definitions.
//! 4. Reconcile each scope against its backing object, then attach the object
//!    to the element unless it lives among the root elements.
//!
//! Every kind step has the same shape. Each new binding is matched to an old
//! binding and to the live object that old binding created. A matched object
//! is updated unless it was edited by hand; an unmatched binding gets a fresh
//! object. Live objects of the kind that nothing claimed are removed in one
//! list update.
//!
//! Attribute updates that would not change anything are never issued, so
//! applying a template on top of itself produces no commands.

use std::collections::HashMap;

use templar_core::{Binding, BindingKind, ReconcileConfig, ScopeTemplate, Template, TemplateProperty};

use crate::command::{Command, CommandLog};
use crate::error::ReconcileError;
use crate::fabricate::{self, Blueprint};
use crate::lookup::{self, ElementLookup};
use crate::matcher;
use crate::model::{attribute_name, props, tags, text_value, ObjectId, Props, Value};
use crate::report::{Action, ApplyReport, Outcome};
use crate::staleness;
use crate::store::ObjectStore;
use crate::worklist::Worklist;

/// Collaborators of one [`apply`] call.
pub struct Host<'a> {
    pub store: &'a mut dyn ObjectStore,
    pub log: &'a mut dyn CommandLog,
    pub lookup: &'a dyn ElementLookup,
    pub config: &'a ReconcileConfig,
}

impl<'a> Host<'a> {
    pub fn new(
        store: &'a mut dyn ObjectStore,
        log: &'a mut dyn CommandLog,
        lookup: &'a dyn ElementLookup,
        config: &'a ReconcileConfig,
    ) -> Self {
        Self {
            store,
            log,
            lookup,
            config,
        }
    }
}

/// Swap `element` from template `old` to template `new`.
///
/// `old` is the template the element was stamped with, if any; `new` is the
/// template to apply, or `None` to detach the element from its template. All
/// commands are issued inside one command-log unit. On error the unit stays
/// open and the commands issued so far stay executed.
pub fn apply(
    host: Host<'_>,
    element: ObjectId,
    old: Option<&Template>,
    new: Option<&Template>,
) -> Result<ApplyReport, ReconcileError> {
    let label = match new {
        Some(template) => format!("apply {}", template.id),
        None => "remove template".to_string(),
    };
    let mut engine = Engine::new(host, element);
    engine.log.begin(&label);
    engine.run(old, new)?;
    engine.log.commit();

    let report = engine.report;
    tracing::info!(
        element = %element,
        template = %label,
        commands = report.commands,
        created = report.count(Action::Created),
        updated = report.count(Action::Updated),
        preserved = report.count(Action::Preserved),
        removed = report.count(Action::Removed),
        "template applied"
    );
    Ok(report)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Container {
    ExtensionElements,
    InputOutput,
    Properties,
}

struct Engine<'a> {
    store: &'a mut dyn ObjectStore,
    log: &'a mut dyn CommandLog,
    lookup: &'a dyn ElementLookup,
    config: &'a ReconcileConfig,
    element: ObjectId,
    containers: HashMap<(ObjectId, Container), ObjectId>,
    scope: Option<String>,
    report: ApplyReport,
}

fn select<'t>(properties: &'t [TemplateProperty], kinds: &[BindingKind]) -> Vec<&'t TemplateProperty> {
    properties.iter().filter(|p| kinds.contains(&p.kind())).collect()
}

fn log_configuration(err: ReconcileError) -> ReconcileError {
    tracing::warn!(error = %err, "invalid binding configuration");
    err
}

impl<'a> Engine<'a> {
    fn new(host: Host<'a>, element: ObjectId) -> Self {
        Self {
            store: host.store,
            log: host.log,
            lookup: host.lookup,
            config: host.config,
            element,
            containers: HashMap::new(),
            scope: None,
            report: ApplyReport::new(element),
        }
    }

    fn store(&self) -> &dyn ObjectStore {
        &*self.store
    }

    fn run(&mut self, old: Option<&Template>, new: Option<&Template>) -> Result<(), ReconcileError> {
        self.stamp(new)?;
        let Some(new) = new else {
            tracing::debug!(element = %self.element, "template removed; authored content kept");
            return Ok(());
        };

        let old_properties = old.map(|t| t.properties.as_slice()).unwrap_or_default();
        let element = self.element;
        self.reconcile_owner(old_properties, &new.properties, element)?;
        self.update_error_event_definitions(old_properties, &new.properties)?;

        for scope in &new.scopes {
            self.reconcile_scope(old, new, scope)?;
        }
        Ok(())
    }

    /// Kind steps shared by the element and its scopes.
    fn reconcile_owner(
        &mut self,
        old: &[TemplateProperty],
        new: &[TemplateProperty],
        owner: ObjectId,
    ) -> Result<(), ReconcileError> {
        self.update_properties(old, new, owner)?;
        self.update_execution_listeners(old, new, owner)?;
        self.update_fields(old, new, owner)?;
        self.update_in_out(old, new, owner)?;
        self.update_input_output(old, new, owner)?;
        self.update_named_properties(old, new, owner)
    }

    // ----- 1. Identity stamp -----

    fn stamp(&mut self, new: Option<&Template>) -> Result<(), ReconcileError> {
        let (id, version) = match new {
            Some(template) => (
                Some(Value::from(template.id.0.as_str())),
                template.version.map(|v| Value::Int(i64::from(v))),
            ),
            None => (None, None),
        };
        self.report.template = new.map(|t| t.id.clone());
        self.report.version = new.and_then(|t| t.version);

        let element = self.element;
        self.update_top_level(
            element,
            props([("modelerTemplate", id), ("modelerTemplateVersion", version)]),
        )?;
        Ok(())
    }

    // ----- 2. Plain attributes -----

    fn update_properties(
        &mut self,
        old: &[TemplateProperty],
        new: &[TemplateProperty],
        owner: ObjectId,
    ) -> Result<(), ReconcileError> {
        let config = self.config;
        let mut olds = Worklist::<usize>::indices(old.len());
        for property in select(new, &[BindingKind::Property]) {
            let Binding::Property(binding) = &property.binding else {
                continue;
            };
            let old_property = claim_old(old, &mut olds, property);
            let attribute = attribute_name(&binding.name);

            if attribute == "conditionExpression" {
                self.update_condition_expression(old_property, property)?;
                continue;
            }
            if old_property.is_some_and(|o| staleness::is_stale(self.store(), owner, o)) {
                self.record(property, Action::Preserved);
                continue;
            }

            let mut properties = props([(attribute, text_value(property.value()))]);
            for sibling in config.exclusive_siblings(attribute) {
                properties.insert(sibling.to_string(), None);
            }
            let issued = self.update_attributes(owner, properties)?;
            let action = match (issued, old_property) {
                (false, _) => Action::Unchanged,
                (true, Some(_)) => Action::Updated,
                (true, None) => Action::Created,
            };
            self.record(property, action);
        }
        Ok(())
    }

    /// `conditionExpression` is a nested expression object on the element
    /// whose body and language are reconciled independently.
    fn update_condition_expression(
        &mut self,
        old: Option<&TemplateProperty>,
        new: &TemplateProperty,
    ) -> Result<(), ReconcileError> {
        let element = self.element;
        let language = match &new.binding {
            Binding::Property(b) => b.script_format.as_deref(),
            _ => None,
        };

        let existing = self.store().get_ref(element, "conditionExpression");
        if let (Some(old), Some(expression)) = (old, existing) {
            let drift = staleness::condition_drift(self.store(), expression, old);
            let mut properties = Props::new();
            if !drift.body {
                properties.insert("body".to_string(), text_value(new.value()));
            }
            if !drift.language {
                properties.insert("language".to_string(), text_value(language));
            }
            let issued = self.update_attributes(expression, properties)?;
            let action = if drift.body && drift.language {
                Action::Preserved
            } else if issued {
                Action::Updated
            } else {
                Action::Unchanged
            };
            self.record(new, action);
            return Ok(());
        }

        let expression = self.materialize(fabricate::formal_expression(new.value(), language), Some(element))?;
        self.update_top_level(
            element,
            props([("conditionExpression", Some(Value::reference(expression)))]),
        )?;
        self.record(new, Action::Created);
        Ok(())
    }

    // ----- 3. List-valued kinds -----

    fn update_execution_listeners(
        &mut self,
        old: &[TemplateProperty],
        new: &[TemplateProperty],
        owner: ObjectId,
    ) -> Result<(), ReconcileError> {
        let news = select(new, &[BindingKind::ExecutionListener]);
        if news.is_empty() {
            return Ok(());
        }
        let container = self.container(owner, Container::ExtensionElements)?;
        self.reconcile_members(old, &news, container, "values", &[tags::EXECUTION_LISTENER])
    }

    fn update_fields(
        &mut self,
        old: &[TemplateProperty],
        new: &[TemplateProperty],
        owner: ObjectId,
    ) -> Result<(), ReconcileError> {
        let news = select(new, &[BindingKind::Field]);
        if news.is_empty() {
            return Ok(());
        }
        let is_listener = self.store().is(owner, tags::EXECUTION_LISTENER) || self.store().is(owner, tags::TASK_LISTENER);
        let (container, list) = if is_listener {
            (owner, "fields")
        } else {
            (self.container(owner, Container::ExtensionElements)?, "values")
        };
        self.reconcile_members(old, &news, container, list, &[tags::FIELD])
    }

    /// Mappings of a signal event live on its signal event definition.
    fn update_in_out(
        &mut self,
        old: &[TemplateProperty],
        new: &[TemplateProperty],
        owner: ObjectId,
    ) -> Result<(), ReconcileError> {
        let news = select(new, &[BindingKind::In, BindingKind::InBusinessKey, BindingKind::Out]);
        if news.is_empty() {
            return Ok(());
        }
        let holder = if owner == self.element {
            self.lookup.signal_event_definition(self.store(), owner).unwrap_or(owner)
        } else {
            owner
        };
        let container = self.container(holder, Container::ExtensionElements)?;
        self.reconcile_members(old, &news, container, "values", &[tags::IN, tags::OUT])
    }

    fn update_input_output(
        &mut self,
        old: &[TemplateProperty],
        new: &[TemplateProperty],
        owner: ObjectId,
    ) -> Result<(), ReconcileError> {
        let inputs = select(new, &[BindingKind::InputParameter]);
        let outputs = select(new, &[BindingKind::OutputParameter]);
        if inputs.is_empty() && outputs.is_empty() {
            return Ok(());
        }
        let container = self.container(owner, Container::InputOutput)?;
        if !inputs.is_empty() {
            self.reconcile_members(old, &inputs, container, "inputParameters", &[tags::INPUT_PARAMETER])?;
        }
        if !outputs.is_empty() {
            self.reconcile_members(old, &outputs, container, "outputParameters", &[tags::OUTPUT_PARAMETER])?;
        }
        Ok(())
    }

    fn update_named_properties(
        &mut self,
        old: &[TemplateProperty],
        new: &[TemplateProperty],
        owner: ObjectId,
    ) -> Result<(), ReconcileError> {
        let news = select(new, &[BindingKind::NamedProperty]);
        if news.is_empty() {
            return Ok(());
        }
        let container = self.container(owner, Container::Properties)?;
        self.reconcile_members(old, &news, container, "values", &[tags::PROPERTY])
    }

    fn update_error_event_definitions(
        &mut self,
        old: &[TemplateProperty],
        new: &[TemplateProperty],
    ) -> Result<(), ReconcileError> {
        let news = select(new, &[BindingKind::ErrorEventDefinition]);
        if news.is_empty() {
            return Ok(());
        }
        let container = self.container(self.element, Container::ExtensionElements)?;
        self.reconcile_members(old, &news, container, "values", &[tags::ERROR_EVENT_DEFINITION])
    }

    /// Update-or-create each of `news` in `container.<list>`, then remove the
    /// live members of `types` nothing claimed.
    fn reconcile_members(
        &mut self,
        old: &[TemplateProperty],
        news: &[&TemplateProperty],
        container: ObjectId,
        list: &str,
        types: &[&str],
    ) -> Result<(), ReconcileError> {
        let mut worklist = Worklist::new(lookup::members_of(self.store(), container, list, types));
        let mut olds = Worklist::<usize>::indices(old.len());

        for &property in news {
            let old_property = claim_old(old, &mut olds, property);
            let live = old_property.and_then(|o| {
                matcher::find_live(self.store(), self.lookup, self.element, worklist.remaining(), o)
            });
            match (old_property, live) {
                (Some(old_property), Some(live)) => {
                    worklist.claim(live);
                    self.update_member(live, old_property, property)?;
                }
                _ => self.create_member(property, container, list)?,
            }
        }

        let orphans = worklist.into_remaining();
        if orphans.is_empty() {
            return Ok(());
        }
        for &orphan in &orphans {
            if let Some(kind) = matcher::kind_of(self.store(), orphan) {
                let key = describe(self.store(), orphan, kind);
                self.push(kind, key, Action::Removed);
            }
        }
        self.execute(Command::UpdateList {
            container,
            property: list.to_string(),
            add: Vec::new(),
            remove: orphans,
        })
    }

    fn update_member(
        &mut self,
        live: ObjectId,
        old: &TemplateProperty,
        new: &TemplateProperty,
    ) -> Result<(), ReconcileError> {
        let stale = staleness::is_stale(self.store(), live, old);
        let mut issued = false;
        if !stale {
            if let Some((object, properties)) = value_update(self.store(), live, new) {
                issued |= self.update_attributes(object, properties)?;
            }
        }
        issued |= self.update_attributes(live, structural_update(&old.binding, &new.binding))?;

        let action = if stale {
            Action::Preserved
        } else if issued {
            Action::Updated
        } else {
            Action::Unchanged
        };
        self.record(new, action);
        Ok(())
    }

    fn create_member(
        &mut self,
        property: &TemplateProperty,
        container: ObjectId,
        list: &str,
    ) -> Result<(), ReconcileError> {
        let value = property.value();
        let blueprint = match &property.binding {
            // Plain attributes are written by `update_properties`.
            Binding::Property(_) => return Ok(()),
            Binding::Field(b) => fabricate::field(b, value),
            Binding::ExecutionListener(b) => fabricate::execution_listener(b, value),
            Binding::In(b) => fabricate::in_mapping(b, value).map_err(log_configuration)?,
            Binding::InBusinessKey(_) => fabricate::in_business_key(value),
            Binding::Out(b) => fabricate::out_mapping(b, value).map_err(log_configuration)?,
            Binding::InputParameter(b) => fabricate::input_parameter(b, value),
            Binding::OutputParameter(b) => fabricate::output_parameter(b, value),
            Binding::NamedProperty(b) => fabricate::named_property(b, value),
            Binding::ErrorEventDefinition(b) => {
                let error = self.create_error(&b.error_ref)?;
                fabricate::error_event_definition(value, error)
            }
        };
        let member = self.materialize(blueprint, Some(container))?;
        self.execute(Command::UpdateList {
            container,
            property: list.to_string(),
            add: vec![member],
            remove: Vec::new(),
        })?;
        self.record(property, Action::Created);
        Ok(())
    }

    /// Append a fresh `bpmn:Error` for `error_ref` to the document root.
    fn create_error(&mut self, error_ref: &str) -> Result<ObjectId, ReconcileError> {
        let config = self.config;
        let prefix = config.error_id_prefix.as_str();
        let root = lookup::root_of(self.store(), self.element);
        let stem = lookup::error_id_stem(prefix, error_ref);
        let taken: Vec<String> = self
            .store()
            .get_list(root, "rootElements")
            .into_iter()
            .filter_map(|e| self.store().get_str(e, "id").map(str::to_string))
            .filter(|id| id.starts_with(&stem))
            .collect();

        let mut n = taken.len();
        let id = loop {
            let candidate = fabricate::error_id(prefix, error_ref, n);
            if !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };

        let error = self.materialize(fabricate::error(&id), Some(root))?;
        self.execute(Command::UpdateList {
            container: root,
            property: "rootElements".to_string(),
            add: vec![error],
            remove: Vec::new(),
        })?;
        tracing::debug!(error_ref, id = %id, "error created");
        Ok(error)
    }

    // ----- 4. Scopes -----

    fn reconcile_scope(
        &mut self,
        old: Option<&Template>,
        new: &Template,
        scope: &ScopeTemplate,
    ) -> Result<(), ReconcileError> {
        let config = self.config;
        let root_scope = config.is_root_element_scope(&scope.scope_type);
        let object = match self.find_scope_object(new, scope, root_scope) {
            Some(object) => object,
            None if root_scope => {
                tracing::debug!(scope = %scope.scope_type, id = ?scope.id, "no backing root element; scope skipped");
                return Ok(());
            }
            None => {
                let object = self.store.create(&scope.scope_type, Props::new());
                self.store.set_parent(object, Some(self.element))?;
                object
            }
        };

        let old_properties = matcher::find_old_scope(scope, old, config)
            .map(|s| s.properties.as_slice())
            .unwrap_or_default();
        self.scope = Some(scope.scope_type.clone());
        let result = self.reconcile_owner(old_properties, &scope.properties, object);
        self.scope = None;
        result?;

        if root_scope {
            return Ok(());
        }
        let extensions = self.container(self.element, Container::ExtensionElements)?;
        if self.store().get_list(extensions, "values").contains(&object) {
            return Ok(());
        }
        self.execute(Command::UpdateList {
            container: extensions,
            property: "values".to_string(),
            add: vec![object],
            remove: Vec::new(),
        })?;
        tracing::debug!(scope = %scope.scope_type, object = %object, "scope attached");
        Ok(())
    }

    /// Root-element scopes are reached through the error event definition
    /// that references them; other scopes are the element's first extension
    /// of the scope type.
    fn find_scope_object(&self, template: &Template, scope: &ScopeTemplate, root_scope: bool) -> Option<ObjectId> {
        let store = self.store();
        if root_scope {
            let property = matcher::find_error_binding(template, scope.id.as_deref()?)?;
            let Binding::ErrorEventDefinition(binding) = &property.binding else {
                return None;
            };
            let definition = self.lookup.error_event_definition(store, self.element, &binding.error_ref)?;
            return store.get_ref(definition, "errorRef");
        }
        lookup::extensions_of(store, self.element, &[scope.scope_type.as_str()])
            .first()
            .copied()
    }

    // ----- 5. Containers -----

    /// Fetch or create a container of `owner`, once per pass.
    fn container(&mut self, owner: ObjectId, kind: Container) -> Result<ObjectId, ReconcileError> {
        if let Some(&container) = self.containers.get(&(owner, kind)) {
            return Ok(container);
        }
        let container = match kind {
            Container::ExtensionElements => match self.store().get_ref(owner, "extensionElements") {
                Some(existing) => existing,
                None => self.attach_new(owner, "extensionElements", fabricate::extension_elements())?,
            },
            Container::InputOutput if self.store().is(owner, tags::CONNECTOR) => {
                match self.store().get_ref(owner, "inputOutput") {
                    Some(existing) => existing,
                    None => self.attach_new(owner, "inputOutput", fabricate::input_output())?,
                }
            }
            Container::InputOutput => {
                let extensions = self.container(owner, Container::ExtensionElements)?;
                self.member_or_create(extensions, tags::INPUT_OUTPUT, fabricate::input_output)?
            }
            Container::Properties => {
                let extensions = self.container(owner, Container::ExtensionElements)?;
                self.member_or_create(extensions, tags::PROPERTIES, fabricate::properties)?
            }
        };
        self.containers.insert((owner, kind), container);
        Ok(container)
    }

    /// Create an object and store a reference to it in `owner.<attribute>`.
    fn attach_new(&mut self, owner: ObjectId, attribute: &str, blueprint: Blueprint) -> Result<ObjectId, ReconcileError> {
        let created = self.materialize(blueprint, Some(owner))?;
        let properties = props([(attribute, Some(Value::reference(created)))]);
        if owner == self.element {
            self.update_top_level(owner, properties)?;
        } else {
            self.update_attributes(owner, properties)?;
        }
        Ok(created)
    }

    fn member_or_create(
        &mut self,
        extensions: ObjectId,
        type_tag: &str,
        fabricate: fn() -> Blueprint,
    ) -> Result<ObjectId, ReconcileError> {
        if let Some(existing) = lookup::members_of(self.store(), extensions, "values", &[type_tag])
            .first()
            .copied()
        {
            return Ok(existing);
        }
        let created = self.materialize(fabricate(), Some(extensions))?;
        self.execute(Command::UpdateList {
            container: extensions,
            property: "values".to_string(),
            add: vec![created],
            remove: Vec::new(),
        })?;
        Ok(created)
    }

    // ----- 6. Store and log access -----

    /// Create the objects of `blueprint`. Nested children are parented to
    /// their holder and the root to `parent`. Only document roots are
    /// parentless, so an object dropped by a later removal or abort is
    /// unreachable rather than a new root.
    fn materialize(&mut self, blueprint: Blueprint, parent: Option<ObjectId>) -> Result<ObjectId, ReconcileError> {
        let Blueprint {
            type_tag,
            mut attributes,
            children,
        } = blueprint;
        let mut nested = Vec::with_capacity(children.len());
        for (name, child) in children {
            let id = self.materialize(child, None)?;
            attributes.insert(name.to_string(), Some(Value::reference(id)));
            nested.push(id);
        }
        let object = self.store.create(type_tag, attributes);
        for id in nested {
            self.store.set_parent(id, Some(object))?;
        }
        if parent.is_some() {
            self.store.set_parent(object, parent)?;
        }
        Ok(object)
    }

    fn update_top_level(&mut self, element: ObjectId, properties: Props) -> Result<bool, ReconcileError> {
        let properties = self.effective(element, properties);
        if properties.is_empty() {
            return Ok(false);
        }
        self.execute(Command::UpdateTopLevel { element, properties })?;
        Ok(true)
    }

    fn update_attributes(&mut self, object: ObjectId, properties: Props) -> Result<bool, ReconcileError> {
        let properties = self.effective(object, properties);
        if properties.is_empty() {
            return Ok(false);
        }
        self.execute(Command::UpdateAttributes { object, properties })?;
        Ok(true)
    }

    /// Drop entries that already hold the requested value.
    fn effective(&self, object: ObjectId, properties: Props) -> Props {
        let store = self.store();
        properties
            .into_iter()
            .filter(|(name, value)| store.get(object, name) != value.as_ref())
            .collect()
    }

    fn execute(&mut self, command: Command) -> Result<(), ReconcileError> {
        tracing::debug!(command = command.label(), target = %command.target(), "issuing command");
        self.log.execute(&mut *self.store, command)?;
        self.report.commands += 1;
        Ok(())
    }

    fn record(&mut self, property: &TemplateProperty, action: Action) {
        self.push(property.kind(), property.binding.label(), action);
    }

    fn push(&mut self, kind: BindingKind, key: String, action: Action) {
        tracing::debug!(kind = %kind, key = %key, action = %action, scope = ?self.scope, "binding reconciled");
        self.report.outcomes.push(Outcome {
            kind,
            key,
            action,
            scope: self.scope.clone(),
        });
    }
}

/// Pair `new` with the first unclaimed old property in the same slot.
fn claim_old<'t>(
    old: &'t [TemplateProperty],
    olds: &mut Worklist<usize>,
    new: &TemplateProperty,
) -> Option<&'t TemplateProperty> {
    let (index, property) = matcher::find_old_property(old, olds.remaining(), new)?;
    olds.claim(index);
    Some(property)
}

/// The value write for a matched, unedited sub-object: which object to
/// update (the sub-object or its nested script) and with what.
fn value_update(store: &dyn ObjectStore, live: ObjectId, new: &TemplateProperty) -> Option<(ObjectId, Props)> {
    let value = text_value(new.value());
    match &new.binding {
        Binding::Property(_) => None,
        Binding::Field(b) => {
            let (set, clear) = if b.expression {
                ("expression", "string")
            } else {
                ("string", "expression")
            };
            Some((live, props([(set, value), (clear, None)])))
        }
        Binding::ExecutionListener(b) if b.script_format.is_some() => store
            .get_ref(live, "script")
            .map(|script| (script, props([("value", value)]))),
        Binding::ExecutionListener(_) => Some((live, props([("value", value)]))),
        Binding::In(b) => {
            let slot = if b.expression { "sourceExpression" } else { "source" };
            Some((live, props([(slot, value)])))
        }
        Binding::InBusinessKey(_) => Some((live, props([("businessKey", value)]))),
        Binding::Out(_) => Some((live, props([("target", value)]))),
        Binding::InputParameter(b) if b.script_format.is_some() => store
            .get_ref(live, "definition")
            .map(|script| (script, props([("value", value)]))),
        Binding::InputParameter(_) => Some((live, props([("value", value)]))),
        Binding::OutputParameter(_) => Some((live, props([("name", value)]))),
        Binding::NamedProperty(_) => Some((
            live,
            props([("value", Some(new.value().unwrap_or_default().into()))]),
        )),
        Binding::ErrorEventDefinition(_) => Some((live, props([("expression", value)]))),
    }
}

/// Fields written even over hand edits: the `local` flag of in/out mappings
/// and the source-vs-expression mode of outs.
fn structural_update(old: &Binding, new: &Binding) -> Props {
    let local = |flag: bool| flag.then_some(Value::Bool(true));
    match (old, new) {
        (Binding::In(o), Binding::In(n)) if o.local != n.local => props([("local", local(n.local))]),
        (Binding::Out(o), Binding::Out(n)) => {
            let mut properties = Props::new();
            if o.local != n.local {
                properties.insert("local".to_string(), local(n.local));
            }
            if o.source != n.source || o.source_expression != n.source_expression {
                properties.insert("source".to_string(), text_value(n.source.as_deref()));
                properties.insert(
                    "sourceExpression".to_string(),
                    text_value(n.source_expression.as_deref()),
                );
            }
            properties
        }
        _ => Props::new(),
    }
}

/// Report key for a removed sub-object, mirroring [`Binding::label`].
fn describe(store: &dyn ObjectStore, object: ObjectId, kind: BindingKind) -> String {
    let text = |attribute: &str| store.get(object, attribute).and_then(Value::text);
    let key = match kind {
        BindingKind::Field | BindingKind::InputParameter | BindingKind::NamedProperty => text("name"),
        BindingKind::ExecutionListener => text("event"),
        BindingKind::In => text("target").or_else(|| text("variables").map(|v| format!("variables={v}"))),
        BindingKind::InBusinessKey => Some("businessKey".to_string()),
        BindingKind::Out => text("source")
            .or_else(|| text("sourceExpression"))
            .or_else(|| text("variables").map(|v| format!("variables={v}"))),
        BindingKind::OutputParameter => text("value").or_else(|| {
            store
                .get_ref(object, "definition")
                .and_then(|d| store.get(d, "value"))
                .and_then(Value::text)
        }),
        BindingKind::ErrorEventDefinition => store
            .get_ref(object, "errorRef")
            .and_then(|e| store.get_str(e, "id"))
            .map(str::to_string),
        BindingKind::Property => None,
    };
    key.unwrap_or_else(|| object.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use templar_core::{InBinding, OutBinding};

    #[test]
    fn structural_update_flips_local_only_when_it_changed() {
        let old = Binding::In(InBinding {
            target: Some("x".into()),
            ..InBinding::default()
        });
        let new = Binding::In(InBinding {
            target: Some("x".into()),
            local: true,
            ..InBinding::default()
        });
        assert_eq!(structural_update(&old, &new), props([("local", Some(Value::Bool(true)))]));
        assert!(structural_update(&new, &new).is_empty());
        assert_eq!(structural_update(&new, &old), props([("local", None)]));
    }

    #[test]
    fn structural_update_rewrites_out_source_mode() {
        let old = Binding::Out(OutBinding {
            source: Some("a".into()),
            ..OutBinding::default()
        });
        let new = Binding::Out(OutBinding {
            source_expression: Some("${a}".into()),
            ..OutBinding::default()
        });
        let update = structural_update(&old, &new);
        assert_eq!(update["source"], None);
        assert_eq!(update["sourceExpression"], Some(Value::from("${a}")));
    }
}
