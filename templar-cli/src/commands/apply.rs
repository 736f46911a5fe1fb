//! `templar apply` — swap the template an element carries.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use similar::TextDiff;
use tabled::{settings::Style, Table, Tabled};

use templar_core::{config, find_template, load_templates_at, ReconcileConfig, Template, TemplateRef};
use templar_reconcile::{
    apply, Action, ApplyReport, BpmnLookup, CommandStack, Host, MemoryStore, ObjectId, ObjectStore, Value,
};

/// Arguments for `templar apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Document file to reconcile.
    #[arg(long)]
    pub document: PathBuf,

    /// Template catalog (JSON or YAML, one template or a list).
    #[arg(long)]
    pub templates: PathBuf,

    /// `id` attribute of the element to template.
    #[arg(long)]
    pub element: String,

    /// Template to apply, as `<id>` or `<id>@<version>`.
    #[arg(long, conflicts_with = "remove", required_unless_present = "remove")]
    pub template: Option<TemplateRef>,

    /// Detach the element from its template; authored content stays.
    #[arg(long)]
    pub remove: bool,

    /// Reconciliation settings file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Show the document diff without writing it.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ApplyArgs {
    pub fn run(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => config::load_at(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ReconcileConfig::default(),
        };
        let templates = load_templates_at(&self.templates)
            .with_context(|| format!("failed to load templates from {}", self.templates.display()))?;
        let mut store = MemoryStore::load_at(&self.document)
            .with_context(|| format!("failed to load document {}", self.document.display()))?;

        let element = store
            .find_by_id(&self.element)
            .with_context(|| format!("no element with id '{}' in {}", self.element, self.document.display()))?;
        let old = current_template(&store, element, &templates);
        let new = match &self.template {
            Some(reference) => Some(
                find_template(&templates, reference)
                    .with_context(|| format!("template '{reference}' not found in {}", self.templates.display()))?,
            ),
            None => None,
        };

        let before = render(&store)?;
        let lookup = BpmnLookup::new(&config);
        let mut stack = CommandStack::new();
        let report = apply(Host::new(&mut store, &mut stack, &lookup, &config), element, old, new)
            .with_context(|| format!("failed to apply template to '{}'", self.element))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report JSON")?
            );
        } else {
            print_report(&self.element, &report, self.dry_run);
        }

        if self.dry_run {
            if !self.json {
                print_diff(&self.document, &before, &render(&store)?);
            }
            return Ok(());
        }
        if report.commands > 0 {
            store
                .save_at(&self.document)
                .with_context(|| format!("failed to write document {}", self.document.display()))?;
        }
        Ok(())
    }
}

/// The catalog entry matching the element's `modelerTemplate` stamp.
fn current_template<'a>(store: &MemoryStore, element: ObjectId, templates: &'a [Template]) -> Option<&'a Template> {
    let id = store.get_str(element, "modelerTemplate")?;
    let version = match store.get(element, "modelerTemplateVersion") {
        Some(Value::Int(v)) => u32::try_from(*v).ok(),
        Some(Value::Str(v)) => v.parse().ok(),
        _ => None,
    };
    let reference = TemplateRef::new(id, version);
    let found = find_template(templates, &reference);
    if found.is_none() {
        tracing::warn!(template = %reference, "stamped template not in catalog; treating element as untemplated");
    }
    found
}

fn render(store: &MemoryStore) -> Result<String> {
    serde_json::to_string_pretty(&store.to_document()).context("failed to serialize document")
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "binding")]
    kind: String,
    #[tabled(rename = "key")]
    key: String,
    #[tabled(rename = "scope")]
    scope: String,
    #[tabled(rename = "action")]
    action: String,
}

fn print_report(element: &str, report: &ApplyReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    match (&report.template, report.version) {
        (Some(id), Some(version)) => println!("{prefix}✓ '{element}' → {id}@{version}"),
        (Some(id), None) => println!("{prefix}✓ '{element}' → {id}"),
        (None, _) => println!("{prefix}✓ '{element}' detached from its template"),
    }

    if !report.outcomes.is_empty() {
        let rows: Vec<OutcomeRow> = report
            .outcomes
            .iter()
            .map(|o| OutcomeRow {
                kind: o.kind.to_string(),
                key: o.key.clone(),
                scope: o.scope.clone().unwrap_or_else(|| "-".to_string()),
                action: action_label(o.action),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    println!(
        "{} commands | {} created | {} updated | {} preserved | {} removed",
        report.commands,
        report.count(Action::Created),
        report.count(Action::Updated),
        report.count(Action::Preserved),
        report.count(Action::Removed),
    );
}

fn action_label(action: Action) -> String {
    let label = action.to_string();
    match action {
        Action::Created => label.green().to_string(),
        Action::Updated => label.cyan().to_string(),
        Action::Unchanged => label.bright_black().to_string(),
        Action::Preserved => label.yellow().bold().to_string(),
        Action::Removed => label.red().to_string(),
    }
}

fn print_diff(document: &Path, before: &str, after: &str) {
    if before == after {
        println!("No differences for {}.", document.display());
        return;
    }
    let old_header = format!("a/{}", document.display());
    let new_header = format!("b/{}", document.display());
    let unified = TextDiff::from_lines(before, after)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();
    print!("{unified}");
    if !unified.ends_with('\n') {
        println!();
    }
}
