use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use serde_json::json;
use tempfile::TempDir;

use templar_reconcile::model::{props, tags};
use templar_reconcile::{MemoryStore, ObjectStore, Value};

fn templar_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("templar"));
    cmd.env("NO_COLOR", "1");
    cmd
}

struct Workspace {
    _dir: TempDir,
    document: PathBuf,
    templates: PathBuf,
}

/// A document with one service task `Task_1` and a two-version catalog.
fn workspace() -> Workspace {
    let dir = TempDir::new().expect("tempdir");
    let document = dir.path().join("process.json");
    let templates = dir.path().join("templates.json");

    let mut store = MemoryStore::new();
    let definitions = store.create(tags::DEFINITIONS, props([("id", Some("Definitions_1".into()))]));
    let process = store
        .add_child(definitions, "rootElements", "bpmn:Process", props([("id", Some("Process_1".into()))]))
        .expect("process");
    store
        .add_child(process, "flowElements", "bpmn:ServiceTask", props([("id", Some("Task_1".into()))]))
        .expect("task");
    store.save_at(&document).expect("save document");

    let catalog = json!([
        {
            "id": "mail", "version": 1,
            "properties": [
                { "value": "true", "binding": { "type": "property", "name": "asyncBefore" } },
                { "value": "smtp", "binding": { "type": "activiti:field", "name": "host" } }
            ]
        },
        {
            "id": "mail", "version": 2,
            "properties": [
                { "value": "true", "binding": { "type": "property", "name": "asyncBefore" } },
                { "value": "imap", "binding": { "type": "activiti:field", "name": "host" } }
            ]
        },
        {
            "id": "broken", "version": 1,
            "properties": [ { "value": "a", "binding": { "type": "activiti:in" } } ]
        }
    ]);
    fs::write(&templates, serde_json::to_string_pretty(&catalog).expect("catalog json")).expect("write catalog");

    Workspace {
        _dir: dir,
        document,
        templates,
    }
}

impl Workspace {
    fn apply(&self, extra: &[&str]) -> Command {
        let mut cmd = templar_cmd();
        cmd.arg("apply")
            .arg("--document")
            .arg(&self.document)
            .arg("--templates")
            .arg(&self.templates)
            .args(["--element", "Task_1"])
            .args(extra);
        cmd
    }

    fn load(&self) -> MemoryStore {
        MemoryStore::load_at(&self.document).expect("load document")
    }
}

fn task_attribute(store: &MemoryStore, attribute: &str) -> Option<Value> {
    let task = store.find_by_id("Task_1").expect("task");
    store.get(task, attribute).cloned()
}

fn report_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("report json")
}

fn field_value(store: &MemoryStore, path: &Path) -> Option<String> {
    let task = store.find_by_id("Task_1")?;
    let extensions = store.get_ref(task, "extensionElements")?;
    let field = store
        .get_list(extensions, "values")
        .into_iter()
        .find(|v| store.is(*v, tags::FIELD))
        .unwrap_or_else(|| panic!("no field in {}", path.display()));
    store.get_str(field, "string").map(str::to_string)
}

#[test]
fn apply_writes_the_document_and_prints_outcomes() {
    let ws = workspace();

    ws.apply(&["--template", "mail@1"])
        .assert()
        .success()
        .stdout(contains("'Task_1' → mail@1"))
        .stdout(contains("asyncBefore"))
        .stdout(contains("created"));

    let store = ws.load();
    assert_eq!(task_attribute(&store, "asyncBefore"), Some(Value::from("true")));
    assert_eq!(task_attribute(&store, "modelerTemplate"), Some(Value::from("mail")));
    assert_eq!(field_value(&store, &ws.document).as_deref(), Some("smtp"));
}

#[test]
fn template_without_version_picks_the_latest() {
    let ws = workspace();

    ws.apply(&["--template", "mail"]).assert().success();

    let store = ws.load();
    assert_eq!(task_attribute(&store, "modelerTemplateVersion"), Some(Value::Int(2)));
    assert_eq!(field_value(&store, &ws.document).as_deref(), Some("imap"));
}

#[test]
fn dry_run_prints_a_diff_and_leaves_the_document_alone() {
    let ws = workspace();
    let before = fs::read_to_string(&ws.document).expect("read document");

    ws.apply(&["--template", "mail@1", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("[dry-run]"))
        .stdout(contains("+++ b/"))
        .stdout(contains("\"asyncBefore\": \"true\""));

    assert_eq!(fs::read_to_string(&ws.document).expect("read document"), before);
}

#[test]
fn swap_resolves_the_old_template_from_the_stamp() {
    let ws = workspace();
    ws.apply(&["--template", "mail@1"]).assert().success();

    let output = ws
        .apply(&["--template", "mail@2", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report = report_json(&output);
    assert_eq!(report["template"], "mail");
    assert_eq!(report["version"], 2);
    let outcomes = report["outcomes"].as_array().expect("outcomes");
    let host = outcomes
        .iter()
        .find(|o| o["kind"] == "activiti:field" && o["key"] == "host")
        .expect("host outcome");
    assert_eq!(host["action"], "updated");
    let fields = outcomes.iter().filter(|o| o["kind"] == "activiti:field").count();
    assert_eq!(fields, 1, "no field was recreated: {outcomes:?}");
    assert_eq!(field_value(&ws.load(), &ws.document).as_deref(), Some("imap"));
}

#[test]
fn remove_clears_the_stamp_only() {
    let ws = workspace();
    ws.apply(&["--template", "mail@1"]).assert().success();

    ws.apply(&["--remove"])
        .assert()
        .success()
        .stdout(contains("detached"));

    let store = ws.load();
    assert_eq!(task_attribute(&store, "modelerTemplate"), None);
    assert_eq!(task_attribute(&store, "asyncBefore"), Some(Value::from("true")));
    assert_eq!(field_value(&store, &ws.document).as_deref(), Some("smtp"));
}

#[test]
fn unknown_element_fails() {
    let ws = workspace();
    templar_cmd()
        .arg("apply")
        .arg("--document")
        .arg(&ws.document)
        .arg("--templates")
        .arg(&ws.templates)
        .args(["--element", "Task_404", "--template", "mail"])
        .assert()
        .failure()
        .stderr(contains("no element with id 'Task_404'"));
}

#[test]
fn unknown_template_fails() {
    let ws = workspace();
    ws.apply(&["--template", "mail@9"])
        .assert()
        .failure()
        .stderr(contains("template 'mail@9' not found"));
}

#[test]
fn template_or_remove_is_required() {
    let ws = workspace();
    ws.apply(&[]).assert().failure();
    ws.apply(&["--template", "mail", "--remove"]).assert().failure();
}

#[test]
fn invalid_binding_fails_without_writing() {
    let ws = workspace();
    let before = fs::read_to_string(&ws.document).expect("read document");

    ws.apply(&["--template", "broken"])
        .assert()
        .failure()
        .stderr(contains("failed to apply template to 'Task_1'"));

    assert_eq!(fs::read_to_string(&ws.document).expect("read document"), before);
}
