//! Catalog loading, error-message and binding-shape integration tests.

use assert_fs::prelude::*;
use rstest::rstest;
use templar_core::{
    find_template, load_templates_at, Binding, BindingKind, LoadError, TemplateRef, Variables,
};

const MAIL_CONNECTOR: &str = r#"[
  {
    "id": "com.example.mail",
    "version": 1,
    "name": "Mail Task",
    "properties": [
      { "value": "true", "binding": { "type": "property", "name": "asyncBefore" } },
      { "value": "smtp.example.com", "binding": { "type": "activiti:field", "name": "host" } },
      { "value": "${to}", "binding": { "type": "activiti:in", "target": "to", "expression": true } },
      { "binding": { "type": "activiti:in", "variables": "local" } },
      { "value": "result", "binding": { "type": "activiti:out", "source": "mailResult" } },
      { "value": "Subject", "binding": { "type": "activiti:inputParameter", "name": "subject", "scriptFormat": "freemarker" } },
      { "value": "E1 raised", "binding": { "type": "activiti:errorEventDefinition", "errorRef": "E1" } }
    ],
    "scopes": [
      {
        "type": "activiti:Connector",
        "properties": [
          { "value": "mail-send", "binding": { "type": "property", "name": "connectorId" } }
        ]
      }
    ]
  },
  { "id": "com.example.mail", "version": 2, "properties": [] }
]"#;

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_catalog_returns_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let err = load_templates_at(&dir.path().join("templates.json")).unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("templates.json"));
}

#[test]
fn load_corrupt_json_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("templates.json");
    file.write_str("[ { \"id\": ").expect("write");

    let err = load_templates_at(file.path()).unwrap_err();
    assert!(matches!(err, LoadError::Json { .. }), "got: {err}");
    assert!(err.to_string().contains("templates.json"), "must contain file path, got: {err}");
}

#[test]
fn load_unknown_binding_type_is_a_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("templates.yaml");
    file.write_str("id: t\nproperties:\n  - value: x\n    binding:\n      type: activiti:unknown\n")
        .expect("write");

    let err = load_templates_at(file.path()).unwrap_err();
    assert!(matches!(err, LoadError::Yaml { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Catalog content
// ---------------------------------------------------------------------------

#[test]
fn catalog_loads_every_binding_kind() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("templates.json");
    file.write_str(MAIL_CONNECTOR).expect("write");

    let templates = load_templates_at(file.path()).expect("load");
    assert_eq!(templates.len(), 2);

    let v1 = find_template(&templates, &"com.example.mail@1".parse().expect("ref"))
        .expect("v1 present");
    let kinds: Vec<BindingKind> = v1.properties.iter().map(|p| p.kind()).collect();
    assert_eq!(
        kinds,
        [
            BindingKind::Property,
            BindingKind::Field,
            BindingKind::In,
            BindingKind::In,
            BindingKind::Out,
            BindingKind::InputParameter,
            BindingKind::ErrorEventDefinition,
        ]
    );
    match &v1.properties[3].binding {
        Binding::In(b) => {
            assert_eq!(b.target, None);
            assert_eq!(b.variables, Some(Variables::Local));
        }
        other => panic!("expected activiti:in, got {other:?}"),
    }
    assert!(v1.properties[3].value.is_none());
    assert_eq!(v1.scopes[0].scope_type, "activiti:Connector");

    let latest = find_template(&templates, &TemplateRef::new("com.example.mail", None))
        .expect("latest present");
    assert_eq!(latest.version, Some(2));
}

// ---------------------------------------------------------------------------
// 3. Parameterised binding tags
// ---------------------------------------------------------------------------

#[rstest]
#[case(r#"{ "type": "property", "name": "a" }"#, BindingKind::Property)]
#[case(r#"{ "type": "activiti:field", "name": "a" }"#, BindingKind::Field)]
#[case(r#"{ "type": "activiti:executionListener", "event": "start" }"#, BindingKind::ExecutionListener)]
#[case(r#"{ "type": "activiti:in", "target": "a" }"#, BindingKind::In)]
#[case(r#"{ "type": "activiti:in:businessKey" }"#, BindingKind::InBusinessKey)]
#[case(r#"{ "type": "activiti:out", "source": "a" }"#, BindingKind::Out)]
#[case(r#"{ "type": "activiti:inputParameter", "name": "a" }"#, BindingKind::InputParameter)]
#[case(r#"{ "type": "activiti:outputParameter", "source": "a" }"#, BindingKind::OutputParameter)]
#[case(r#"{ "type": "activiti:property", "name": "a" }"#, BindingKind::NamedProperty)]
#[case(r#"{ "type": "activiti:errorEventDefinition", "errorRef": "E" }"#, BindingKind::ErrorEventDefinition)]
fn binding_tag_maps_to_kind(#[case] json: &str, #[case] kind: BindingKind) {
    let binding: Binding = serde_json::from_str(json).expect("deserialize");
    assert_eq!(binding.kind(), kind);
    let back = serde_json::to_value(&binding).expect("serialize");
    assert_eq!(back["type"], kind.type_tag());
}
