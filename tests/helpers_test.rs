use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::json;
use tempfile::TempDir;
use tplview::error::{Error, Result};
use tplview::helpers::{load_helpers, FileHelperSource, Helper, HelperLoadOutcome, HelperSource};
use tplview::renderer::{RenderContext, TemplateRenderer};

#[test_log::test]
fn test_single_helper_is_registered() {
    let ws = TempDir::new().unwrap();
    let path = ws.path().join("helpers.yml");
    fs::write(&path, "greet:\n  params: [n]\n  template: \"hi {{ n }}\"\n").unwrap();
    let mut context = RenderContext::new();

    let outcome = load_helpers(&mut context, &FileHelperSource::new(), Some(path)).unwrap();

    assert_eq!(outcome, HelperLoadOutcome::Registered(1));
    assert_eq!(context.helper_names().collect::<Vec<_>>(), vec!["greet"]);
    let html = context.render("page", "{{ greet('bob') }}", &json!({})).unwrap();
    assert_eq!(html, "hi bob");
}

#[test]
fn test_body_shorthand_uses_args() {
    let ws = TempDir::new().unwrap();
    let path = ws.path().join("helpers.json");
    fs::write(&path, r#"{"pair": "{{ args[0] }}-{{ args[1] }}", "version": 3}"#).unwrap();
    let mut context = RenderContext::new();

    let outcome = load_helpers(&mut context, &FileHelperSource::new(), Some(path)).unwrap();

    assert_eq!(outcome, HelperLoadOutcome::Registered(1));
    assert!(!context.has_helper("version"));
    let html = context.render("page", "{{ pair(a, 2) }}", &json!({"a": "x"})).unwrap();
    assert_eq!(html, "x-2");
}

#[test]
fn test_non_mapping_export_registers_nothing() {
    let ws = TempDir::new().unwrap();
    let path = ws.path().join("helpers.json");
    fs::write(&path, "\"just a string\"").unwrap();
    let mut context = RenderContext::new();

    let result = load_helpers(&mut context, &FileHelperSource::new(), Some(path));

    assert!(matches!(result, Err(Error::HelperLoadError(_))));
    assert_eq!(context.helper_names().count(), 0);
}

#[test]
fn test_unparsable_file_is_reported() {
    let ws = TempDir::new().unwrap();
    let path = ws.path().join("helpers.yml");
    fs::write(&path, "greet: [unclosed").unwrap();
    let mut context = RenderContext::new();

    let result = load_helpers(&mut context, &FileHelperSource::new(), Some(path));
    assert!(matches!(result, Err(Error::HelperLoadError(_))));
}

#[test]
fn test_mapping_without_callables_is_empty() {
    let ws = TempDir::new().unwrap();
    let path = ws.path().join("helpers.json");
    fs::write(&path, r#"{"answer": 42, "flags": [true]}"#).unwrap();
    let mut context = RenderContext::new();

    let outcome = load_helpers(&mut context, &FileHelperSource::new(), Some(path)).unwrap();
    assert_eq!(outcome, HelperLoadOutcome::Empty);
}

#[test]
fn test_unset_and_missing_files_are_not_errors() {
    let ws = TempDir::new().unwrap();
    let mut context = RenderContext::new();
    let source = FileHelperSource::new();

    assert_eq!(load_helpers(&mut context, &source, None).unwrap(), HelperLoadOutcome::Skipped);

    let missing = ws.path().join("nope.yml");
    assert_eq!(
        load_helpers(&mut context, &source, Some(missing.clone())).unwrap(),
        HelperLoadOutcome::Missing(missing)
    );
}

#[test]
fn test_reload_sees_edits() {
    let ws = TempDir::new().unwrap();
    let path = ws.path().join("helpers.yml");
    let source = FileHelperSource::new();
    let mut context = RenderContext::new();

    fs::write(&path, "shout: \"{{ args[0] | upper }}\"\n").unwrap();
    load_helpers(&mut context, &source, Some(path.clone())).unwrap();
    assert_eq!(context.render("page", "{{ shout('hey') }}", &json!({})).unwrap(), "HEY");

    fs::write(&path, "shout: \"{{ args[0] | upper }}!!\"\n").unwrap();
    load_helpers(&mut context, &source, Some(path)).unwrap();
    assert_eq!(context.render("page", "{{ shout('hey') }}", &json!({})).unwrap(), "HEY!!");
}

#[test]
fn test_helper_reaches_partials_and_other_helpers() {
    let ws = TempDir::new().unwrap();
    let path = ws.path().join("helpers.yml");
    fs::write(
        &path,
        "badge:\n  params: [label]\n  template: \"{% include 'badge' %}\"\nloud_badge:\n  params: [label]\n  template: \"{{ badge(label | upper) }}\"\n",
    )
    .unwrap();
    let mut context = RenderContext::new();
    context.register_partial("badge", "[{{ label }}]");

    load_helpers(&mut context, &FileHelperSource::new(), Some(path)).unwrap();

    let html = context.render("page", "{{ badge('new') }} {{ loud_badge('hot') }}", &json!({})).unwrap();
    assert_eq!(html, "[new] [HOT]");
}

struct StaticSource;

impl HelperSource for StaticSource {
    fn load(&self, _path: &Path) -> Result<IndexMap<String, Helper>> {
        let mut helpers = IndexMap::new();
        helpers.insert(
            "twice".to_string(),
            Helper::new("twice", vec!["v".to_string()], "{{ v }}{{ v }}"),
        );
        Ok(helpers)
    }
}

#[test]
fn test_custom_helper_source() {
    let ws = TempDir::new().unwrap();
    let path = ws.path().join("anything");
    fs::write(&path, "").unwrap();
    let mut context = RenderContext::new();

    let outcome = load_helpers(&mut context, &StaticSource, Some(path)).unwrap();

    assert_eq!(outcome, HelperLoadOutcome::Registered(1));
    assert_eq!(context.render("page", "{{ twice('ab') }}", &json!({})).unwrap(), "abab");
}

#[test]
fn test_reregistration_overwrites() {
    let mut context = RenderContext::new();
    context.register_helper(Helper::new("tag", Vec::new(), "old"));
    context.register_helper(Helper::new("tag", Vec::new(), "new"));

    assert_eq!(context.helper_names().count(), 1);
    assert_eq!(context.render("page", "{{ tag() }}", &json!({})).unwrap(), "new");
}
