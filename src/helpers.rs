//! Custom helper loading.
//! A helpers file maps helper names to template bodies. It is read fresh from disk
//! on every load, so a reload always reflects the latest saved edits.
//!
//! ```yaml
//! greet: "hi {{ args[0] }}"
//! card:
//!   params: [title, body]
//!   template: "{% include 'components/card' %}"
//! ```

use crate::constants::MAX_HELPER_DEPTH;
use crate::error::{Error, Result};
use crate::renderer::RenderContext;
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use minijinja::value::{Object, ObjectRepr, Value};
use minijinja::{ErrorKind, State};
use serde::Deserialize;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

thread_local! {
    static HELPER_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// A user-defined helper callable from template expressions.
///
/// Positional arguments are bound to `params` in order and are also available as
/// `args`. The body is rendered through the engine of the calling render, so it can
/// include partials and call other helpers.
#[derive(Debug, Clone, PartialEq)]
pub struct Helper {
    name: String,
    params: Vec<String>,
    body: String,
}

impl Helper {
    pub fn new<N: Into<String>, B: Into<String>>(name: N, params: Vec<String>, body: B) -> Self {
        Self { name: name.into(), params, body: body.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Invokes the helper with an explicit handle to the running render.
    pub fn invoke(&self, state: &State<'_, '_>, args: &[Value]) -> std::result::Result<Value, minijinja::Error> {
        let _depth = DepthGuard::enter(&self.name)?;

        let mut scope: BTreeMap<String, Value> = BTreeMap::new();
        for (idx, param) in self.params.iter().enumerate() {
            scope.insert(param.clone(), args.get(idx).cloned().unwrap_or(Value::UNDEFINED));
        }
        scope.insert("args".to_string(), Value::from(args.to_vec()));

        let rendered = state.env().render_named_str(
            &format!("helper:{}", self.name),
            &self.body,
            Value::from(scope),
        )?;
        Ok(Value::from_safe_string(rendered))
    }
}

impl Object for Helper {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn call(self: &Arc<Self>, state: &State<'_, '_>, args: &[Value]) -> std::result::Result<Value, minijinja::Error> {
        self.invoke(state, args)
    }
}

struct DepthGuard;

impl DepthGuard {
    fn enter(name: &str) -> std::result::Result<Self, minijinja::Error> {
        let depth = HELPER_DEPTH.with(|d| d.get());
        if depth >= MAX_HELPER_DEPTH {
            return Err(minijinja::Error::new(
                ErrorKind::InvalidOperation,
                format!("helper '{}' exceeded the nesting limit of {}", name, MAX_HELPER_DEPTH),
            ));
        }
        HELPER_DEPTH.with(|d| d.set(depth + 1));
        Ok(DepthGuard)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        HELPER_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Accepted shapes of a helper entry.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HelperSpec {
    Body(String),
    Full {
        template: String,
        #[serde(default)]
        params: Vec<String>,
    },
}

/// Capability to turn a helpers file into named helpers.
pub trait HelperSource {
    /// Loads every callable entry of the file at `path`.
    ///
    /// # Errors
    /// * `Error::HelperLoadError` if the file cannot be read or parsed, or does not
    ///   export a mapping
    fn load(&self, path: &Path) -> Result<IndexMap<String, Helper>>;
}

/// Reads helpers from a JSON or YAML file on disk.
pub struct FileHelperSource;

impl FileHelperSource {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for FileHelperSource {
    fn default() -> Self {
        FileHelperSource::new()
    }
}

fn describe(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "a mapping",
    }
}

/// Picks the exported value: a `default` mapping when present, else the document.
fn exported(document: serde_json::Value) -> serde_json::Value {
    match document {
        serde_json::Value::Object(mut map)
            if map.get("default").is_some_and(serde_json::Value::is_object) =>
        {
            map.remove("default").unwrap_or_default()
        }
        other => other,
    }
}

/// Parses helper definitions from file content.
///
/// Entries that are neither a body string nor a mapping with a `template` are
/// skipped.
pub fn parse_helpers(content: &str) -> Result<IndexMap<String, Helper>> {
    let document: serde_json::Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::HelperLoadError(format!("invalid helpers file: {}", e)))?,
    };

    let serde_json::Value::Object(entries) = exported(document) else {
        return Err(Error::HelperLoadError(
            "helpers file must export a mapping of helpers".to_string(),
        ));
    };

    let mut helpers = IndexMap::new();
    for (name, value) in entries {
        match serde_json::from_value::<HelperSpec>(value.clone()) {
            Ok(HelperSpec::Body(body)) => {
                helpers.insert(name.clone(), Helper::new(name, Vec::new(), body));
            }
            Ok(HelperSpec::Full { template, params }) => {
                helpers.insert(name.clone(), Helper::new(name, params, template));
            }
            Err(_) => debug!("Skipping helper entry '{}': {} is not callable", name, describe(&value)),
        }
    }
    Ok(helpers)
}

impl HelperSource for FileHelperSource {
    fn load(&self, path: &Path) -> Result<IndexMap<String, Helper>> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::HelperLoadError(format!("cannot read {}: {}", path.display(), e))
        })?;
        parse_helpers(&content)
    }
}

/// What a helper load did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperLoadOutcome {
    /// No helpers file is configured
    Skipped,
    /// The configured file does not exist
    Missing(PathBuf),
    /// The file exports a mapping without callable entries
    Empty,
    /// This many helpers were registered
    Registered(usize),
}

/// Loads the helpers file at `path` and registers its helpers into `context`.
///
/// A missing path or file is not an error. Failures leave the helper table as it
/// was and are logged before being returned.
pub fn load_helpers(
    context: &mut RenderContext,
    source: &dyn HelperSource,
    path: Option<PathBuf>,
) -> Result<HelperLoadOutcome> {
    let Some(path) = path else {
        return Ok(HelperLoadOutcome::Skipped);
    };
    if !path.exists() {
        warn!("Custom helpers file not found: {}", path.display());
        return Ok(HelperLoadOutcome::Missing(path));
    }

    let helpers = source.load(&path).inspect_err(|e| error!("{}", e))?;
    if helpers.is_empty() {
        warn!("No callable helpers in {}", path.display());
        return Ok(HelperLoadOutcome::Empty);
    }

    let count = helpers.len();
    for (_, helper) in helpers {
        context.register_helper(helper);
    }
    info!("Registered {} custom helper(s) from {}", count, path.display());
    Ok(HelperLoadOutcome::Registered(count))
}
