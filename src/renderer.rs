//! Template rendering for tplview.
//! `RenderContext` owns the engine together with its partial and helper tables.
//! It is handed by reference to the registrar, the helper loader and the render
//! pipeline, so independent previews never share engine state.
use crate::error::Result;
use crate::helpers::Helper;
use log::debug;
use minijinja::value::Value;
use minijinja::{AutoEscape, Environment};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Compiles `template` under `name` and renders it with the given context.
    ///
    /// # Arguments
    /// * `name` - Name reported in engine errors
    /// * `template` - Template source to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered markup
    fn render(&self, name: &str, template: &str, context: &serde_json::Value) -> Result<String>;
}

type PartialTable = Arc<RwLock<BTreeMap<String, String>>>;

/// MiniJinja environment plus the bookkeeping of what was registered into it.
pub struct RenderContext {
    /// MiniJinja environment instance
    env: Environment<'static>,
    /// Partial alias to raw source; the environment's loader reads from here, so a
    /// partial is only compiled when a render includes it
    partials: PartialTable,
    helpers: BTreeSet<String>,
}

impl RenderContext {
    /// Creates a context with an empty partial and helper table.
    ///
    /// Every template is rendered with HTML auto-escaping, whatever its name.
    pub fn new() -> Self {
        let partials: PartialTable = Arc::new(RwLock::new(BTreeMap::new()));
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        let table = Arc::clone(&partials);
        env.set_loader(move |name| {
            let partials = table.read().unwrap_or_else(PoisonError::into_inner);
            Ok(partials.get(name).cloned())
        });

        Self { env, partials, helpers: BTreeSet::new() }
    }

    /// Sets the evaluation budget of subsequent renders. `None` removes it.
    pub fn set_fuel(&mut self, fuel: Option<u64>) {
        self.env.set_fuel(fuel);
    }

    /// Registers a partial under `name`, replacing any earlier one.
    ///
    /// The source is not compiled here: syntax errors surface when a render
    /// includes the partial.
    pub fn register_partial(&mut self, name: &str, source: &str) {
        self.env.remove_template(name);
        self.table_mut().insert(name.to_string(), source.to_string());
    }

    /// Drops every registered partial.
    pub fn clear_partials(&mut self) {
        self.env.clear_templates();
        self.table_mut().clear();
    }

    /// Source of a registered partial.
    pub fn partial(&self, name: &str) -> Option<String> {
        self.table().get(name).cloned()
    }

    pub fn partial_names(&self) -> Vec<String> {
        self.table().keys().cloned().collect()
    }

    fn table(&self) -> RwLockReadGuard<'_, BTreeMap<String, String>> {
        self.partials.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn table_mut(&self) -> RwLockWriteGuard<'_, BTreeMap<String, String>> {
        self.partials.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a helper, replacing any earlier helper of the same name.
    pub fn register_helper(&mut self, helper: Helper) {
        let name = helper.name().to_string();
        debug!("Registering helper '{}'", name);
        self.env.add_global(name.clone(), Value::from_object(helper));
        self.helpers.insert(name);
    }

    pub fn has_helper(&self, name: &str) -> bool {
        self.helpers.contains(name)
    }

    pub fn helper_names(&self) -> impl Iterator<Item = &str> {
        self.helpers.iter().map(String::as_str)
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        RenderContext::new()
    }
}

impl TemplateRenderer for RenderContext {
    /// Renders a template string using MiniJinja with the current partials and helpers.
    ///
    /// # Errors
    /// * `Error::RenderError` carrying the engine message if compilation or evaluation
    ///   fails, including an exhausted fuel budget or runaway partial recursion
    fn render(&self, name: &str, template: &str, context: &serde_json::Value) -> Result<String> {
        Ok(self.env.render_named_str(name, template, context)?)
    }
}
