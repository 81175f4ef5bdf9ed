//! Preview session orchestration.
//! A session owns the render context and the template data of one workspace and
//! turns requests and file events into messages for the preview surface.

use crate::config::{current_settings, settings_path, Settings};
use crate::error::{Error, Result};
use crate::helpers::{load_helpers, FileHelperSource, HelperLoadOutcome, HelperSource};
use crate::partials::register_partials;
use crate::protocol::{parse_request, Message, NoticeLevel, Request};
use crate::renderer::{RenderContext, TemplateRenderer};
use crate::scanner::{find_template, list_templates, TemplateRecord};
use crate::store::TemplateDataStore;
use crate::watcher::{plan_watches, DirectoryWatch, FileEvent, FileEventKind, WatchHandle, WatchScope};
use log::{debug, error, info, warn};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub struct PreviewSession {
    workspace: PathBuf,
    context: RenderContext,
    store: TemplateDataStore,
    helper_source: Box<dyn HelperSource>,
}

impl PreviewSession {
    /// Creates a session for `workspace` reading helpers from disk.
    pub fn new<P: Into<PathBuf>>(workspace: P) -> Self {
        Self::with_helper_source(workspace, Box::new(FileHelperSource::new()))
    }

    pub fn with_helper_source<P: Into<PathBuf>>(workspace: P, helper_source: Box<dyn HelperSource>) -> Self {
        Self {
            workspace: workspace.into(),
            context: RenderContext::new(),
            store: TemplateDataStore::new(),
            helper_source,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Current settings, read fresh from the workspace.
    pub fn settings(&self) -> Settings {
        current_settings(&self.workspace)
    }

    /// Fails with `ConfigurationMissing` when none of the template directories exists.
    pub fn check_configuration(&self) -> Result<()> {
        let settings = self.settings();
        let dirs = settings.template_dirs(&self.workspace);
        if dirs.iter().any(|dir| dir.is_dir()) {
            return Ok(());
        }
        Err(Error::ConfigurationMissing {
            searched: settings.template_directories.join(", "),
            settings_file: settings_path(&self.workspace).display().to_string(),
        })
    }

    /// The advertised template list.
    pub fn templates(&self) -> Vec<TemplateRecord> {
        let settings = self.settings();
        list_templates(&settings.template_dirs(&self.workspace), &self.workspace, settings.extension())
    }

    /// Rebuilds the partial table and returns the number of partial files.
    pub fn register_partials(&mut self) -> usize {
        let settings = self.settings();
        register_partials(
            &mut self.context,
            &settings.partial_dirs(&self.workspace),
            &self.workspace,
            settings.extension(),
        )
    }

    /// Loads the configured helpers file.
    pub fn load_helpers(&mut self) -> Result<HelperLoadOutcome> {
        let path = self.settings().helpers_file(&self.workspace);
        load_helpers(&mut self.context, self.helper_source.as_ref(), path)
    }

    /// Loads helpers and then renders, for one-shot use outside a preview.
    ///
    /// A helpers file that fails to load is logged and the render goes ahead with
    /// whatever helpers are already registered.
    pub fn render_with_helpers(&mut self, name: &str, data: serde_json::Value) -> Result<String> {
        if let Err(e) = self.load_helpers() {
            warn!("{}", e);
        }
        self.render(name, data)
    }

    /// Loads helpers and summarises the outcome for a terminal.
    ///
    /// A missing or empty helpers file is a warning, not an error.
    ///
    /// # Errors
    /// * `Error::HelperLoadError` if the helpers file exists but cannot be loaded
    pub fn helper_report(&mut self) -> Result<(NoticeLevel, String)> {
        let report = match self.load_helpers()? {
            HelperLoadOutcome::Skipped => (NoticeLevel::Info, "No custom helpers file configured.".to_string()),
            HelperLoadOutcome::Missing(path) => (
                NoticeLevel::Warning,
                format!("Custom helpers file not found: {}", path.display()),
            ),
            HelperLoadOutcome::Empty => (
                NoticeLevel::Warning,
                "Custom helpers file exports no callable helpers.".to_string(),
            ),
            HelperLoadOutcome::Registered(count) => {
                let names: Vec<&str> = self.context.helper_names().collect();
                (
                    NoticeLevel::Info,
                    format!("Registered {} custom helper(s): {}", count, names.join(", ")),
                )
            }
        };
        Ok(report)
    }

    /// Renders a template with `data` and remembers the data on success.
    ///
    /// # Errors
    /// * `Error::TemplateNotFound` if no template carries `name`; saved data is untouched
    /// * `Error::RenderError` for compile or evaluation failures
    /// * `Error::IoError` if the template file cannot be read
    pub fn render(&mut self, name: &str, data: serde_json::Value) -> Result<String> {
        let settings = self.settings();
        let templates = self.templates();
        let record = find_template(&templates, name)
            .ok_or_else(|| Error::TemplateNotFound { name: name.to_string() })?;

        self.register_partials();
        let source = std::fs::read_to_string(&record.full_path)?;

        self.context.set_fuel(settings.fuel());
        let html = self.context.render(&record.name, &source, &data)?;
        debug!("Rendered '{}' ({} bytes)", name, html.len());

        self.store.set(&self.workspace, name, data);
        Ok(html)
    }

    pub fn template_data(&self, name: &str) -> serde_json::Value {
        self.store.get(&self.workspace, name)
    }

    pub fn clear_template_data(&mut self, name: &str) {
        self.store.clear(&self.workspace, name);
    }

    pub fn clear_all_data(&mut self) {
        self.store.clear_all();
    }

    /// Opens the preview: registers partials, loads helpers and advertises templates.
    pub fn open(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        if let Err(e) = self.check_configuration() {
            warn!("{}", e);
            messages.push(Message::notice(NoticeLevel::Warning, e.to_string()));
        }
        let count = self.register_partials();
        messages.push(Message::PartialsRegistered { count });
        messages.extend(self.helper_notice());
        messages.push(Message::Templates { templates: self.templates() });
        messages
    }

    /// Re-runs helper loading and asks the surface to re-render.
    pub fn reload_helpers(&mut self) -> Vec<Message> {
        let mut messages: Vec<Message> = self.helper_notice().into_iter().collect();
        messages.push(Message::AutoRerender);
        messages
    }

    fn helper_notice(&mut self) -> Option<Message> {
        match self.load_helpers() {
            Ok(HelperLoadOutcome::Skipped) => None,
            Ok(HelperLoadOutcome::Missing(path)) => Some(Message::notice(
                NoticeLevel::Warning,
                format!("Custom helpers file not found: {}", path.display()),
            )),
            Ok(HelperLoadOutcome::Empty) => Some(Message::notice(
                NoticeLevel::Warning,
                "Custom helpers file exports no callable helpers",
            )),
            Ok(HelperLoadOutcome::Registered(count)) => Some(Message::notice(
                NoticeLevel::Info,
                format!("Registered {} custom helper(s)", count),
            )),
            Err(e) => Some(Message::notice(NoticeLevel::Error, e.to_string())),
        }
    }

    /// Handles one request from the preview surface.
    pub fn handle(&mut self, request: Request) -> Vec<Message> {
        match request {
            Request::GetTemplates | Request::RefreshTemplates => {
                vec![Message::Templates { templates: self.templates() }]
            }
            Request::RenderTemplate { name, data } => match self.render(&name, data) {
                Ok(html) => vec![Message::Rendered { html }],
                Err(e) => {
                    error!("Rendering '{}' failed: {}", name, e);
                    vec![Message::Error { message: e.to_string() }]
                }
            },
            Request::GetTemplateData { name } => {
                vec![Message::TemplateData { data: self.template_data(&name) }]
            }
            Request::ClearTemplateData { name } => {
                self.clear_template_data(&name);
                vec![Message::TemplateDataCleared]
            }
            Request::ReloadHelpers => self.reload_helpers(),
            Request::ClearAllData => {
                self.clear_all_data();
                vec![Message::ClearAllData]
            }
        }
    }

    /// Reacts to a change observed by a watch.
    ///
    /// Every event re-registers partials and refreshes the template list. Only edits
    /// inside a template root ask for a re-render; created and deleted files do not.
    pub fn handle_watch_event(&mut self, event: &FileEvent) -> Vec<Message> {
        let count = self.register_partials();
        let mut messages = vec![
            Message::PartialsRegistered { count },
            Message::Templates { templates: self.templates() },
        ];
        if event.kind == FileEventKind::Changed && event.scope == WatchScope::Template {
            messages.push(Message::AutoRerender);
        }
        messages
    }

    /// Watches covering the configured template and partial roots.
    pub fn watches(&self) -> Vec<DirectoryWatch> {
        let settings = self.settings();
        plan_watches(
            &settings.template_dirs(&self.workspace),
            &settings.partial_dirs(&self.workspace),
            settings.extension(),
        )
    }
}

enum Input {
    Line(String),
    Watch(FileEvent),
    Closed,
}

fn send<W: Write>(output: &mut W, messages: Vec<Message>) -> Result<()> {
    for message in messages {
        writeln!(output, "{}", message.to_line()?)?;
    }
    output.flush()?;
    Ok(())
}

/// Runs a preview session over line-delimited JSON until `input` is exhausted.
///
/// Requests and watch events are handled one at a time in arrival order. The
/// watches are released before returning.
pub fn serve<R, W>(session: &mut PreviewSession, input: R, mut output: W, poll_interval: Duration) -> Result<()>
where
    R: BufRead + Send + 'static,
    W: Write,
{
    let (tx, rx) = mpsc::channel();

    let watch_tx = tx.clone();
    let watch = WatchHandle::spawn(session.watches(), poll_interval, move |event| {
        watch_tx.send(Input::Watch(event)).is_ok()
    });

    let reader = thread::spawn(move || {
        for line in input.lines() {
            match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => {
                    if tx.send(Input::Line(line)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!("Stopped reading requests: {}", e);
                    break;
                }
            }
        }
        let _ = tx.send(Input::Closed);
    });

    info!("Preview opened for {}", session.workspace().display());
    send(&mut output, session.open())?;

    let result = loop {
        let Ok(input) = rx.recv() else {
            break Ok(());
        };
        let messages = match input {
            Input::Line(line) => match parse_request(&line) {
                Ok(request) => session.handle(request),
                Err(e) => {
                    warn!("{}", e);
                    vec![Message::Error { message: e.to_string() }]
                }
            },
            Input::Watch(event) => session.handle_watch_event(&event),
            Input::Closed => break Ok(()),
        };
        if let Err(e) = send(&mut output, messages) {
            break Err(e);
        }
    };

    watch.release();
    if result.is_ok() && reader.join().is_err() {
        warn!("Request reader panicked");
    }
    info!("Preview closed");
    result
}
