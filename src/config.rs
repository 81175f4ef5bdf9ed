//! Settings handling for tplview workspaces.
//! Settings live in the workspace root and are read fresh on every access, so edits
//! take effect on the next operation without restarting a session.

use crate::constants::{
    DEFAULT_RENDER_FUEL, DEFAULT_TEMPLATE_DIRECTORIES, DEFAULT_TEMPLATE_EXTENSION,
    SETTINGS_FILES,
};
use crate::error::{Error, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Persisted preview settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Directories scanned for templates, relative to the workspace root
    pub template_directories: Vec<String>,
    /// Directories scanned for partials; empty means "same as templates"
    pub partials_directories: Vec<String>,
    /// Optional helpers file; empty disables helper loading
    pub custom_helpers_file: String,
    /// File extension (without the dot) identifying templates
    pub template_extension: String,
    /// Evaluation budget per render, 0 disables it
    pub render_fuel: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            template_directories: DEFAULT_TEMPLATE_DIRECTORIES
                .iter()
                .map(|d| d.to_string())
                .collect(),
            partials_directories: Vec::new(),
            custom_helpers_file: String::new(),
            template_extension: DEFAULT_TEMPLATE_EXTENSION.to_string(),
            render_fuel: DEFAULT_RENDER_FUEL,
        }
    }
}

impl Settings {
    /// Absolute template directories, in configured order.
    pub fn template_dirs<P: AsRef<Path>>(&self, workspace: P) -> Vec<PathBuf> {
        resolve_all(workspace.as_ref(), &self.template_directories)
    }

    /// Absolute partial directories, falling back to the template directories.
    pub fn partial_dirs<P: AsRef<Path>>(&self, workspace: P) -> Vec<PathBuf> {
        if self.partials_directories.is_empty() {
            self.template_dirs(workspace)
        } else {
            resolve_all(workspace.as_ref(), &self.partials_directories)
        }
    }

    /// The helpers file resolved against the workspace, if one is configured.
    pub fn helpers_file<P: AsRef<Path>>(&self, workspace: P) -> Option<PathBuf> {
        let file = self.custom_helpers_file.trim();
        if file.is_empty() {
            return None;
        }
        Some(resolve(workspace.as_ref(), file))
    }

    /// The extension without a leading dot.
    pub fn extension(&self) -> &str {
        self.template_extension.trim_start_matches('.')
    }

    /// The fuel budget as the engine expects it.
    pub fn fuel(&self) -> Option<u64> {
        (self.render_fuel > 0).then_some(self.render_fuel)
    }
}

fn resolve(workspace: &Path, dir: &str) -> PathBuf {
    let path = Path::new(dir);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

fn resolve_all(workspace: &Path, dirs: &[String]) -> Vec<PathBuf> {
    dirs.iter().map(|d| resolve(workspace, d)).collect()
}

/// Returns the path of the settings file in use, or the preferred one if none exists.
pub fn settings_path<P: AsRef<Path>>(workspace: P) -> PathBuf {
    let workspace = workspace.as_ref();
    SETTINGS_FILES
        .iter()
        .map(|file| workspace.join(file))
        .find(|path| path.exists())
        .unwrap_or_else(|| workspace.join(SETTINGS_FILES[0]))
}

/// Parses settings content, trying JSON first and YAML second.
///
/// # Errors
/// * `Error::ConfigError` if the content is neither valid JSON nor valid YAML settings
pub fn parse_settings(content: &str) -> Result<Settings> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    match serde_json::from_str(content) {
        Ok(settings) => Ok(settings),
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid settings format: {}", e))),
    }
}

/// Loads the workspace settings.
///
/// A missing settings file is not an error: defaults apply.
pub fn load_settings<P: AsRef<Path>>(workspace: P) -> Result<Settings> {
    let path = settings_path(workspace);
    if !path.exists() {
        debug!("No settings file at {}, using defaults", path.display());
        return Ok(Settings::default());
    }
    debug!("Loading settings from {}", path.display());
    let content = std::fs::read_to_string(&path)?;
    parse_settings(&content)
}

/// Loads the workspace settings, falling back to defaults when the file is unusable.
pub fn current_settings<P: AsRef<Path>>(workspace: P) -> Settings {
    load_settings(workspace).unwrap_or_else(|e| {
        warn!("{}", e);
        Settings::default()
    })
}
