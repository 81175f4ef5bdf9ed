//! Recursive discovery of template files.
//! Walks the configured roots and produces one record per file carrying the
//! template extension. Unreadable subtrees are logged and left out.

use crate::constants::COMPONENTS_SEGMENT;
use log::{debug, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A template file found by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    /// Path relative to its root, `/`-separated, extension stripped
    pub name: String,
    /// The root directory, relative to the workspace
    pub directory: String,
    /// Absolute path of the file
    pub full_path: PathBuf,
}

/// Derives the template name of a path relative to its root.
///
/// Returns `None` if the file does not carry the template extension.
pub fn template_name<P: AsRef<Path>>(relative: P, extension: &str) -> Option<String> {
    let relative = relative.as_ref();
    if relative.extension().and_then(|e| e.to_str()) != Some(extension) {
        return None;
    }
    let stem = relative.with_extension("");
    let parts: Vec<String> = stem
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

fn display_relative(path: &Path, workspace: &Path) -> String {
    match path.strip_prefix(workspace) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => path.display().to_string(),
    }
}

/// Scans a single root recursively.
///
/// Entries are visited in file-name order within each directory. Errors while
/// reading a directory are logged and that subtree is omitted.
pub fn scan_directory<P: AsRef<Path>, W: AsRef<Path>>(
    root: P,
    workspace: W,
    extension: &str,
) -> Vec<TemplateRecord> {
    let root = root.as_ref();
    let directory = display_relative(root, workspace.as_ref());
    let mut records = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable path under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if let Some(name) = template_name(relative, extension) {
            debug!("Found template '{}' in {}", name, directory);
            records.push(TemplateRecord {
                name,
                directory: directory.clone(),
                full_path: entry.path().to_path_buf(),
            });
        }
    }

    records
}

/// Scans every existing root in order. Roots that do not exist are skipped.
pub fn scan<W: AsRef<Path>>(roots: &[PathBuf], workspace: W, extension: &str) -> Vec<TemplateRecord> {
    let workspace = workspace.as_ref();
    roots
        .iter()
        .filter(|root| root.is_dir())
        .flat_map(|root| scan_directory(root, workspace, extension))
        .collect()
}

/// Whether a template is advertised in the template list.
pub fn is_listed(record: &TemplateRecord) -> bool {
    !record.name.contains(COMPONENTS_SEGMENT)
}

/// Scans the template roots and drops component templates.
pub fn list_templates<W: AsRef<Path>>(
    roots: &[PathBuf],
    workspace: W,
    extension: &str,
) -> Vec<TemplateRecord> {
    scan(roots, workspace, extension).into_iter().filter(is_listed).collect()
}

/// Finds the first template with the given name.
pub fn find_template<'a>(records: &'a [TemplateRecord], name: &str) -> Option<&'a TemplateRecord> {
    records.iter().find(|record| record.name == name)
}
