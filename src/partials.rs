//! Partial registration.
//! Every template file under the partial roots becomes a partial addressable by its
//! full name (`a/b/c`) and by its bare file name (`c`).

use crate::renderer::RenderContext;
use crate::scanner::scan;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// The aliases a partial is registered under: full name first, then the bare name
/// when it differs.
pub fn partial_aliases(name: &str) -> Vec<String> {
    let mut aliases = vec![name.to_string()];
    if let Some((_, bare)) = name.rsplit_once('/') {
        if !bare.is_empty() && bare != name {
            aliases.push(bare.to_string());
        }
    }
    aliases
}

/// Rebuilds the partial table from the files under `roots`.
///
/// The table is cleared first, so partials whose file was deleted disappear.
/// Files are processed root by root in file-name order; on alias collisions the
/// later registration wins. Unreadable files are logged and skipped; sources are
/// not compiled until a render includes them.
///
/// # Returns
/// * `usize` - Number of partial files registered
pub fn register_partials<W: AsRef<Path>>(
    context: &mut RenderContext,
    roots: &[PathBuf],
    workspace: W,
    extension: &str,
) -> usize {
    context.clear_partials();

    let mut registered = 0;
    for record in scan(roots, workspace, extension) {
        let source = match fs::read_to_string(&record.full_path) {
            Ok(source) => source,
            Err(e) => {
                warn!("Cannot read partial {}: {}", record.full_path.display(), e);
                continue;
            }
        };

        for alias in partial_aliases(&record.name) {
            context.register_partial(&alias, &source);
        }
        registered += 1;
    }

    debug!("Registered {} partial(s)", registered);
    registered
}
