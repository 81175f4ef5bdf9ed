//! Common constants used throughout tplview.

/// Supported settings file names, tried in order
pub const SETTINGS_FILES: [&str; 3] = ["tplview.json", "tplview.yml", "tplview.yaml"];

/// Template directories used when the settings do not name any
pub const DEFAULT_TEMPLATE_DIRECTORIES: [&str; 3] = ["templates", "src/templates", "views"];

/// Template file extension used when the settings do not name one
pub const DEFAULT_TEMPLATE_EXTENSION: &str = "j2";

/// Default evaluation budget handed to the engine for each render
pub const DEFAULT_RENDER_FUEL: u64 = 1_000_000;

/// Templates whose name contains this segment are reusable pieces, not pages.
/// They stay registered as partials but are never advertised as templates.
pub const COMPONENTS_SEGMENT: &str = "components/";

/// Nesting limit for helpers invoking other helpers
pub const MAX_HELPER_DEPTH: usize = 64;

/// Polling interval of directory watches in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
