//! tplview is a live preview tool for template workspaces.
//! It discovers templates and partials, renders a selected template against JSON
//! data with user-defined helpers, and re-renders when files change.

/// Command-line interface module for the tplview application
pub mod cli;

/// Workspace settings (tplview.json, tplview.yml, tplview.yaml)
pub mod config;

/// Common constants and defaults
pub mod constants;

/// Error types and handling for the tplview application
pub mod error;

/// Custom helper loading from JSON/YAML helper files
pub mod helpers;

/// Logger setup for the binary
pub mod logger;

/// Partial registration under full and bare names
pub mod partials;

/// JSON line messages exchanged with the preview surface
pub mod protocol;

/// Template rendering and the render context owning engine state
pub mod renderer;

/// Recursive template discovery
pub mod scanner;

/// Preview session orchestration and the serve loop
pub mod session;

/// Per-template data remembered between renders
pub mod store;

/// Polling directory watches
pub mod watcher;
