//! Env file editing library.
//!
//! This library edits `KEY=value` configuration files (the `.env`
//! convention): reading single values, listing entries, inserting, updating
//! and removing keys, and snapshot/restore through plain file copies in a
//! sibling `.env.backup/` directory.
//!
//! # Features
//!
//! - **Surgical edits**: only the targeted line changes; comments, blank
//!   lines and ordering are preserved
//! - **Transparent quoting**: values with spaces or quotes round-trip
//!   unchanged
//! - **Crash-safe writes**: every rewrite goes through a temp file and rename
//! - **Optional tracing**: detailed logging when the `tracing` feature is
//!   enabled
//!
//! # Example
//!
//! ```rust,no_run
//! use env_editor::editor::EnvEditor;
//!
//! let editor = EnvEditor::new(".env");
//! editor.set_or_update("APP_ENV", "production")?;
//! let backup = editor.backup(None)?;
//! println!("backed up to {}", backup.display());
//! # Ok::<(), env_editor::editor::EnvEditorError>(())
//! ```

pub mod editor;
pub mod parse;
