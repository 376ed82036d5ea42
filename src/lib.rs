// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod catalog;
pub mod config;
pub mod error;
pub mod exercise;
pub mod keymap;
pub mod machine;
pub mod persistence;
pub mod plan;
pub mod results;
pub mod runtime;
pub mod session;
pub mod session_runtime;
pub mod timeline;
pub mod timers;
pub mod util;
pub mod workout;
