//! Terminal User Interface module.
//!
//! This module provides the TUI for the blog and project showcase:
//! - Main event loop (`run`)
//! - Input handling for the list views and the reader
//! - Rendering for the article list, project list and reader
//! - Background fetch tasks and their completion events
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background fetches and completion events
//! - `render` - View rendering dispatch
//! - `articles` - Article list widget
//! - `projects` - Project showcase widget
//! - `reader` - Article reader widget and markdown rendering
//! - `status` - Status bar widget

mod articles;
mod events;
mod input;
mod loop_runner;
mod projects;
pub mod reader;
mod render;
mod status;

pub use events::Sources;
pub use loop_runner::{run, Action};
