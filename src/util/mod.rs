//! Shared helpers.
//!
//! - **Text**: sanitizing remote text for the terminal and width-aware truncation
//! - **Files**: atomic replacement of generated artifacts
//! - **Browser**: opening vetted web links with the system handler

mod browser;
mod fs;
mod text;

pub use browser::{checked_link, open_in_browser, OpenError};
pub use fs::atomic_write;
pub use text::{strip_control_chars, truncate_to_width};
