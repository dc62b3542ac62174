//! Terminal portfolio and blog reader backed by GitHub repositories.
//!
//! - [`github`] - Contents and repository listing client
//! - [`blog`] - Post parsing and the article catalog
//! - [`reader`] - Article navigation and scroll state
//! - [`projects`] - Repository showcase selection
//! - [`enrich`] - Offline model-driven article classification
//! - [`app`] / [`ui`] - Terminal interface

pub mod app;
pub mod blog;
pub mod config;
pub mod enrich;
pub mod github;
pub mod projects;
pub mod reader;
pub mod ui;
pub mod util;
