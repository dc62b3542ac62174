//! Content host access: directory listings, raw post bodies and the user's
//! repository list.
//!
//! - [`client`] - HTTP client with optional token auth, timeouts and size limits
//! - [`types`] - Wire schemas for each endpoint plus fetch policy types

mod client;
mod types;

pub use client::{FetchError, GitHubClient};
pub(crate) use client::{read_limited_bytes, MAX_RESPONSE_SIZE};
pub use types::{BodyFailurePolicy, ContentEntry, EntryKind, PostsLocation, RepoEntry};
