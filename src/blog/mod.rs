//! Blog pipeline: fetch posts, parse them into articles, sort into a catalog.
//!
//! - [`article`] - `ArticleSource` input and the parsed `Article`
//! - [`parser`] - Lenient markdown metadata extraction
//! - [`catalog`] - Immutable, date-sorted article collection

mod article;
mod catalog;
mod parser;

pub use article::{Article, ArticleSource};
pub use catalog::Catalog;
pub use parser::{parse, parse_at, DEFAULT_CATEGORY, EXCERPT_MAX_CHARS, EXCERPT_PLACEHOLDER};

use crate::github::{BodyFailurePolicy, FetchError, GitHubClient, PostsLocation};

/// Message shown in place of the article list when a fetch cycle fails.
pub const LOAD_ERROR_MESSAGE: &str = "Unable to load articles from GitHub";

/// Run one fetch cycle and build a fresh catalog.
///
/// Fails as a whole on any transport error; parsing itself cannot fail.
pub async fn load_catalog(
    client: &GitHubClient,
    location: &PostsLocation,
    policy: BodyFailurePolicy,
) -> Result<Catalog, FetchError> {
    let posts = client.fetch_posts(location, policy).await?;
    let parsed: Vec<Article> = posts
        .iter()
        .map(|(source, body)| parse(source, body))
        .collect();

    let catalog = Catalog::build(parsed);
    tracing::info!(
        articles = catalog.len(),
        repo = %location.repo,
        "Article catalog loaded"
    );
    Ok(catalog)
}
