use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One markdown file from the posts directory listing.
///
/// `content_hash` is the host's blob hash and doubles as the article id.
/// `permalink` points at the human-facing page for the file, not the raw body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub name: String,
    pub path: String,
    pub content_hash: String,
    pub download_url: String,
    pub permalink: String,
}

/// A parsed blog post.
///
/// Built only by [`crate::blog::parse`]; every field is populated even when the
/// markdown carries no heading or metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub category: String,
    pub excerpt: String,
    pub read_time_minutes: u32,
    pub content: String,
    pub source_url: String,
}

impl Article {
    /// "5 min read"
    pub fn read_time_label(&self) -> String {
        format!("{} min read", self.read_time_minutes)
    }

    /// Long-form date for the reader header, e.g. "January 5, 2024".
    pub fn display_date(&self) -> String {
        self.date.format("%B %-d, %Y").to_string()
    }

    /// Short date for list rows, e.g. "Jan 5, 2024".
    pub fn short_date(&self) -> String {
        self.date.format("%b %-d, %Y").to_string()
    }

    /// Post draft for sharing the article on a social feed: title, the full
    /// markdown body and a link back to the source file.
    pub fn share_draft(&self) -> String {
        format!(
            "Just read: \"{}\"\n\nFull article content (markdown):\n\n{}\n\nSource: {}\n\n#Cybersecurity #Security",
            self.title, self.content, self.source_url
        )
    }
}
