use serde::Deserialize;

/// Entry kind in a contents-API directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One entry of `GET /repos/{owner}/{repo}/contents/{path}`.
///
/// Only the fields the blog needs; `download_url` is null for directories.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl ContentEntry {
    /// Markdown files other than the directory's README.
    ///
    /// README exclusion applies to every consumer of the listing (blog and
    /// enrichment alike).
    pub fn is_markdown_post(&self) -> bool {
        self.kind == EntryKind::File
            && self.name.ends_with(".md")
            && !self.name.eq_ignore_ascii_case("README.md")
    }
}

/// One entry of `GET /users/{username}/repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoEntry {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub fork: bool,
}

/// Where the blog posts live on the content host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostsLocation {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub branch: String,
    /// Web origin for permalinks, e.g. `https://github.com`.
    pub web_base: String,
}

impl PostsLocation {
    /// Fallback permalink when a listing entry carries no `html_url`.
    pub fn permalink(&self, file_path: &str) -> String {
        format!(
            "{}/{}/{}/blob/{}/{}",
            self.web_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.branch,
            file_path.trim_start_matches('/')
        )
    }
}

/// What to do when a single post body cannot be downloaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyFailurePolicy {
    /// Any failed body fails the whole fetch cycle.
    #[default]
    FailBatch,
    /// Failed bodies are logged and left out of the catalog.
    Skip,
}
