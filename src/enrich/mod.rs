//! Offline enrichment: classify every post with a generative model and write
//! one consolidated JSON report.
//!
//! The batch runs strictly one article at a time with a fixed pause between
//! model calls. A failed call or unreadable reply never aborts the batch; the
//! article gets [`Analysis::fallback`] instead.

mod analyzer;

pub use analyzer::{build_prompt, parse_reply, Analysis, AnalysisError, Analyzer, GeminiAnalyzer};

use crate::blog::{parse, Article, ArticleSource};
use crate::config::Config;
use crate::github::{BodyFailurePolicy, FetchError, GitHubClient, PostsLocation};
use crate::util::atomic_write;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Failed to create model client: {0}")]
    Client(#[source] AnalysisError),
    #[error("Failed to fetch articles: {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One article plus its model-derived metadata, as stored in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedArticle {
    /// File name without the `.md` suffix.
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub topics: Vec<String>,
    pub skills: Vec<String>,
    pub tools: Vec<String>,
    pub concepts: Vec<String>,
    pub difficulty: String,
    pub read_time: String,
    pub url: String,
    pub category: String,
    pub date: NaiveDate,
}

impl EnrichedArticle {
    pub fn new(source: &ArticleSource, article: &Article, analysis: Analysis) -> Self {
        let category = analysis
            .topics
            .first()
            .cloned()
            .unwrap_or_else(|| article.category.clone());
        Self {
            id: source
                .name
                .strip_suffix(".md")
                .unwrap_or(&source.name)
                .to_string(),
            title: article.title.clone(),
            excerpt: analysis.summary,
            topics: analysis.topics,
            skills: analysis.skills,
            tools: analysis.tools,
            concepts: analysis.concepts,
            difficulty: analysis.difficulty,
            read_time: format!("{} min read", analysis.read_time),
            url: source.permalink.clone(),
            category,
            date: article.date,
        }
    }
}

/// The persisted enrichment artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub articles: Vec<EnrichedArticle>,
    pub skills: Vec<String>,
    pub tools: Vec<String>,
    pub topics: Vec<String>,
    pub last_updated: DateTime<Utc>,
    pub total_articles: usize,
}

impl AnalysisReport {
    /// Collect the unique skills, tools and topics across `articles`, in
    /// first-seen order.
    pub fn assemble(articles: Vec<EnrichedArticle>, last_updated: DateTime<Utc>) -> Self {
        let skills = unique(articles.iter().flat_map(|a| &a.skills));
        let tools = unique(articles.iter().flat_map(|a| &a.tools));
        let topics = unique(articles.iter().flat_map(|a| &a.topics));
        Self {
            total_articles: articles.len(),
            articles,
            skills,
            tools,
            topics,
            last_updated,
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<(), EnrichError> {
        let json = serde_json::to_vec_pretty(self)?;
        atomic_write(path, &json).map_err(|source| EnrichError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn unique<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.contains(value) {
            out.push(value.clone());
        }
    }
    out
}

/// Where the batch reads from and writes to.
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    pub location: PostsLocation,
    pub policy: BodyFailurePolicy,
    /// Pause between consecutive model calls.
    pub delay: Duration,
    pub output: PathBuf,
}

/// Analyze each post in order, substituting the fallback record on failure.
pub async fn analyze_posts<A: Analyzer>(
    analyzer: &A,
    posts: &[(ArticleSource, String)],
    delay: Duration,
) -> Vec<EnrichedArticle> {
    let mut enriched = Vec::with_capacity(posts.len());
    for (i, (source, body)) in posts.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let article = parse(source, body);
        tracing::info!(file = %source.name, title = %article.title, "Analyzing article");
        let analysis = match analyzer.analyze(&article).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(
                    file = %source.name,
                    error = %e,
                    "Analysis failed, using default record"
                );
                Analysis::fallback(&article)
            }
        };
        enriched.push(EnrichedArticle::new(source, &article, analysis));
    }
    enriched
}

/// Fetch every post, analyze it and write the report.
///
/// A fetch failure returns an error before anything is written, so an
/// existing report survives. Zero posts still produce an empty report.
pub async fn run_enrichment<A: Analyzer>(
    client: &GitHubClient,
    analyzer: &A,
    options: &EnrichOptions,
) -> Result<AnalysisReport, EnrichError> {
    let posts = client.fetch_posts(&options.location, options.policy).await?;
    tracing::info!(articles = posts.len(), "Starting content analysis");

    let enriched = analyze_posts(analyzer, &posts, options.delay).await;
    let report = AnalysisReport::assemble(enriched, Utc::now());
    report.write_to(&options.output)?;

    tracing::info!(
        articles = report.total_articles,
        skills = report.skills.len(),
        tools = report.tools.len(),
        topics = report.topics.len(),
        output = %options.output.display(),
        "Content analysis complete"
    );
    Ok(report)
}

/// Run the batch as configured, writing to `output` or the configured path.
///
/// Without a Gemini key nothing is fetched or written and `Ok(None)` is
/// returned.
pub async fn run_from_config(
    config: &Config,
    client: &GitHubClient,
    output: Option<PathBuf>,
) -> Result<Option<AnalysisReport>, EnrichError> {
    let Some(api_key) = config.gemini_api_key.clone() else {
        tracing::warn!("GEMINI_API_KEY not set, skipping content analysis");
        return Ok(None);
    };

    let analyzer = GeminiAnalyzer::new(
        &config.gemini_base,
        &config.gemini_model,
        api_key,
        config.request_timeout(),
    )
    .map_err(EnrichError::Client)?;

    let options = EnrichOptions {
        location: config.posts_location(),
        policy: config.body_failure,
        delay: config.analysis_delay(),
        output: output.unwrap_or_else(|| config.analysis_output.clone()),
    };
    run_enrichment(client, &analyzer, &options).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails on every article whose title contains "broken".
    struct ScriptedAnalyzer {
        calls: AtomicUsize,
    }

    impl Analyzer for ScriptedAnalyzer {
        async fn analyze(&self, article: &Article) -> Result<Analysis, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if article.title.contains("broken") {
                return Err(AnalysisError::EmptyResponse);
            }
            parse_reply(
                &format!(
                    r#"{{"topics":["{t}","Shared"],"skills":["Skill {t}"],"tools":["nmap"],"summary":"About {t}.","readTime":3}}"#,
                    t = article.title
                ),
                article,
            )
        }
    }

    fn post(name: &str, body: &str) -> (ArticleSource, String) {
        (
            ArticleSource {
                name: name.to_string(),
                path: format!("posts/{}", name),
                content_hash: format!("sha-{}", name),
                download_url: format!("https://raw.example/{}", name),
                permalink: format!("https://github.com/u/r/blob/main/posts/{}", name),
            },
            body.to_string(),
        )
    }

    #[tokio::test]
    async fn test_failed_article_gets_fallback() {
        let analyzer = ScriptedAnalyzer {
            calls: AtomicUsize::new(0),
        };
        let posts = vec![
            post("alpha.md", "# Alpha\nDate: 2024-02-01\n\nFirst."),
            post("broken.md", "# broken\n\nNothing to see."),
            post("gamma.md", "# Gamma\n\nThird."),
        ];

        let enriched = analyze_posts(&analyzer, &posts, Duration::ZERO).await;
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 3);
        assert_eq!(enriched.len(), 3);

        assert_eq!(enriched[0].id, "alpha");
        assert_eq!(enriched[0].category, "Alpha");
        assert_eq!(enriched[0].read_time, "3 min read");
        assert_eq!(enriched[0].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        let fallback = &enriched[1];
        assert_eq!(fallback.topics, vec!["Security"]);
        assert_eq!(fallback.category, "Security");
        assert_eq!(fallback.difficulty, "Intermediate");
        assert_eq!(fallback.excerpt, "# broken\n\nNothing to see....");
        assert!(fallback.skills.is_empty());

        assert_eq!(enriched[2].title, "Gamma");
    }

    #[tokio::test]
    async fn test_report_aggregates_unique_in_order() {
        let analyzer = ScriptedAnalyzer {
            calls: AtomicUsize::new(0),
        };
        let posts = vec![post("b.md", "# Beta\n\nx"), post("a.md", "# Alpha\n\ny")];
        let enriched = analyze_posts(&analyzer, &posts, Duration::ZERO).await;
        let report = AnalysisReport::assemble(enriched, Utc::now());

        assert_eq!(report.total_articles, 2);
        assert_eq!(report.topics, vec!["Beta", "Shared", "Alpha"]);
        assert_eq!(report.tools, vec!["nmap"]);
        assert_eq!(report.skills, vec!["Skill Beta", "Skill Alpha"]);
    }

    #[test]
    fn test_empty_report_serializes_camel_case() {
        let report = AnalysisReport::assemble(Vec::new(), Utc::now());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["totalArticles"], 0);
        assert!(json["lastUpdated"].is_string());
        assert_eq!(json["articles"], serde_json::json!([]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_spaced_by_delay() {
        let analyzer = ScriptedAnalyzer {
            calls: AtomicUsize::new(0),
        };
        let posts = vec![post("a.md", "# A"), post("b.md", "# B"), post("c.md", "# C")];
        let start = tokio::time::Instant::now();
        analyze_posts(&analyzer, &posts, Duration::from_secs(1)).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
    }
}
