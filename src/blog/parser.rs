use super::article::{Article, ArticleSource};
use chrono::{NaiveDate, Utc};
use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_CATEGORY: &str = "Security";
pub const EXCERPT_PLACEHOLDER: &str = "Click to read more...";
pub const EXCERPT_MAX_CHARS: usize = 200;
const WORDS_PER_MINUTE: usize = 200;

// CRLF mode so `$` and `.` treat "\r\n" as a line break.
fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mR)^#\s+(.+)$").expect("title pattern is valid"))
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)date:\s*([0-9]{4}-[0-9]{2}-[0-9]{2})").expect("date pattern is valid")
    })
}

fn filename_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}").expect("date pattern is valid"))
}

fn metadata_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(date|category)\s*:").expect("metadata pattern is valid"))
}

fn category_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?imR)category:\s*(.+)$").expect("category pattern is valid"))
}

/// Parse a markdown body into an [`Article`].
///
/// Never fails: every field has a deterministic fallback, so each fetched file
/// yields a renderable article. Bodies without a metadata date fall back to
/// the filename date, then to today's date (UTC).
pub fn parse(source: &ArticleSource, body: &str) -> Article {
    parse_at(source, body, Utc::now().date_naive())
}

/// [`parse`] with an explicit "today" for the last-resort date fallback.
pub fn parse_at(source: &ArticleSource, body: &str, today: NaiveDate) -> Article {
    Article {
        id: source.content_hash.clone(),
        title: extract_title(body).unwrap_or_else(|| title_from_filename(&source.name)),
        date: extract_date(body)
            .or_else(|| date_from_filename(&source.name))
            .unwrap_or(today),
        category: extract_category(body).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        excerpt: build_excerpt(body),
        read_time_minutes: read_time_minutes(body),
        content: body.to_string(),
        source_url: source.permalink.clone(),
    }
}

fn extract_title(body: &str) -> Option<String> {
    let caps = title_re().captures(body)?;
    let title = caps.get(1)?.as_str().trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// "2024-01-10-intro-to-xss.md" -> "2024 01 10 intro to xss"
fn title_from_filename(name: &str) -> String {
    let stem = name.strip_suffix(".md").unwrap_or(name);
    let title = stem.replace('-', " ");
    if title.trim().is_empty() {
        "Untitled".to_string()
    } else {
        title
    }
}

fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn extract_date(body: &str) -> Option<NaiveDate> {
    let caps = date_re().captures(body)?;
    parse_iso_date(caps.get(1)?.as_str())
}

fn date_from_filename(name: &str) -> Option<NaiveDate> {
    parse_iso_date(filename_date_re().find(name)?.as_str())
}

fn extract_category(body: &str) -> Option<String> {
    let caps = category_re().captures(body)?;
    let category = caps.get(1)?.as_str().trim();
    (!category.is_empty()).then(|| category.to_string())
}

/// Plain-text prefix of the first paragraph after the title heading.
///
/// Metadata lines (`date:`, `category:`) are not prose and are dropped before
/// the paragraph split. At most `EXCERPT_MAX_CHARS` characters plus a trailing
/// "..." when cut.
fn build_excerpt(body: &str) -> String {
    let normalized = body.replace("\r\n", "\n");
    let without_title = title_re().replace(&normalized, "");
    let prose = without_title
        .lines()
        .filter(|line| !metadata_line_re().is_match(line))
        .collect::<Vec<_>>()
        .join("\n");
    let first_paragraph = prose.trim().split("\n\n").next().unwrap_or_default();

    let stripped: String = first_paragraph
        .chars()
        .filter(|c| !matches!(c, '#' | '*' | '`'))
        .collect();
    let stripped = stripped.trim();

    if stripped.is_empty() {
        return EXCERPT_PLACEHOLDER.to_string();
    }

    if stripped.chars().count() > EXCERPT_MAX_CHARS {
        let cut: String = stripped.chars().take(EXCERPT_MAX_CHARS).collect();
        format!("{}...", cut.trim_end())
    } else {
        stripped.to_string()
    }
}

fn read_time_minutes(body: &str) -> u32 {
    let words = body.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}
