use crate::blog::Article;
use crate::github::{read_limited_bytes, FetchError, MAX_RESPONSE_SIZE};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Characters of article body included in the prompt.
const PROMPT_CONTENT_CHARS: usize = 4000;
/// Characters of article body used as the fallback summary.
const FALLBACK_SUMMARY_CHARS: usize = 150;
const FALLBACK_TOPIC: &str = "Security";
const DEFAULT_DIFFICULTY: &str = "Intermediate";

const MAX_TOPICS: usize = 3;
const MAX_SKILLS: usize = 5;
const MAX_TOOLS: usize = 5;
const MAX_CONCEPTS: usize = 3;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Transport(#[from] FetchError),
    #[error("Model returned no text")]
    EmptyResponse,
    #[error("Model reply is not a valid analysis: {0}")]
    MalformedReply(#[from] serde_json::Error),
}

/// Model-derived metadata for one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default)]
    pub read_time: u32,
}

fn default_difficulty() -> String {
    DEFAULT_DIFFICULTY.to_string()
}

impl Analysis {
    /// Record used when the model call or its reply fails.
    pub fn fallback(article: &Article) -> Self {
        let head: String = article.content.chars().take(FALLBACK_SUMMARY_CHARS).collect();
        Self {
            topics: vec![FALLBACK_TOPIC.to_string()],
            skills: Vec::new(),
            tools: Vec::new(),
            concepts: Vec::new(),
            summary: format!("{}...", head),
            difficulty: default_difficulty(),
            read_time: article.read_time_minutes,
        }
    }

    /// Clamp list lengths to what the prompt asked for and fill a missing
    /// read time from the article's word count.
    fn normalized(mut self, article: &Article) -> Self {
        self.topics.truncate(MAX_TOPICS);
        self.skills.truncate(MAX_SKILLS);
        self.tools.truncate(MAX_TOOLS);
        self.concepts.truncate(MAX_CONCEPTS);
        if self.read_time == 0 {
            self.read_time = article.read_time_minutes;
        }
        self
    }
}

/// Something that can classify and summarize an article.
pub trait Analyzer {
    fn analyze(
        &self,
        article: &Article,
    ) -> impl Future<Output = Result<Analysis, AnalysisError>> + Send;
}

/// Client for the `generateContent` endpoint of the Gemini API.
pub struct GeminiAnalyzer {
    http: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
    timeout: Duration,
}

impl GeminiAnalyzer {
    pub fn new(
        base: &str,
        model: &str,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, AnalysisError> {
        let invalid = || FetchError::InvalidUrl(base.to_string());
        let method = format!("{}:generateContent", model);
        let mut endpoint = Url::parse(base).map_err(|_| invalid())?;
        endpoint
            .path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["v1beta", "models", method.as_str()]);

        let http = reqwest::Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Network)?;

        Ok(Self {
            http,
            endpoint,
            api_key,
            timeout,
        })
    }

    async fn generate(&self, prompt: String) -> Result<String, AnalysisError> {
        let body = serde_json::to_vec(&GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        })?;

        let request = self
            .http
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", self.api_key.expose_secret())
            .body(body);

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout.as_secs()))?
            .map_err(FetchError::Network)?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()).into());
        }

        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        let reply: GenerateResponse = serde_json::from_slice(&bytes)?;
        let text: String = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }
        Ok(text)
    }
}

impl Analyzer for GeminiAnalyzer {
    async fn analyze(&self, article: &Article) -> Result<Analysis, AnalysisError> {
        let reply = self.generate(build_prompt(article)).await?;
        parse_reply(&reply, article)
    }
}

pub fn build_prompt(article: &Article) -> String {
    let content: String = article.content.chars().take(PROMPT_CONTENT_CHARS).collect();
    format!(
        r#"Analyze this cybersecurity article and extract the following information in JSON format:

Article Title: {title}

Content:
{content}

Please extract:
1. Main topics/categories (array of strings, max {MAX_TOPICS})
2. Technical skills mentioned (array of strings, max {MAX_SKILLS})
3. Tools and technologies discussed (array of strings, max {MAX_TOOLS})
4. Security concepts explained (array of strings, max {MAX_CONCEPTS})
5. A brief 1-sentence summary
6. Estimated difficulty level (Beginner/Intermediate/Advanced)
7. Estimated read time in minutes (based on word count)

Return ONLY a valid JSON object with this structure:
{{
  "topics": ["topic1", "topic2"],
  "skills": ["skill1", "skill2"],
  "tools": ["tool1", "tool2"],
  "concepts": ["concept1", "concept2"],
  "summary": "Brief summary here",
  "difficulty": "Intermediate",
  "readTime": 8
}}"#,
        title = article.title,
    )
}

/// Parse a model reply, tolerating a surrounding markdown code fence.
pub fn parse_reply(reply: &str, article: &Article) -> Result<Analysis, AnalysisError> {
    let analysis: Analysis = serde_json::from_str(strip_code_fences(reply))?;
    Ok(analysis.normalized(article))
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn article(content: &str) -> Article {
        Article {
            id: "sha1".into(),
            title: "Kerberoasting Basics".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            category: "Security".into(),
            excerpt: String::new(),
            read_time_minutes: 4,
            content: content.into(),
            source_url: "https://github.com/u/r/blob/main/posts/k.md".into(),
        }
    }

    fn reply_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
    }

    const ANALYSIS_JSON: &str = r#"{
        "topics": ["Active Directory", "Kerberos", "Red Team", "Extra"],
        "skills": ["Enumeration"],
        "tools": ["Rubeus", "hashcat"],
        "concepts": ["Service tickets"],
        "summary": "How to request and crack service tickets.",
        "difficulty": "Advanced",
        "readTime": 7
    }"#;

    #[test]
    fn test_parse_plain_json() {
        let analysis = parse_reply(ANALYSIS_JSON, &article("body")).unwrap();
        assert_eq!(analysis.topics, vec!["Active Directory", "Kerberos", "Red Team"]);
        assert_eq!(analysis.tools, vec!["Rubeus", "hashcat"]);
        assert_eq!(analysis.difficulty, "Advanced");
        assert_eq!(analysis.read_time, 7);
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = format!("```json\n{}\n```", ANALYSIS_JSON);
        assert!(parse_reply(&fenced, &article("body")).is_ok());

        let bare_fence = format!("  ```\n{}\n```  ", ANALYSIS_JSON);
        assert!(parse_reply(&bare_fence, &article("body")).is_ok());
    }

    #[test]
    fn test_parse_fills_missing_fields() {
        let analysis = parse_reply(r#"{"summary": "Short."}"#, &article("body")).unwrap();
        assert!(analysis.topics.is_empty());
        assert_eq!(analysis.difficulty, "Intermediate");
        assert_eq!(analysis.read_time, 4);
    }

    #[test]
    fn test_parse_rejects_prose() {
        let err = parse_reply("Sure! Here is the analysis you asked for.", &article("body"));
        assert!(matches!(err, Err(AnalysisError::MalformedReply(_))));
    }

    #[test]
    fn test_fallback_shape() {
        let long = "word ".repeat(100);
        let fallback = Analysis::fallback(&article(&long));
        assert_eq!(fallback.topics, vec!["Security"]);
        assert!(fallback.skills.is_empty());
        assert_eq!(fallback.summary.chars().count(), 153);
        assert!(fallback.summary.ends_with("..."));
        assert_eq!(fallback.difficulty, "Intermediate");
        assert_eq!(fallback.read_time, 4);
    }

    #[test]
    fn test_prompt_truncates_content() {
        let prompt = build_prompt(&article(&"x".repeat(5000)));
        assert!(prompt.contains("Article Title: Kerberoasting Basics"));
        assert!(prompt.contains(&"x".repeat(4000)));
        assert!(!prompt.contains(&"x".repeat(4001)));
    }

    #[tokio::test]
    async fn test_gemini_request_and_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .and(header("x-goog-api-key", "gem-key"))
            .and(body_string_contains("Kerberoasting Basics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body(ANALYSIS_JSON)))
            .expect(1)
            .mount(&server)
            .await;

        let analyzer = GeminiAnalyzer::new(
            &server.uri(),
            "test-model",
            SecretString::from("gem-key"),
            Duration::from_secs(5),
        )
        .unwrap();
        let analysis = analyzer.analyze(&article("body")).await.unwrap();
        assert_eq!(analysis.summary, "How to request and crack service tickets.");
    }

    #[tokio::test]
    async fn test_gemini_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let analyzer = GeminiAnalyzer::new(
            &server.uri(),
            "test-model",
            SecretString::from("gem-key"),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = analyzer.analyze(&article("body")).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Transport(FetchError::HttpStatus(429))
        ));
    }

    #[tokio::test]
    async fn test_gemini_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&server)
            .await;

        let analyzer = GeminiAnalyzer::new(
            &server.uri(),
            "test-model",
            SecretString::from("gem-key"),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = analyzer.analyze(&article("body")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyResponse));
    }
}
