//! Project showcase built from the user's public repositories.

use crate::github::{FetchError, GitHubClient, RepoEntry};
use std::collections::BTreeSet;

/// Message shown in place of the project list when the listing fails.
pub const LOAD_ERROR_MESSAGE: &str = "Unable to load GitHub projects";
const NO_DESCRIPTION: &str = "No description available";

/// Which repositories make it into the showcase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFilter {
    /// Keep only repositories tagged with at least one of these topics.
    /// Empty disables the check.
    pub topics: Vec<String>,
    /// Keep only repositories with these exact names. Empty disables the check.
    pub whitelist: Vec<String>,
    pub limit: usize,
}

impl Default for ProjectFilter {
    fn default() -> Self {
        Self {
            topics: vec!["portfolio".to_string()],
            whitelist: Vec::new(),
            limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub tech: Vec<String>,
    pub github: String,
    pub demo: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub topics: Vec<String>,
}

impl Project {
    fn from_repo(repo: RepoEntry) -> Self {
        let tech = if !repo.topics.is_empty() {
            repo.topics.clone()
        } else if let Some(language) = &repo.language {
            vec![language.clone()]
        } else {
            vec!["Code".to_string()]
        };

        Self {
            id: repo.id,
            title: title_case(&repo.name),
            description: repo
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            tech,
            github: repo.html_url,
            demo: repo.homepage.filter(|h| !h.trim().is_empty()),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            topics: repo.topics,
        }
    }
}

/// "secure-api-gateway" -> "Secure Api Gateway"
fn title_case(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Topic selection in the showcase.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TopicFilter {
    #[default]
    All,
    Topic(String),
}

impl TopicFilter {
    pub fn label(&self) -> &str {
        match self {
            TopicFilter::All => "All",
            TopicFilter::Topic(t) => t,
        }
    }
}

/// Selected projects plus the sorted set of their topics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectShowcase {
    projects: Vec<Project>,
    topics: Vec<String>,
}

impl ProjectShowcase {
    pub fn new(projects: Vec<Project>) -> Self {
        let topics: BTreeSet<String> = projects
            .iter()
            .flat_map(|p| p.topics.iter().cloned())
            .collect();
        Self {
            projects,
            topics: topics.into_iter().collect(),
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn filtered(&self, filter: &TopicFilter) -> Vec<&Project> {
        match filter {
            TopicFilter::All => self.projects.iter().collect(),
            TopicFilter::Topic(topic) => self
                .projects
                .iter()
                .filter(|p| p.topics.contains(topic))
                .collect(),
        }
    }

    pub fn count(&self, filter: &TopicFilter) -> usize {
        self.filtered(filter).len()
    }

    /// The filter after `current` in the order All, topic1, topic2, ..., All.
    pub fn next_filter(&self, current: &TopicFilter) -> TopicFilter {
        let next_index = match current {
            TopicFilter::All => 0,
            TopicFilter::Topic(t) => match self.topics.iter().position(|x| x == t) {
                Some(i) => i + 1,
                None => self.topics.len(),
            },
        };
        self.topics
            .get(next_index)
            .map(|t| TopicFilter::Topic(t.clone()))
            .unwrap_or(TopicFilter::All)
    }
}

/// Filter, cap and format repositories into projects.
///
/// Forks and repositories whose name contains "config" are always dropped;
/// the topic allow-list and name whitelist only apply when non-empty.
/// Input order (most recently updated first) is kept.
pub fn select_projects(repos: Vec<RepoEntry>, filter: &ProjectFilter) -> Vec<Project> {
    repos
        .into_iter()
        .filter(|r| !r.fork)
        .filter(|r| !r.name.contains("config"))
        .filter(|r| filter.topics.is_empty() || r.topics.iter().any(|t| filter.topics.contains(t)))
        .filter(|r| filter.whitelist.is_empty() || filter.whitelist.contains(&r.name))
        .take(filter.limit)
        .map(Project::from_repo)
        .collect()
}

pub async fn load_showcase(
    client: &GitHubClient,
    username: &str,
    filter: &ProjectFilter,
) -> Result<ProjectShowcase, FetchError> {
    let repos = client.list_user_repos(username).await?;
    let total = repos.len();
    let showcase = ProjectShowcase::new(select_projects(repos, filter));
    tracing::info!(
        repositories = total,
        projects = showcase.len(),
        topics = showcase.topics().len(),
        "Project showcase loaded"
    );
    Ok(showcase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repo(name: &str, topics: &[&str]) -> RepoEntry {
        RepoEntry {
            id: name.len() as u64,
            name: name.to_string(),
            description: Some(format!("{} description", name)),
            html_url: format!("https://github.com/u/{}", name),
            homepage: None,
            topics: topics.iter().map(|t| t.to_string()).collect(),
            stargazers_count: 1,
            forks_count: 0,
            language: None,
            fork: false,
        }
    }

    fn no_topic_filter() -> ProjectFilter {
        ProjectFilter {
            topics: Vec::new(),
            whitelist: Vec::new(),
            limit: 10,
        }
    }

    #[test]
    fn test_excludes_forks_and_config() {
        let mut forked = repo("forked", &["portfolio"]);
        forked.fork = true;
        let repos = vec![
            forked,
            repo("dotconfig", &["portfolio"]),
            repo("scanner", &["portfolio"]),
        ];
        let projects = select_projects(repos, &ProjectFilter::default());
        let names: Vec<&str> = projects.iter().map(|p| p.github.as_str()).collect();
        assert_eq!(names, vec!["https://github.com/u/scanner"]);
    }

    #[test]
    fn test_topic_allow_list() {
        let repos = vec![repo("a", &["portfolio", "rust"]), repo("b", &["misc"])];
        let projects = select_projects(repos.clone(), &ProjectFilter::default());
        assert_eq!(projects.len(), 1);

        let all = select_projects(repos, &no_topic_filter());
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_whitelist() {
        let filter = ProjectFilter {
            whitelist: vec!["b".to_string()],
            ..no_topic_filter()
        };
        let projects = select_projects(vec![repo("a", &[]), repo("b", &[])], &filter);
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].title, "B");
    }

    #[test]
    fn test_capped_at_limit() {
        let repos: Vec<RepoEntry> = (0..15).map(|i| repo(&format!("r{}", i), &[])).collect();
        let projects = select_projects(repos, &no_topic_filter());
        assert_eq!(projects.len(), 10);
        assert_eq!(projects[0].title, "R0");
    }

    #[test]
    fn test_project_formatting() {
        let mut r = repo("secure-api-gateway", &[]);
        r.description = None;
        r.language = Some("Go".into());
        r.homepage = Some(String::new());
        let project = Project::from_repo(r);
        assert_eq!(project.title, "Secure Api Gateway");
        assert_eq!(project.description, NO_DESCRIPTION);
        assert_eq!(project.tech, vec!["Go".to_string()]);
        assert_eq!(project.demo, None);

        let bare = Project::from_repo(repo("x", &[]));
        assert_eq!(bare.tech, vec!["Code".to_string()]);

        let tagged = Project::from_repo(repo("x", &["web", "rust"]));
        assert_eq!(tagged.tech, vec!["web".to_string(), "rust".to_string()]);
    }

    #[test]
    fn test_showcase_topics_and_filtering() {
        let projects = select_projects(
            vec![
                repo("a", &["rust", "cli"]),
                repo("b", &["web"]),
                repo("c", &["rust"]),
            ],
            &no_topic_filter(),
        );
        let showcase = ProjectShowcase::new(projects);
        assert_eq!(showcase.topics(), &["cli", "rust", "web"]);
        assert_eq!(showcase.count(&TopicFilter::All), 3);
        assert_eq!(showcase.count(&TopicFilter::Topic("rust".into())), 2);
        assert_eq!(showcase.count(&TopicFilter::Topic("nope".into())), 0);
    }

    #[test]
    fn test_next_filter_cycles() {
        let showcase = ProjectShowcase::new(select_projects(
            vec![repo("a", &["rust", "cli"])],
            &no_topic_filter(),
        ));
        let f1 = showcase.next_filter(&TopicFilter::All);
        assert_eq!(f1, TopicFilter::Topic("cli".into()));
        let f2 = showcase.next_filter(&f1);
        assert_eq!(f2, TopicFilter::Topic("rust".into()));
        assert_eq!(showcase.next_filter(&f2), TopicFilter::All);
        assert_eq!(
            showcase.next_filter(&TopicFilter::Topic("gone".into())),
            TopicFilter::All
        );

        let empty = ProjectShowcase::default();
        assert_eq!(empty.next_filter(&TopicFilter::All), TopicFilter::All);
    }
}
