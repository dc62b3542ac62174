use crate::blog::{self, Article, Catalog};
use crate::projects::{self, Project, ProjectShowcase, TopicFilter};
use crate::reader::{ReaderEvent, ReaderState, ScrollSample};
use crate::ui::reader::render_markdown;
use crate::util::strip_control_chars;
use ratatui::text::Line;
use ratatui::widgets::ListState;
use std::borrow::Cow;
use tokio::time::Instant;
use unicode_width::UnicodeWidthStr;

/// Title, metadata and blank line drawn above the article body.
pub const READER_HEADER_LINES: usize = 3;

/// Ratatui scroll offsets are u16.
const MAX_SCROLL: usize = u16::MAX as usize;

// ============================================================================
// View and Load State
// ============================================================================

/// Current view mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Blog,     // Article list
    Projects, // Repository showcase
    Reader,   // Full-screen article reader
}

/// Progress of one background fetch cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Ready(T),
    /// Fixed user-facing message; the cause is logged where the load failed.
    Failed(&'static str),
}

impl<T> LoadState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Results from background tasks, delivered over the app's event channel.
#[derive(Debug)]
pub enum AppEvent {
    CatalogLoaded(Result<Catalog, String>),
    ProjectsLoaded(Result<ProjectShowcase, String>),
}

// ============================================================================
// App State
// ============================================================================

pub struct App {
    pub view: View,
    pub articles: LoadState<Catalog>,
    pub projects: LoadState<ProjectShowcase>,
    pub selected_article: usize,
    pub selected_project: usize,
    pub topic_filter: TopicFilter,
    /// Scroll offsets of the two lists, kept across frames.
    pub article_list: ListState,
    pub project_list: ListState,

    pub reader: ReaderState,
    /// Rendered body of the open article.
    pub reader_lines: Vec<Line<'static>>,
    pub scroll_offset: usize,
    /// Viewport size from the last render (inside borders).
    pub reader_visible_lines: usize,
    pub reader_viewport_width: usize,

    pub needs_redraw: bool,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
}

impl App {
    /// `back_to_top_rows` is the scroll distance, in terminal rows, past which
    /// the reader offers a jump back to the top.
    pub fn new(back_to_top_rows: u16) -> Self {
        Self {
            view: View::Blog,
            articles: LoadState::Loading,
            projects: LoadState::Loading,
            selected_article: 0,
            selected_project: 0,
            topic_filter: TopicFilter::All,
            article_list: ListState::default(),
            project_list: ListState::default(),
            reader: ReaderState::with_back_to_top_threshold(f64::from(back_to_top_rows)),
            reader_lines: Vec::new(),
            scroll_offset: 0,
            reader_visible_lines: 0,
            reader_viewport_width: 80,
            needs_redraw: true,
            status_message: None,
        }
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.articles.ready()
    }

    pub fn article_count(&self) -> usize {
        self.catalog().map_or(0, Catalog::len)
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.catalog()?.get(self.selected_article)
    }

    pub fn visible_projects(&self) -> Vec<&Project> {
        self.projects
            .ready()
            .map(|showcase| showcase.filtered(&self.topic_filter))
            .unwrap_or_default()
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.visible_projects().get(self.selected_project).copied()
    }

    /// Article shown by the reader, if it is open.
    pub fn reader_article(&self) -> Option<&Article> {
        self.catalog()?.get(self.reader.open_index()?)
    }

    // ------------------------------------------------------------------------
    // Fetch results
    // ------------------------------------------------------------------------

    /// Install a freshly fetched catalog, replacing whatever was shown.
    ///
    /// Indices into the old catalog are meaningless in the new one, so an open
    /// reader is closed.
    pub fn apply_catalog(&mut self, result: Result<Catalog, String>) {
        if self.reader.is_open() {
            self.close_reader();
        }
        match result {
            Ok(catalog) => {
                self.set_status(format!("Loaded {} articles", catalog.len()));
                self.articles = LoadState::Ready(catalog);
                self.article_list = ListState::default();
                self.selected_article = self
                    .selected_article
                    .min(self.article_count().saturating_sub(1));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Article fetch cycle failed");
                self.articles = LoadState::Failed(blog::LOAD_ERROR_MESSAGE);
                self.selected_article = 0;
            }
        }
    }

    pub fn apply_projects(&mut self, result: Result<ProjectShowcase, String>) {
        match result {
            Ok(showcase) => {
                if let TopicFilter::Topic(topic) = &self.topic_filter {
                    if !showcase.topics().contains(topic) {
                        self.topic_filter = TopicFilter::All;
                    }
                }
                self.projects = LoadState::Ready(showcase);
                self.clamp_project_selection();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Repository listing failed");
                self.projects = LoadState::Failed(projects::LOAD_ERROR_MESSAGE);
                self.selected_project = 0;
            }
        }
    }

    /// Advance the topic filter (All, then each topic, then All again).
    pub fn cycle_topic_filter(&mut self) {
        if let Some(showcase) = self.projects.ready() {
            self.topic_filter = showcase.next_filter(&self.topic_filter);
            self.selected_project = 0;
        }
    }

    fn clamp_project_selection(&mut self) {
        let len = self.visible_projects().len();
        self.selected_project = self.selected_project.min(len.saturating_sub(1));
    }

    // ------------------------------------------------------------------------
    // List navigation
    // ------------------------------------------------------------------------

    pub fn nav_up(&mut self) {
        match self.view {
            View::Blog => self.selected_article = self.selected_article.saturating_sub(1),
            View::Projects => self.selected_project = self.selected_project.saturating_sub(1),
            View::Reader => {}
        }
    }

    pub fn nav_down(&mut self) {
        match self.view {
            View::Blog => {
                let max_index = self.article_count().saturating_sub(1);
                self.selected_article = self.selected_article.saturating_add(1).min(max_index);
            }
            View::Projects => {
                let max_index = self.visible_projects().len().saturating_sub(1);
                self.selected_project = self.selected_project.saturating_add(1).min(max_index);
            }
            View::Reader => {}
        }
    }

    pub fn toggle_list_view(&mut self) {
        self.view = match self.view {
            View::Blog => View::Projects,
            View::Projects => View::Blog,
            View::Reader => View::Reader,
        };
    }

    // ------------------------------------------------------------------------
    // Reader
    // ------------------------------------------------------------------------

    /// Open the reader on the selected article.
    pub fn open_selected(&mut self) -> bool {
        let len = self.article_count();
        if !self.reader.apply(ReaderEvent::Open(self.selected_article), len) {
            return false;
        }
        self.enter_reader();
        true
    }

    pub fn next_article(&mut self) -> bool {
        let moved = self.reader.apply(ReaderEvent::Next, self.article_count());
        if moved {
            self.enter_reader();
        }
        moved
    }

    pub fn previous_article(&mut self) -> bool {
        let moved = self.reader.apply(ReaderEvent::Previous, self.article_count());
        if moved {
            self.enter_reader();
        }
        moved
    }

    /// Close the reader and return to the list with the last-read article
    /// selected.
    pub fn close_reader(&mut self) {
        if let Some(index) = self.reader.open_index() {
            self.selected_article = index;
        }
        self.reader.apply(ReaderEvent::Close, self.article_count());
        self.view = View::Blog;
        self.reader_lines.clear();
        self.scroll_offset = 0;
    }

    fn enter_reader(&mut self) {
        self.reader_lines = self
            .reader_article()
            .map(|article| render_markdown(&strip_control_chars(&article.content)))
            .unwrap_or_default();
        self.view = View::Reader;
        self.scroll_offset = 0;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
        self.sync_scroll();
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
        self.sync_scroll();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = MAX_SCROLL;
        self.sync_scroll();
    }

    pub fn scroll_to_top(&mut self) {
        let sample = self.reader.scroll_to_top(
            self.reader_content_lines() as f64,
            self.reader_visible_lines as f64,
        );
        self.scroll_offset = sample.offset as usize;
    }

    /// Clamp the offset to the content and report it to the reader state.
    pub fn sync_scroll(&mut self) {
        let content_lines = self.reader_content_lines();
        let max_scroll = content_lines.saturating_sub(self.reader_visible_lines);
        self.scroll_offset = self.scroll_offset.min(max_scroll).min(MAX_SCROLL);
        let len = self.article_count();
        let sample = ScrollSample {
            offset: self.scroll_offset as f64,
            content_height: content_lines as f64,
            viewport_height: self.reader_visible_lines as f64,
        };
        self.reader.apply(ReaderEvent::Scroll(sample), len);
    }

    /// Display lines of the open article at the current viewport width,
    /// counting wrapped lines and the header.
    pub fn reader_content_lines(&self) -> usize {
        let width = self.reader_viewport_width.max(1);
        let body: usize = self
            .reader_lines
            .iter()
            .map(|line| {
                let line_width: usize = line.spans.iter().map(|s| s.content.width()).sum();
                line_width.max(1).div_ceil(width)
            })
            .sum();
        READER_HEADER_LINES + body
    }

    // ------------------------------------------------------------------------
    // Status bar
    // ------------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::{parse_at, ArticleSource};
    use crate::github::RepoEntry;
    use crate::projects::{select_projects, ProjectFilter};
    use chrono::NaiveDate;
    use tokio::time::{self, Duration};

    fn catalog(n: usize) -> Catalog {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let articles = (0..n)
            .map(|i| {
                let source = ArticleSource {
                    name: format!("post-{}.md", i),
                    path: format!("posts/post-{}.md", i),
                    content_hash: format!("sha{}", i),
                    download_url: format!("https://raw.example/post-{}.md", i),
                    permalink: format!("https://github.com/u/r/blob/main/posts/post-{}.md", i),
                };
                let body = format!(
                    "# Post {i}\nDate: 2024-01-{:02}\n\n{}",
                    i + 1,
                    "A line of prose.\n\n".repeat(40)
                );
                parse_at(&source, &body, today)
            })
            .collect();
        Catalog::build(articles)
    }

    fn loaded_app(n: usize) -> App {
        let mut app = App::new(15);
        app.apply_catalog(Ok(catalog(n)));
        app.reader_visible_lines = 20;
        app
    }

    fn showcase() -> ProjectShowcase {
        let repo = |name: &str, topics: &[&str]| RepoEntry {
            id: name.len() as u64,
            name: name.to_string(),
            description: None,
            html_url: format!("https://github.com/u/{}", name),
            homepage: None,
            topics: topics.iter().map(|t| t.to_string()).collect(),
            stargazers_count: 0,
            forks_count: 0,
            language: None,
            fork: false,
        };
        let filter = ProjectFilter {
            topics: Vec::new(),
            ..ProjectFilter::default()
        };
        ProjectShowcase::new(select_projects(
            vec![repo("a", &["rust"]), repo("b", &["web"]), repo("c", &["rust"])],
            &filter,
        ))
    }

    #[test]
    fn test_open_and_navigate() {
        let mut app = loaded_app(3);
        app.selected_article = 1;
        assert!(app.open_selected());
        assert_eq!(app.view, View::Reader);
        assert_eq!(app.reader.open_index(), Some(1));
        assert!(!app.reader_lines.is_empty());

        assert!(app.next_article());
        assert_eq!(app.reader.open_index(), Some(2));
        assert!(!app.next_article());
        assert!(app.previous_article());
        assert!(app.previous_article());
        assert!(!app.previous_article());
        assert_eq!(app.reader.open_index(), Some(0));
    }

    #[test]
    fn test_open_without_catalog_is_noop() {
        let mut app = App::new(15);
        assert!(!app.open_selected());
        assert_eq!(app.view, View::Blog);
    }

    #[test]
    fn test_navigation_resets_scroll() {
        let mut app = loaded_app(2);
        app.open_selected();
        app.scroll_down(30);
        assert!(app.scroll_offset > 0);
        assert!(app.reader.back_to_top_visible());
        assert!(app.reader.scroll_progress() > 0.0);

        app.next_article();
        assert_eq!(app.scroll_offset, 0);
        assert!(!app.reader.back_to_top_visible());
        assert_eq!(app.reader.scroll_progress(), 0.0);
    }

    #[test]
    fn test_scroll_clamped_and_progress_full_at_bottom() {
        let mut app = loaded_app(1);
        app.open_selected();
        app.scroll_to_bottom();
        let max = app.reader_content_lines() - app.reader_visible_lines;
        assert_eq!(app.scroll_offset, max);
        assert_eq!(app.reader.scroll_progress(), 100.0);

        app.scroll_to_top();
        assert_eq!(app.scroll_offset, 0);
        assert!(!app.reader.back_to_top_visible());
    }

    #[test]
    fn test_close_returns_to_list_selection() {
        let mut app = loaded_app(3);
        app.open_selected();
        app.next_article();
        app.close_reader();
        assert_eq!(app.view, View::Blog);
        assert_eq!(app.selected_article, 1);
        assert!(!app.reader.is_open());
    }

    #[test]
    fn test_refetch_replaces_catalog_and_closes_reader() {
        let mut app = loaded_app(3);
        app.selected_article = 2;
        app.open_selected();

        app.apply_catalog(Ok(catalog(1)));
        assert!(!app.reader.is_open());
        assert_eq!(app.view, View::Blog);
        assert_eq!(app.article_count(), 1);
        assert_eq!(app.selected_article, 0);
    }

    #[test]
    fn test_failed_fetch_shows_fixed_message() {
        let mut app = loaded_app(2);
        app.apply_catalog(Err("HTTP error: status 404".into()));
        assert_eq!(app.articles, LoadState::Failed("Unable to load articles from GitHub"));
        assert_eq!(app.article_count(), 0);
    }

    #[test]
    fn test_topic_filter_cycles_and_resets_selection() {
        let mut app = App::new(15);
        app.view = View::Projects;
        app.apply_projects(Ok(showcase()));
        assert_eq!(app.visible_projects().len(), 3);

        app.nav_down();
        app.nav_down();
        app.cycle_topic_filter();
        assert_eq!(app.topic_filter, TopicFilter::Topic("rust".into()));
        assert_eq!(app.selected_project, 0);
        assert_eq!(app.visible_projects().len(), 2);

        app.cycle_topic_filter();
        app.cycle_topic_filter();
        assert_eq!(app.topic_filter, TopicFilter::All);
    }

    #[test]
    fn test_projects_failure() {
        let mut app = App::new(15);
        app.apply_projects(Err("timeout".into()));
        assert_eq!(app.projects, LoadState::Failed("Unable to load GitHub projects"));
        assert!(app.selected_project().is_none());
    }

    #[test]
    fn test_nav_clamps_to_list() {
        let mut app = loaded_app(2);
        app.nav_up();
        assert_eq!(app.selected_article, 0);
        app.nav_down();
        app.nav_down();
        assert_eq!(app.selected_article, 1);
    }

    #[tokio::test]
    async fn test_status_expires_after_3_seconds() {
        time::pause();
        let mut app = App::new(15);
        app.set_status("Loaded");
        assert!(!app.clear_expired_status());
        time::advance(Duration::from_secs(3)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }
}
