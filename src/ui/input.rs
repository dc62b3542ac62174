//! Keyboard handling for the TUI.
//!
//! Dispatches on the current view; the reader captures all keys while open.

use crate::app::{App, AppEvent, View};
use crate::blog::Article;
use crate::util::{atomic_write, open_in_browser};
use crossterm::event::{KeyCode, KeyModifiers};
use std::path::PathBuf;
use tokio::sync::mpsc;

use super::events::Sources;
use super::Action;

/// Where the share draft is meant to be pasted.
const SHARE_TARGET: &str = "https://www.linkedin.com/feed/";

pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    sources: &Sources,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Action::Quit;
    }

    match app.view {
        View::Reader => handle_reader_input(app, code, modifiers),
        View::Blog | View::Projects => handle_list_input(app, code, sources, event_tx),
    }
}

fn handle_list_input(
    app: &mut App,
    code: KeyCode,
    sources: &Sources,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Tab | KeyCode::BackTab => app.toggle_list_view(),
        KeyCode::Char('r') => {
            // Previous results stay on screen until the new cycle resolves
            sources.spawn_all(event_tx);
            app.set_status("Reloading from GitHub...");
        }
        KeyCode::Enter if app.view == View::Blog => {
            app.open_selected();
        }
        KeyCode::Char('o') if app.view == View::Blog => {
            let url = app.selected_article().map(|a| a.source_url.clone());
            if let Some(url) = url {
                open_link(app, &url);
            }
        }
        KeyCode::Enter | KeyCode::Char('o') => {
            let url = app.selected_project().map(|p| p.github.clone());
            if let Some(url) = url {
                open_link(app, &url);
            }
        }
        KeyCode::Char('d') if app.view == View::Projects => {
            let demo = app.selected_project().map(|p| p.demo.clone());
            match demo {
                Some(Some(demo)) => open_link(app, &demo),
                Some(None) => app.set_status("This project has no live demo"),
                None => {}
            }
        }
        KeyCode::Char('t') if app.view == View::Projects => {
            app.cycle_topic_filter();
            app.set_status(format!("Filter: {}", app.topic_filter.label()));
        }
        _ => {}
    }
    Action::Continue
}

fn handle_reader_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Action {
    let half_page = (app.reader_visible_lines / 2).max(1);
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b') => app.close_reader(),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(half_page)
        }
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(half_page)
        }
        KeyCode::PageDown | KeyCode::Char(' ') => app.scroll_down(app.reader_visible_lines.max(1)),
        KeyCode::PageUp => app.scroll_up(app.reader_visible_lines.max(1)),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),
        KeyCode::Char('n') | KeyCode::Right => {
            if !app.next_article() {
                app.set_status("Already at the last article");
            }
        }
        KeyCode::Char('p') | KeyCode::Left => {
            if !app.previous_article() {
                app.set_status("Already at the first article");
            }
        }
        KeyCode::Char('o') => {
            let url = app.reader_article().map(|a| a.source_url.clone());
            if let Some(url) = url {
                open_link(app, &url);
            }
        }
        KeyCode::Char('s') => {
            let saved = app.reader_article().map(save_share_draft);
            match saved {
                Some(Ok(path)) => {
                    app.set_status(format!("Share draft saved to {}", path.display()));
                    open_link(app, SHARE_TARGET);
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Failed to save share draft");
                    app.set_status(format!("Failed to save share draft: {}", e));
                }
                None => {}
            }
        }
        _ => {}
    }
    Action::Continue
}

fn open_link(app: &mut App, url: &str) {
    if let Err(e) = open_in_browser(url) {
        app.set_status(e.to_string());
    }
}

/// Write the article's share draft next to other temporary files.
fn save_share_draft(article: &Article) -> std::io::Result<PathBuf> {
    let short_id: String = article.id.chars().take(12).collect();
    let path = std::env::temp_dir().join(format!("folio-share-{}.md", short_id));
    atomic_write(&path, article.share_draft().as_bytes())?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::{parse_at, ArticleSource, Catalog};
    use crate::github::{BodyFailurePolicy, GitHubClient, PostsLocation};
    use crate::projects::ProjectFilter;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::time::Duration;

    fn sources() -> Sources {
        Sources {
            client: Arc::new(
                GitHubClient::new("http://127.0.0.1:9", None, Duration::from_secs(1)).unwrap(),
            ),
            location: PostsLocation {
                owner: "u".into(),
                repo: "r".into(),
                path: "posts".into(),
                branch: "main".into(),
                web_base: "https://github.com".into(),
            },
            policy: BodyFailurePolicy::FailBatch,
            username: "u".into(),
            project_filter: ProjectFilter::default(),
        }
    }

    fn app(n: usize) -> App {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let articles = (0..n)
            .map(|i| {
                let source = ArticleSource {
                    name: format!("p{}.md", i),
                    path: format!("posts/p{}.md", i),
                    content_hash: format!("hash{}", i),
                    download_url: format!("https://raw.example/p{}.md", i),
                    permalink: format!("https://github.com/u/r/blob/main/posts/p{}.md", i),
                };
                parse_at(&source, &format!("# P{}\n\n{}", i, "text\n\n".repeat(60)), today)
            })
            .collect();
        let mut app = App::new(5);
        app.apply_catalog(Ok(Catalog::build(articles)));
        app.reader_visible_lines = 10;
        app
    }

    fn press(app: &mut App, code: KeyCode) -> Action {
        let (tx, _rx) = mpsc::channel(4);
        handle_input(app, code, KeyModifiers::NONE, &sources(), &tx)
    }

    #[test]
    fn test_reader_key_flow() {
        let mut app = app(3);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view, View::Reader);
        assert_eq!(app.reader.open_index(), Some(0));

        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.reader.open_index(), Some(2));

        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.reader.open_index(), Some(1));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view, View::Blog);
        assert_eq!(app.selected_article, 1);
    }

    #[test]
    fn test_back_to_top_key() {
        let mut app = app(1);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::PageDown);
        assert!(app.reader.back_to_top_visible());

        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.scroll_offset, 0);
        assert!(!app.reader.back_to_top_visible());
    }

    #[test]
    fn test_quit_from_list_not_reader() {
        let mut app = app(1);
        press(&mut app, KeyCode::Enter);
        assert!(matches!(press(&mut app, KeyCode::Char('q')), Action::Continue));
        assert!(matches!(press(&mut app, KeyCode::Char('q')), Action::Quit));
    }

    #[test]
    fn test_tab_switches_lists() {
        let mut app = app(1);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.view, View::Projects);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.view, View::Blog);
    }

    #[test]
    fn test_share_draft_file() {
        let app = app(1);
        let article = app.catalog().unwrap().get(0).unwrap();
        let path = save_share_draft(article).unwrap();
        let draft = std::fs::read_to_string(&path).unwrap();
        assert!(draft.contains("Just read: \"P0\""));
        std::fs::remove_file(path).ok();
    }
}
