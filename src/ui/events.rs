//! Background fetches and their completion events.
//!
//! Each reload spawns an independent task that sends one `AppEvent` when it
//! resolves. Nothing is cancelled: whichever result arrives last is what the
//! app shows.

use crate::app::{App, AppEvent};
use crate::blog::load_catalog;
use crate::github::{BodyFailurePolicy, GitHubClient, PostsLocation};
use crate::projects::{load_showcase, ProjectFilter};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Everything a background fetch needs, cheap to clone into tasks.
#[derive(Clone)]
pub struct Sources {
    pub client: Arc<GitHubClient>,
    pub location: PostsLocation,
    pub policy: BodyFailurePolicy,
    pub username: String,
    pub project_filter: ProjectFilter,
}

impl Sources {
    /// Start a fetch cycle for the article catalog.
    pub fn spawn_articles(&self, event_tx: &mpsc::Sender<AppEvent>) {
        let sources = self.clone();
        let tx = event_tx.clone();
        tokio::spawn(async move {
            let result = catch_task_panic(async {
                load_catalog(&sources.client, &sources.location, sources.policy).await
            })
            .await
            .and_then(|loaded| loaded.map_err(|e| e.to_string()));

            if let Err(e) = tx.send(AppEvent::CatalogLoaded(result)).await {
                tracing::warn!(error = %e, "Failed to send catalog (receiver dropped)");
            }
        });
    }

    /// Start a fetch of the repository showcase.
    pub fn spawn_projects(&self, event_tx: &mpsc::Sender<AppEvent>) {
        let sources = self.clone();
        let tx = event_tx.clone();
        tokio::spawn(async move {
            let result = catch_task_panic(async {
                load_showcase(&sources.client, &sources.username, &sources.project_filter).await
            })
            .await
            .and_then(|loaded| loaded.map_err(|e| e.to_string()));

            if let Err(e) = tx.send(AppEvent::ProjectsLoaded(result)).await {
                tracing::warn!(error = %e, "Failed to send projects (receiver dropped)");
            }
        });
    }

    pub fn spawn_all(&self, event_tx: &mpsc::Sender<AppEvent>) {
        self.spawn_articles(event_tx);
        self.spawn_projects(event_tx);
    }
}

/// Apply a background result to the app.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::CatalogLoaded(result) => app.apply_catalog(result),
        AppEvent::ProjectsLoaded(result) => app.apply_projects(result),
    }
}

/// Run `future`, turning a panic into an error message instead of losing the
/// task's completion event.
async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "background task panicked".to_string()
            }
        })
}
