use std::{sync::Arc, time::Duration};

use hlc_shared::{
    lifecycle::{ContentEvent, Lifecycle},
    sync::{ContentSync, Loaded, Source},
    Article,
};
use tokio::{
    sync::{broadcast::error::TryRecvError, broadcast::Receiver, Mutex},
    time::Instant,
};

/// How long a list fetched from the remote store is served before the remote
/// is asked again. Local lists only change through lifecycle events.
pub const REMOTE_LIST_TTL: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppState {
    sync: ContentSync,
    /// Cached published list plus the event feed that invalidates it
    published: Arc<Mutex<PublishedCache>>,
}

struct PublishedCache {
    events: Receiver<ContentEvent>,
    articles: Option<CachedList>,
}

struct CachedList {
    loaded: Loaded<Vec<Article>>,
    fetched_at: Instant,
}

impl CachedList {
    fn is_fresh(&self) -> bool {
        self.loaded.source != Source::Remote || self.fetched_at.elapsed() < REMOTE_LIST_TTL
    }
}

impl PublishedCache {
    /// Drops the cached list if any transition since the last read changed
    /// what readers can see.
    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) if event.changes_public_visibility() => {
                    tracing::debug!(?event, "published cache invalidated");
                    self.articles = None;
                },
                Ok(_) => {},
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "content events lagged, dropping published cache");
                    self.articles = None;
                },
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}

impl AppState {
    pub async fn new(sync: ContentSync) -> Self {
        let events = sync.lifecycle().lock().await.subscribe();
        Self {
            sync,
            published: Arc::new(Mutex::new(PublishedCache {
                events,
                articles: None,
            })),
        }
    }

    pub fn sync(&self) -> &ContentSync {
        &self.sync
    }

    pub fn lifecycle(&self) -> &Arc<Mutex<Lifecycle>> {
        self.sync.lifecycle()
    }

    /// Published articles, served from cache while no visibility-changing
    /// event arrived. Remote lists expire after [`REMOTE_LIST_TTL`]; fallback
    /// results are not cached so the remote store is retried on the next
    /// request.
    pub async fn published_articles(&self) -> Loaded<Vec<Article>> {
        let mut cache = self.published.lock().await;
        cache.drain_events();
        if let Some(cached) = cache.articles.as_ref().filter(|cached| cached.is_fresh()) {
            return cached.loaded.clone();
        }

        let loaded = self.sync.load_published().await;
        // Mirroring emits no event, but drain anything raised meanwhile.
        cache.drain_events();
        cache.articles = (loaded.source != Source::Fallback).then(|| CachedList {
            loaded: loaded.clone(),
            fetched_at: Instant::now(),
        });
        tracing::info!(count = loaded.value.len(), source = ?loaded.source, "published list loaded");
        loaded
    }
}

#[cfg(test)]
mod tests {
    use hlc_shared::{
        content_store::ContentStore, local_store::LocalStore, remote::InMemoryRemote, ArticleStatus,
    };

    use super::*;

    fn remote_article(id: &str) -> Article {
        let mut article = Article::new(format!("Remote {id}"), "<p>remote</p>");
        article.id = id.to_string();
        article.slug = id.to_string();
        article.status = ArticleStatus::Published;
        article
    }

    #[tokio::test(start_paused = true)]
    async fn remote_list_is_refetched_once_stale() {
        let remote = Arc::new(InMemoryRemote::with_articles(vec![remote_article("r1")]));
        let lifecycle = Lifecycle::new(ContentStore::load(LocalStore::in_memory()).expect("store"));
        let state = AppState::new(ContentSync::new(
            Arc::new(Mutex::new(lifecycle)),
            Some(remote.clone()),
        ))
        .await;

        assert_eq!(state.published_articles().await.value.len(), 1);
        remote.upsert(remote_article("r2"));
        assert_eq!(state.published_articles().await.value.len(), 1);

        tokio::time::advance(REMOTE_LIST_TTL + Duration::from_secs(1)).await;
        let refreshed = state.published_articles().await;
        assert_eq!(refreshed.source, Source::Remote);
        assert_eq!(refreshed.value.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn local_list_waits_for_events_not_time() {
        let lifecycle = Lifecycle::new(ContentStore::load(LocalStore::in_memory()).expect("store"));
        let state = AppState::new(ContentSync::new(Arc::new(Mutex::new(lifecycle)), None)).await;
        assert!(state.published_articles().await.value.is_empty());

        tokio::time::advance(REMOTE_LIST_TTL * 4).await;
        state
            .lifecycle()
            .lock()
            .await
            .create_published(Article::new("Fresh", "<p>x</p>"))
            .expect("publish");
        assert_eq!(state.published_articles().await.value.len(), 1);
    }
}
