//! Remote-first reads that fall back to the local last-synced copy.
//!
//! A remote failure never surfaces as an error to readers: they get the local
//! Published partition together with a warning instead.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    comments::{NewComment, VoteKind},
    lifecycle::Lifecycle,
    remote::RemoteContentStore,
    Article, ArticleStatus, Category, Comment, ContentError, ContentResult,
};

/// Where a read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Fresh from the remote store.
    Remote,
    /// No remote store is configured; the local store is authoritative.
    Local,
    /// The remote store failed; this is the last-synced local copy.
    Fallback,
}

/// A read result plus its provenance.
#[derive(Debug, Clone, Serialize)]
pub struct Loaded<T> {
    /// The data that was read.
    pub value: T,
    /// Where it came from.
    pub source: Source,
    /// Non-blocking notice for the reader when the remote store failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<T> Loaded<T> {
    fn local(value: T) -> Self {
        Self {
            value,
            source: Source::Local,
            warning: None,
        }
    }

    fn fallback(value: T, warning: String) -> Self {
        Self {
            value,
            source: Source::Fallback,
            warning: Some(warning),
        }
    }

    fn remote(value: T) -> Self {
        Self {
            value,
            source: Source::Remote,
            warning: None,
        }
    }
}

/// Glue between the remote client and the shared lifecycle.
#[derive(Clone)]
pub struct ContentSync {
    lifecycle: Arc<Mutex<Lifecycle>>,
    remote: Option<Arc<dyn RemoteContentStore>>,
}

impl ContentSync {
    /// Sync over a shared lifecycle; `remote` is `None` for local-only setups.
    pub fn new(lifecycle: Arc<Mutex<Lifecycle>>, remote: Option<Arc<dyn RemoteContentStore>>) -> Self {
        Self { lifecycle, remote }
    }

    /// Shared lifecycle handle.
    pub fn lifecycle(&self) -> &Arc<Mutex<Lifecycle>> {
        &self.lifecycle
    }

    /// Configured remote store, if any.
    pub fn remote(&self) -> Option<&Arc<dyn RemoteContentStore>> {
        self.remote.as_ref()
    }

    async fn local_published(&self) -> Vec<Article> {
        self.lifecycle
            .lock()
            .await
            .store()
            .partition(ArticleStatus::Published)
            .to_vec()
    }

    /// Whether `id` is held locally as Draft or Scheduled, which hides its
    /// remote copy from readers.
    async fn held_back(&self, id: &str) -> bool {
        self.lifecycle.lock().await.held_back_ids().contains(id)
    }

    /// Every published article. Remote results are mirrored into the local
    /// Published partition before being returned.
    pub async fn load_published(&self) -> Loaded<Vec<Article>> {
        let Some(remote) = &self.remote else {
            return Loaded::local(self.local_published().await);
        };

        // The lock is not held across the remote call.
        match remote.fetch_all().await {
            Ok(articles) => {
                let mut lifecycle = self.lifecycle.lock().await;
                if let Err(err) = lifecycle.mirror_remote(articles) {
                    tracing::warn!("failed to mirror remote articles locally: {err}");
                }
                Loaded::remote(lifecycle.store().partition(ArticleStatus::Published).to_vec())
            },
            Err(err) => {
                tracing::warn!("remote fetch failed, serving local copy: {err}");
                Loaded::fallback(self.local_published().await, fallback_warning())
            },
        }
    }

    /// Published article by slug; locally published articles the remote
    /// store has not seen yet are found too.
    pub async fn load_by_slug(&self, slug: &str) -> Loaded<Option<Article>> {
        let local = || async {
            self.lifecycle
                .lock()
                .await
                .store()
                .published_by_slug(slug)
                .cloned()
        };
        let Some(remote) = &self.remote else {
            return Loaded::local(local().await);
        };

        match remote.fetch_by_slug(slug).await {
            Ok(Some(article)) => {
                if self.held_back(&article.id).await {
                    Loaded::remote(local().await)
                } else {
                    Loaded::remote(Some(article))
                }
            },
            Ok(None) => Loaded::remote(local().await),
            Err(err) => {
                tracing::warn!(slug, "remote fetch by slug failed, serving local copy: {err}");
                Loaded::fallback(local().await, fallback_warning())
            },
        }
    }

    /// Published articles of one section, matched case-insensitively.
    pub async fn load_by_category(&self, category: &str) -> Loaded<Vec<Article>> {
        let wanted = Category::parse(category);
        let filter_local = |articles: Vec<Article>| -> Vec<Article> {
            articles
                .into_iter()
                .filter(|article| Some(article.category) == wanted)
                .collect()
        };
        let Some(remote) = &self.remote else {
            return Loaded::local(filter_local(self.local_published().await));
        };

        match remote.fetch_by_category(category).await {
            Ok(articles) => {
                let held_back = self.lifecycle.lock().await.held_back_ids();
                Loaded::remote(
                    articles
                        .into_iter()
                        .filter(|article| !held_back.contains(&article.id))
                        .collect(),
                )
            },
            Err(err) => {
                tracing::warn!(category, "remote fetch by category failed, serving local copy: {err}");
                Loaded::fallback(filter_local(self.local_published().await), fallback_warning())
            },
        }
    }

    /// Validates a reader comment, appends it remotely when a remote store is
    /// configured, then records it locally. Invalid input and articles held
    /// back as Draft or Scheduled never reach the network.
    pub async fn submit_comment(&self, article_id: &str, input: NewComment) -> ContentResult<Comment> {
        let comment = input.validate(Utc::now())?;
        if self.held_back(article_id).await {
            return Err(ContentError::NotFound {
                what: "article",
                key: article_id.to_string(),
            });
        }
        if let Some(remote) = &self.remote {
            remote.append_comment(article_id, &comment).await?;
        }

        let mut lifecycle = self.lifecycle.lock().await;
        match lifecycle.apply_comment(article_id, comment.clone()) {
            Ok(_) => Ok(comment),
            // The remote copy is authoritative; the local mirror catches up on
            // the next sync.
            Err(ContentError::NotFound { .. }) if self.remote.is_some() => {
                tracing::warn!(article_id, "comment stored remotely but article not mirrored locally");
                Ok(comment)
            },
            Err(err) => Err(err),
        }
    }

    /// Raises a comment counter on a published article by one and returns the
    /// new value. The value is computed from the local copy; concurrent votes
    /// may be lost.
    pub async fn vote(&self, article_id: &str, comment_id: &str, kind: VoteKind) -> ContentResult<u32> {
        let current = {
            let lifecycle = self.lifecycle.lock().await;
            lifecycle
                .published(article_id)?
                .comments
                .iter()
                .find(|comment| comment.id == comment_id)
                .cloned()
                .ok_or_else(|| ContentError::NotFound {
                    what: "comment",
                    key: comment_id.to_string(),
                })?
        };

        let remote_value = match &self.remote {
            Some(remote) => Some(remote.increment_vote(article_id, &current, kind).await?),
            None => None,
        };
        let local = self
            .lifecycle
            .lock()
            .await
            .apply_vote(article_id, comment_id, kind)?;
        Ok(remote_value.unwrap_or_else(|| kind.count(&local)))
    }
}

fn fallback_warning() -> String {
    "The content service is unreachable; showing the last synced copy.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{content_store::ContentStore, local_store::LocalStore, remote::InMemoryRemote};

    fn remote_article(id: &str, slug: &str, category: Category) -> Article {
        let mut article = Article::new(format!("Remote {id}"), "<p>remote</p>");
        article.id = id.to_string();
        article.slug = slug.to_string();
        article.category = category;
        article.status = ArticleStatus::Published;
        article
    }

    fn sync_with(remote: Arc<InMemoryRemote>) -> ContentSync {
        let lifecycle = Lifecycle::new(ContentStore::load(LocalStore::in_memory()).expect("store"));
        ContentSync::new(Arc::new(Mutex::new(lifecycle)), Some(remote))
    }

    #[tokio::test]
    async fn remote_results_are_mirrored_then_served_on_outage() {
        let remote = Arc::new(InMemoryRemote::with_articles(vec![
            remote_article("r1", "first", Category::Blog),
            remote_article("r2", "second", Category::Reviews),
        ]));
        let sync = sync_with(remote.clone());

        let fresh = sync.load_published().await;
        assert_eq!(fresh.source, Source::Remote);
        assert_eq!(fresh.value.len(), 2);

        remote.set_offline(true);
        let stale = sync.load_published().await;
        assert_eq!(stale.source, Source::Fallback);
        assert!(stale.warning.is_some());
        assert_eq!(stale.value.len(), 2);

        let reviews = sync.load_by_category("REVIEW").await;
        assert_eq!(reviews.source, Source::Fallback);
        assert_eq!(reviews.value.len(), 1);

        let by_slug = sync.load_by_slug("first").await;
        assert_eq!(by_slug.value.map(|a| a.id), Some("r1".to_string()));
    }

    fn article_with_comment(id: &str) -> Article {
        let mut article = remote_article(id, id, Category::Blog);
        article.comments.push(
            NewComment {
                name: "Laertes".to_string(),
                content: "Too much of water".to_string(),
            }
            .validate(Utc::now())
            .expect("comment"),
        );
        article
    }

    #[tokio::test]
    async fn invalid_comment_is_rejected_before_remote_call() {
        let remote = Arc::new(InMemoryRemote::with_articles(vec![remote_article(
            "r1",
            "first",
            Category::Blog,
        )]));
        remote.set_offline(true);
        let sync = sync_with(remote);
        let err = sync
            .submit_comment("r1", NewComment::default())
            .await
            .expect_err("invalid");
        // Validation wins over the unreachable remote.
        assert!(matches!(err, ContentError::Validation(_)));
    }

    #[tokio::test]
    async fn comment_reaches_remote_and_local_mirror() {
        let remote = Arc::new(InMemoryRemote::with_articles(vec![remote_article(
            "r1",
            "first",
            Category::Blog,
        )]));
        let sync = sync_with(remote.clone());
        sync.load_published().await;

        let comment = sync
            .submit_comment(
                "r1",
                NewComment {
                    name: "Gertrude".to_string(),
                    content: "More matter, with less art".to_string(),
                },
            )
            .await
            .expect("comment");
        assert_eq!(remote.snapshot()[0].comments[0].id, comment.id);
        let lifecycle = sync.lifecycle().lock().await;
        let local = lifecycle
            .store()
            .find_in(ArticleStatus::Published, "r1")
            .expect("mirrored");
        assert_eq!(local.comments.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_votes_land_one_or_two() {
        let remote = Arc::new(InMemoryRemote::with_articles(vec![article_with_comment("r1")]));
        let sync = sync_with(remote.clone());
        sync.load_published().await;
        let comment_id = remote.snapshot()[0].comments[0].id.clone();

        let (a, b) = tokio::join!(
            sync.vote("r1", &comment_id, VoteKind::Like),
            sync.vote("r1", &comment_id, VoteKind::Like),
        );
        assert!(a.is_ok() && b.is_ok());
        let likes = remote.snapshot()[0].comments[0].likes;
        assert!(likes == 1 || likes == 2, "likes = {likes}");
    }

    #[tokio::test]
    async fn outage_before_any_sync_yields_empty_not_error() {
        let remote = Arc::new(InMemoryRemote::default());
        remote.set_offline(true);
        let sync = sync_with(remote);
        let loaded = sync.load_published().await;
        assert_eq!(loaded.source, Source::Fallback);
        assert!(loaded.value.is_empty());
    }

    #[tokio::test]
    async fn local_drafts_win_over_remote_copies() {
        let remote = Arc::new(InMemoryRemote::with_articles(vec![remote_article(
            "shared-id",
            "shared",
            Category::Blog,
        )]));
        let sync = sync_with(remote);
        {
            let mut lifecycle = sync.lifecycle().lock().await;
            let mut draft = Article::new("Local rewrite", "<p>local</p>");
            draft.id = "shared-id".to_string();
            lifecycle.save_draft(draft).expect("draft");
        }

        let loaded = sync.load_published().await;
        assert!(loaded.value.is_empty());
        let lifecycle = sync.lifecycle().lock().await;
        assert_eq!(lifecycle.store().partitions_of("shared-id"), vec![ArticleStatus::Draft]);
    }

    #[tokio::test]
    async fn held_back_articles_stay_hidden_from_every_remote_read() {
        let remote = Arc::new(InMemoryRemote::with_articles(vec![
            remote_article("shared-id", "shared", Category::Blog),
            remote_article("other", "other", Category::Blog),
        ]));
        let sync = sync_with(remote);
        {
            let mut lifecycle = sync.lifecycle().lock().await;
            let mut draft = Article::new("Pulled back", "<p>local</p>");
            draft.id = "shared-id".to_string();
            draft.slug = "shared".to_string();
            lifecycle.save_draft(draft).expect("draft");
        }

        let by_slug = sync.load_by_slug("shared").await;
        assert_eq!(by_slug.source, Source::Remote);
        assert!(by_slug.value.is_none());

        let blog = sync.load_by_category("blog").await;
        let ids: Vec<&str> = blog.value.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["other"]);
    }

    #[tokio::test]
    async fn comments_and_votes_need_a_published_article() {
        let remote = Arc::new(InMemoryRemote::with_articles(vec![article_with_comment(
            "shared-id",
        )]));
        let sync = sync_with(remote.clone());
        let comment_id = remote.snapshot()[0].comments[0].id.clone();
        let draft = {
            let mut lifecycle = sync.lifecycle().lock().await;
            let mut draft = article_with_comment("shared-id");
            draft.comments[0].id = comment_id.clone();
            lifecycle.save_draft(draft).expect("draft")
        };

        let err = sync
            .submit_comment(
                &draft.id,
                NewComment {
                    name: "Ophelia".to_string(),
                    content: "There's rosemary".to_string(),
                },
            )
            .await
            .expect_err("draft is not public");
        assert!(matches!(err, ContentError::NotFound { .. }));
        let err = sync
            .vote(&draft.id, &comment_id, VoteKind::Like)
            .await
            .expect_err("draft is not public");
        assert!(matches!(err, ContentError::NotFound { .. }));

        // Neither call reached the remote copy.
        let remote_copy = &remote.snapshot()[0];
        assert_eq!(remote_copy.comments.len(), 1);
        assert_eq!(remote_copy.comments[0].likes, 0);
    }

    #[tokio::test]
    async fn local_only_draft_rejects_comments_without_remote() {
        let lifecycle = Lifecycle::new(ContentStore::load(LocalStore::in_memory()).expect("store"));
        let sync = ContentSync::new(Arc::new(Mutex::new(lifecycle)), None);
        let draft = sync
            .lifecycle()
            .lock()
            .await
            .save_draft(Article::new("Secret draft", "<p>x</p>"))
            .expect("draft");
        let err = sync
            .submit_comment(
                &draft.id,
                NewComment {
                    name: "Osric".to_string(),
                    content: "A hit, a very palpable hit".to_string(),
                },
            )
            .await
            .expect_err("draft is not public");
        assert!(matches!(err, ContentError::NotFound { .. }));
    }
}
