//! Draft → Scheduled → Published state machine.
//!
//! Every transition reads the cached partitions, builds new lists without
//! mutating the old ones, and writes every touched partition back in one
//! store call. A failed write leaves both the cache and persistence as they
//! were.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::{
    comments::{apply_vote, VoteKind},
    content::sanitize_html,
    content_store::ContentStore,
    display_date, normalize_tags,
    slug::{slugify, unique_slug},
    Article, ArticleContent, ArticleStatus, Comment, ContentError, ContentResult, Page,
};

/// Tolerance for schedule dates that fall slightly behind the clock by the
/// time the request is handled.
pub const SCHEDULE_GRACE_SECS: i64 = 60;

const EVENT_CAPACITY: usize = 64;

/// Broadcast after every successful transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ContentEvent {
    /// An article was written to Draft.
    DraftSaved {
        /// Article identity.
        id: String,
        /// Partition it left, if it already existed.
        previous: Option<ArticleStatus>,
    },
    /// An article was moved into Scheduled.
    Scheduled {
        /// Article identity.
        id: String,
        /// Target publication time.
        at: DateTime<Utc>,
        /// Partition it left, if it already existed.
        previous: Option<ArticleStatus>,
    },
    /// An article went live.
    Published {
        /// Article identity.
        id: String,
        /// Public slug.
        slug: String,
    },
    /// An article was removed from a partition.
    Deleted {
        /// Article identity.
        id: String,
        /// Partition it was removed from.
        partition: ArticleStatus,
    },
    /// A comment was added or voted on.
    CommentsChanged {
        /// Article identity.
        id: String,
    },
    /// A page was created or updated.
    PageSaved {
        /// Page identity.
        id: String,
    },
    /// A page was deleted.
    PageDeleted {
        /// Page identity.
        id: String,
    },
}

impl ContentEvent {
    /// Whether readers can observe the change, i.e. cached public listings
    /// are stale.
    pub fn changes_public_visibility(&self) -> bool {
        match self {
            Self::DraftSaved { previous, .. } | Self::Scheduled { previous, .. } => {
                *previous == Some(ArticleStatus::Published)
            },
            Self::Deleted { partition, .. } => *partition == ArticleStatus::Published,
            Self::Published { .. }
            | Self::CommentsChanged { .. }
            | Self::PageSaved { .. }
            | Self::PageDeleted { .. } => true,
        }
    }
}

/// Owns the [`ContentStore`] and applies lifecycle transitions to it.
pub struct Lifecycle {
    store: ContentStore,
    events: broadcast::Sender<ContentEvent>,
}

impl Lifecycle {
    /// Lifecycle over `store` with a fresh event channel.
    pub fn new(store: ContentStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { store, events }
    }

    /// Read access to the partitions.
    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Direct store access for imports and reloads.
    pub fn store_mut(&mut self) -> &mut ContentStore {
        &mut self.store
    }

    /// Resyncs the cache from persistence.
    pub fn reload(&mut self) -> ContentResult<()> {
        self.store.reload()
    }

    /// New receiver for transition events. Slow receivers may observe
    /// `Lagged` and miss events.
    pub fn subscribe(&self) -> broadcast::Receiver<ContentEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ContentEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("content event dropped: no subscribers");
        }
    }

    /// Writes or updates `article` in Draft, removing it from any other
    /// partition.
    pub fn save_draft(&mut self, article: Article) -> ContentResult<Article> {
        let mut article = self.prepare(article)?;
        let previous = self.store.find(&article.id).map(|(status, _)| status);
        article.status = ArticleStatus::Draft;
        article.scheduled_date = None;

        let changes = self.move_into(ArticleStatus::Draft, &article);
        self.store.replace_partitions(changes)?;
        tracing::info!(id = %article.id, title = %article.title, "draft saved");
        self.emit(ContentEvent::DraftSaved {
            id: article.id.clone(),
            previous,
        });
        Ok(article)
    }

    /// Moves `article` into Scheduled for `when`. Scheduling the same article
    /// twice replaces the entry in place.
    pub fn schedule(&mut self, article: Article, when: DateTime<Utc>) -> ContentResult<Article> {
        if when + Duration::seconds(SCHEDULE_GRACE_SECS) < Utc::now() {
            return Err(ContentError::Validation(format!(
                "schedule date {} is in the past",
                when.to_rfc3339()
            )));
        }
        let mut article = self.prepare(article)?;
        let previous = self.store.find(&article.id).map(|(status, _)| status);
        article.status = ArticleStatus::Scheduled;
        article.scheduled_date = Some(when);

        let changes = self.move_into(ArticleStatus::Scheduled, &article);
        self.store.replace_partitions(changes)?;
        tracing::info!(id = %article.id, at = %when, "article scheduled");
        self.emit(ContentEvent::Scheduled {
            id: article.id.clone(),
            at: when,
            previous,
        });
        Ok(article)
    }

    /// Publishes the draft or scheduled article with identity `id`. Drafts
    /// are searched first.
    pub fn publish(&mut self, id: &str) -> ContentResult<Article> {
        let article = [ArticleStatus::Draft, ArticleStatus::Scheduled]
            .into_iter()
            .find_map(|status| self.store.find_in(status, id))
            .cloned()
            .ok_or_else(|| ContentError::not_found("article", id))?;
        self.finish_publish(article)
    }

    /// Publishes the first draft, then scheduled, article whose title equals
    /// `title` ignoring case and surrounding whitespace.
    pub fn publish_by_title(&mut self, title: &str) -> ContentResult<Article> {
        let wanted = title.trim().to_lowercase();
        let article = [ArticleStatus::Draft, ArticleStatus::Scheduled]
            .into_iter()
            .find_map(|status| {
                self.store
                    .partition(status)
                    .iter()
                    .find(|article| article.title.trim().to_lowercase() == wanted)
            })
            .cloned()
            .ok_or_else(|| ContentError::not_found("article titled", title.trim()))?;
        self.finish_publish(article)
    }

    /// Entry point for articles created directly as published; not a
    /// transition from Draft.
    pub fn create_published(&mut self, article: Article) -> ContentResult<Article> {
        let article = self.prepare(article)?;
        self.finish_publish(article)
    }

    /// Publishes every scheduled article due at `now`, in list order. All of
    /// them go live in one write, or none do.
    pub fn publish_due(&mut self, now: DateTime<Utc>) -> ContentResult<Vec<Article>> {
        let (due, waiting): (Vec<Article>, Vec<Article>) = self
            .store
            .partition(ArticleStatus::Scheduled)
            .iter()
            .cloned()
            .partition(|article| article.scheduled_date.is_some_and(|at| at <= now));
        if due.is_empty() {
            return Ok(Vec::new());
        }

        let published: Vec<Article> = due.into_iter().map(mark_published).collect();
        let live = published
            .iter()
            .fold(self.store.partition(ArticleStatus::Published).to_vec(), |list, article| {
                upsert(&list, article)
            });
        self.store.replace_partitions(vec![
            (ArticleStatus::Scheduled, waiting),
            (ArticleStatus::Published, live),
        ])?;

        tracing::info!(count = published.len(), "published due scheduled articles");
        for article in &published {
            self.emit(ContentEvent::Published {
                id: article.id.clone(),
                slug: article.slug.clone(),
            });
        }
        Ok(published)
    }

    /// Removes `id` from `partition`.
    pub fn delete(&mut self, id: &str, partition: ArticleStatus) -> ContentResult<Article> {
        let removed = self
            .store
            .find_in(partition, id)
            .cloned()
            .ok_or_else(|| ContentError::not_found("article", id))?;
        let remaining = without(self.store.partition(partition), id);
        self.store.replace_partitions(vec![(partition, remaining)])?;
        tracing::info!(id, %partition, "article deleted");
        self.emit(ContentEvent::Deleted {
            id: id.to_string(),
            partition,
        });
        Ok(removed)
    }

    /// Refreshes the Published partition with articles fetched from the
    /// remote store. Ids held locally as Draft or Scheduled are skipped;
    /// locally published articles unknown to the remote are kept after the
    /// remote ones. Emits no event.
    pub fn mirror_remote(&mut self, remote: Vec<Article>) -> ContentResult<usize> {
        let held_back = self.held_back_ids();

        let mut seen = HashSet::new();
        let mut merged: Vec<Article> = remote
            .into_iter()
            .filter(|article| !held_back.contains(&article.id))
            .filter(|article| seen.insert(article.id.clone()))
            .map(|mut article| {
                article.status = ArticleStatus::Published;
                article.scheduled_date = None;
                article
            })
            .collect();
        merged.extend(
            self.store
                .partition(ArticleStatus::Published)
                .iter()
                .filter(|article| !seen.contains(&article.id))
                .cloned(),
        );

        let count = merged.len();
        self.store
            .replace_partitions(vec![(ArticleStatus::Published, merged)])?;
        tracing::debug!(count, "published partition mirrored from remote");
        Ok(count)
    }

    /// Appends a reader comment to a published article. Drafts and scheduled
    /// articles are invisible to readers and answer `NotFound`.
    pub fn apply_comment(&mut self, article_id: &str, comment: Comment) -> ContentResult<Article> {
        let mut updated = self.published(article_id)?.clone();
        updated.comments.push(comment);
        let list = upsert(self.store.partition(ArticleStatus::Published), &updated);
        self.store
            .replace_partitions(vec![(ArticleStatus::Published, list)])?;
        self.emit(ContentEvent::CommentsChanged {
            id: article_id.to_string(),
        });
        Ok(updated)
    }

    /// Published article `id`, the only kind readers may comment on or vote on.
    pub fn published(&self, id: &str) -> ContentResult<&Article> {
        self.store
            .find_in(ArticleStatus::Published, id)
            .ok_or_else(|| ContentError::not_found("article", id))
    }

    /// Ids held locally as Draft or Scheduled. Remote copies of these stay
    /// hidden from readers until they are published again.
    pub fn held_back_ids(&self) -> HashSet<String> {
        [ArticleStatus::Draft, ArticleStatus::Scheduled]
            .into_iter()
            .flat_map(|status| self.store.partition(status).iter().map(|a| a.id.clone()))
            .collect()
    }

    /// Raises one vote counter of a comment on a published article by one
    /// and returns the comment.
    pub fn apply_vote(
        &mut self,
        article_id: &str,
        comment_id: &str,
        kind: VoteKind,
    ) -> ContentResult<Comment> {
        let article = self.published(article_id)?;
        let position = article
            .comments
            .iter()
            .position(|comment| comment.id == comment_id)
            .ok_or_else(|| ContentError::not_found("comment", comment_id))?;

        let mut updated = article.clone();
        let voted = apply_vote(&updated.comments[position], kind);
        updated.comments[position] = voted.clone();
        let list = upsert(self.store.partition(ArticleStatus::Published), &updated);
        self.store
            .replace_partitions(vec![(ArticleStatus::Published, list)])?;
        self.emit(ContentEvent::CommentsChanged {
            id: article_id.to_string(),
        });
        Ok(voted)
    }

    /// Creates or updates a page. The system flag of an existing page is kept.
    pub fn save_page(&mut self, page: Page) -> ContentResult<Page> {
        let mut page = page;
        page.title = page.title.trim().to_string();
        if page.title.is_empty() {
            return Err(ContentError::Validation("title is required".to_string()));
        }
        if page.id.trim().is_empty() {
            page.id = uuid::Uuid::new_v4().to_string();
        }
        if page.slug.trim().is_empty() {
            page.slug = slugify(&page.title);
        }
        if let Some(existing) = self.store.page(&page.id) {
            page.is_system = existing.is_system;
        }
        page.content = sanitize_html(&page.content);
        page.last_updated = Utc::now();

        let pages = self.store.pages();
        let next: Vec<Page> = if pages.iter().any(|p| p.id == page.id) {
            pages
                .iter()
                .map(|p| if p.id == page.id { page.clone() } else { p.clone() })
                .collect()
        } else {
            pages.iter().cloned().chain(std::iter::once(page.clone())).collect()
        };
        self.store.replace_pages(next)?;
        tracing::info!(id = %page.id, slug = %page.slug, "page saved");
        self.emit(ContentEvent::PageSaved {
            id: page.id.clone(),
        });
        Ok(page)
    }

    /// Deletes a non-system page.
    pub fn delete_page(&mut self, id: &str) -> ContentResult<Page> {
        let page = self
            .store
            .page(id)
            .cloned()
            .ok_or_else(|| ContentError::not_found("page", id))?;
        if page.is_system {
            tracing::warn!(id, "refused to delete system page");
            return Err(ContentError::SystemPage(id.to_string()));
        }
        let next: Vec<Page> = self
            .store
            .pages()
            .iter()
            .filter(|p| p.id != id)
            .cloned()
            .collect();
        self.store.replace_pages(next)?;
        tracing::info!(id, "page deleted");
        self.emit(ContentEvent::PageDeleted { id: id.to_string() });
        Ok(page)
    }

    fn finish_publish(&mut self, article: Article) -> ContentResult<Article> {
        let article = mark_published(article);
        let changes = self.move_into(ArticleStatus::Published, &article);
        self.store.replace_partitions(changes)?;
        tracing::info!(id = %article.id, slug = %article.slug, "article published");
        self.emit(ContentEvent::Published {
            id: article.id.clone(),
            slug: article.slug.clone(),
        });
        Ok(article)
    }

    /// Validates required fields and fills identity, slug and tags.
    fn prepare(&self, mut article: Article) -> ContentResult<Article> {
        article.title = article.title.trim().to_string();
        if article.title.is_empty() {
            return Err(ContentError::Validation("title is required".to_string()));
        }
        if article.content.is_blank() {
            return Err(ContentError::Validation("content is required".to_string()));
        }
        if article.id.trim().is_empty() {
            article.id = uuid::Uuid::new_v4().to_string();
        }

        let base = if article.slug.trim().is_empty() {
            slugify(&article.title)
        } else {
            slugify(&article.slug)
        };
        let base = if base.is_empty() { slugify(&article.id) } else { base };
        article.slug = unique_slug(&base, |candidate| self.store.slug_taken(candidate, &article.id));

        if let ArticleContent::Html(html) = &article.content {
            article.content = ArticleContent::Html(sanitize_html(html));
        }
        article.tags = normalize_tags(&article.tags);
        article.excerpt = article.excerpt.trim().to_string();
        Ok(article)
    }

    /// Partition lists after placing `article` in `target`: upserted there,
    /// filtered out of every other partition that holds it.
    fn move_into(&self, target: ArticleStatus, article: &Article) -> Vec<(ArticleStatus, Vec<Article>)> {
        ArticleStatus::ALL
            .into_iter()
            .filter_map(|status| {
                let list = self.store.partition(status);
                if status == target {
                    Some((status, upsert(list, article)))
                } else if list.iter().any(|a| a.id == article.id) {
                    Some((status, without(list, &article.id)))
                } else {
                    None
                }
            })
            .collect()
    }
}

fn upsert(list: &[Article], article: &Article) -> Vec<Article> {
    if list.iter().any(|a| a.id == article.id) {
        list.iter()
            .map(|a| if a.id == article.id { article.clone() } else { a.clone() })
            .collect()
    } else {
        list.iter().cloned().chain(std::iter::once(article.clone())).collect()
    }
}

/// Published-state fields: status, cleared schedule, publication time and a
/// display date when none was given.
fn mark_published(mut article: Article) -> Article {
    article.status = ArticleStatus::Published;
    article.scheduled_date = None;
    let published_at = *article.published_at.get_or_insert_with(Utc::now);
    if article.date.trim().is_empty() {
        article.date = display_date(published_at);
    }
    article
}

fn without(list: &[Article], id: &str) -> Vec<Article> {
    list.iter().filter(|a| a.id != id).cloned().collect()
}
