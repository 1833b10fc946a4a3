//! Cached view of the partitions and pages over the local store.

use chrono::Utc;

use crate::{
    local_store::LocalStore, Article, ArticleStatus, ContentResult, Page,
};

/// In-memory partition cache paired with its persisted copy.
///
/// Consumers receive the store explicitly; nothing about it is global. All
/// partition changes go through [`ContentStore::replace_partitions`], which
/// persists first and swaps the cache only once the write succeeded.
pub struct ContentStore {
    local: LocalStore,
    drafts: Vec<Article>,
    scheduled: Vec<Article>,
    published: Vec<Article>,
    pages: Vec<Page>,
}

impl ContentStore {
    /// Loads every partition from `local`, seeding the system pages on first
    /// use.
    pub fn load(local: LocalStore) -> ContentResult<Self> {
        if !local.pages_initialized()? {
            local.write_pages(&Page::system_defaults(Utc::now()))?;
            tracing::info!("seeded default system pages");
        }
        let mut store = Self {
            local,
            drafts: Vec::new(),
            scheduled: Vec::new(),
            published: Vec::new(),
            pages: Vec::new(),
        };
        store.reload()?;
        Ok(store)
    }

    /// Discards the cache and re-reads everything from persistence.
    pub fn reload(&mut self) -> ContentResult<()> {
        self.drafts = self.local.read_partition(ArticleStatus::Draft)?;
        self.scheduled = self.local.read_partition(ArticleStatus::Scheduled)?;
        self.published = self.local.read_partition(ArticleStatus::Published)?;
        self.pages = self.local.read_pages()?;
        tracing::debug!(
            drafts = self.drafts.len(),
            scheduled = self.scheduled.len(),
            published = self.published.len(),
            pages = self.pages.len(),
            "content store reloaded"
        );
        Ok(())
    }

    /// Persistence handle behind the cache.
    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Cached articles of one partition, in list order.
    pub fn partition(&self, status: ArticleStatus) -> &[Article] {
        match status {
            ArticleStatus::Draft => &self.drafts,
            ArticleStatus::Scheduled => &self.scheduled,
            ArticleStatus::Published => &self.published,
        }
    }

    /// Article `id` if `status` holds it.
    pub fn find_in(&self, status: ArticleStatus, id: &str) -> Option<&Article> {
        self.partition(status).iter().find(|article| article.id == id)
    }

    /// First partition (Draft, Scheduled, Published) holding `id`.
    pub fn find(&self, id: &str) -> Option<(ArticleStatus, &Article)> {
        ArticleStatus::ALL
            .into_iter()
            .find_map(|status| self.find_in(status, id).map(|article| (status, article)))
    }

    /// Partitions currently holding `id`; more than one means the stores
    /// diverged outside the lifecycle.
    pub fn partitions_of(&self, id: &str) -> Vec<ArticleStatus> {
        ArticleStatus::ALL
            .into_iter()
            .filter(|status| self.find_in(*status, id).is_some())
            .collect()
    }

    /// Published article with slug `slug`.
    pub fn published_by_slug(&self, slug: &str) -> Option<&Article> {
        self.published.iter().find(|article| article.slug == slug)
    }

    /// Whether any article other than `except_id` already uses `slug`.
    pub fn slug_taken(&self, slug: &str, except_id: &str) -> bool {
        ArticleStatus::ALL.into_iter().any(|status| {
            self.partition(status)
                .iter()
                .any(|article| article.slug == slug && article.id != except_id)
        })
    }

    /// Cached static pages.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Page with identity `id`.
    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|page| page.id == id)
    }

    /// Page with slug `slug`.
    pub fn page_by_slug(&self, slug: &str) -> Option<&Page> {
        self.pages.iter().find(|page| page.slug == slug)
    }

    /// Persists the given partitions in one write, then updates the cache.
    pub fn replace_partitions(&mut self, changes: Vec<(ArticleStatus, Vec<Article>)>) -> ContentResult<()> {
        let borrowed: Vec<(ArticleStatus, &[Article])> = changes
            .iter()
            .map(|(status, articles)| (*status, articles.as_slice()))
            .collect();
        self.local.write_partitions(&borrowed)?;

        for (status, articles) in changes {
            match status {
                ArticleStatus::Draft => self.drafts = articles,
                ArticleStatus::Scheduled => self.scheduled = articles,
                ArticleStatus::Published => self.published = articles,
            }
        }
        Ok(())
    }

    /// Persists `pages`, then swaps the cached list.
    pub fn replace_pages(&mut self, pages: Vec<Page>) -> ContentResult<()> {
        self.local.write_pages(&pages)?;
        self.pages = pages;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_seeds_system_pages_once() {
        let store = ContentStore::load(LocalStore::in_memory()).expect("load");
        assert_eq!(store.pages().len(), 3);
        assert!(store.pages().iter().all(|page| page.is_system));
    }

    #[test]
    fn reload_picks_up_external_writes() {
        let mut store = ContentStore::load(LocalStore::in_memory()).expect("load");
        let mut article = Article::new("Outside", "<p>x</p>");
        article.id = "ext".to_string();
        store
            .local()
            .write_partition(ArticleStatus::Draft, &[article])
            .expect("external write");
        assert!(store.partition(ArticleStatus::Draft).is_empty());

        store.reload().expect("reload");
        assert_eq!(store.partition(ArticleStatus::Draft).len(), 1);
        assert_eq!(store.find("ext").map(|(status, _)| status), Some(ArticleStatus::Draft));
    }
}
