//! Admin dashboard orchestration: list selection, form editing and dispatch
//! of lifecycle transitions. Destructive and irreversible actions are staged
//! first and only run after [`DashboardController::confirm`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    lifecycle::Lifecycle, normalize_tags, Article, ArticleContent, ArticleListItem, ArticleStatus,
    Category, ContentError, ContentResult, Page,
};

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Action completed.
    Success,
    /// Nothing went wrong, but nothing happened either.
    Warning,
    /// Action failed.
    Failure,
}

/// Toast-style outcome of a dashboard action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text shown to the author.
    pub message: String,
}

impl Notice {
    /// A success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// A warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    /// A failure notice.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Failure,
            message: message.into(),
        }
    }

    /// True for failures.
    pub fn is_failure(&self) -> bool {
        self.level == NoticeLevel::Failure
    }
}

impl From<&ContentError> for Notice {
    fn from(err: &ContentError) -> Self {
        if err.is_recoverable() {
            Notice::failure(err.to_string())
        } else {
            Notice::failure(format!("Could not save changes: {err}"))
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Failure => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

/// Editable fields of an article.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleForm {
    /// Title.
    pub title: String,
    /// Body.
    pub content: ArticleContent,
    /// Summary shown in listings.
    pub excerpt: String,
    /// Section.
    pub category: Category,
    /// Comma-separated.
    pub tags: String,
    /// Byline.
    pub author: String,
    /// Cover image URL; empty for none.
    pub image: String,
    /// Caption under the cover image.
    pub image_caption: String,
    /// Pinned to the front page.
    pub featured: bool,
}

impl ArticleForm {
    /// Form filled from `article`.
    pub fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            content: article.content.clone(),
            excerpt: article.excerpt.clone(),
            category: article.category,
            tags: article.tags.join(", "),
            author: article.author.clone(),
            image: article.image.clone().unwrap_or_default(),
            image_caption: article.image_caption.clone().unwrap_or_default(),
            featured: article.featured,
        }
    }

    /// Applies the form on top of `base`, keeping the fields the form does
    /// not edit (identity, slug, dates, comments).
    pub fn apply_to(&self, base: Article) -> Article {
        let optional = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        Article {
            title: self.title.clone(),
            content: self.content.clone(),
            excerpt: self.excerpt.clone(),
            category: self.category,
            tags: normalize_tags(self.tags.split(',')),
            author: self.author.trim().to_string(),
            image: optional(&self.image),
            image_caption: optional(&self.image_caption),
            featured: self.featured,
            ..base
        }
    }
}

/// An action waiting for explicit confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    /// Publish a draft or scheduled article.
    Publish {
        /// Article identity.
        id: String,
    },
    /// Publish the first article with this title.
    PublishByTitle {
        /// Title, matched ignoring case.
        title: String,
    },
    /// Remove an article from one partition.
    Delete {
        /// Article identity.
        id: String,
        /// Partition to remove it from.
        partition: ArticleStatus,
    },
    /// Remove a non-system page.
    DeletePage {
        /// Page identity.
        id: String,
    },
}

impl PendingAction {
    /// Question to put to the author before running the action.
    pub fn prompt(&self) -> String {
        match self {
            Self::Publish { id } => format!("Publish article `{id}`? It becomes public immediately."),
            Self::PublishByTitle { title } => {
                format!("Publish the article titled \"{title}\"? It becomes public immediately.")
            },
            Self::Delete { id, partition } => {
                format!("Delete article `{id}` from {partition}? This cannot be undone.")
            },
            Self::DeletePage { id } => format!("Delete page `{id}`? This cannot be undone."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    Article { partition: ArticleStatus, id: String },
    Page { id: String },
}

/// Drives the lifecycle on behalf of an author.
pub struct DashboardController<'a> {
    lifecycle: &'a mut Lifecycle,
    selection: Option<Selection>,
    base: Option<Article>,
    form: ArticleForm,
    page_form: Option<Page>,
    pending: Option<PendingAction>,
}

impl<'a> DashboardController<'a> {
    /// Controller with an empty form and nothing selected.
    pub fn new(lifecycle: &'a mut Lifecycle) -> Self {
        Self {
            lifecycle,
            selection: None,
            base: None,
            form: ArticleForm::default(),
            page_form: None,
            pending: None,
        }
    }

    /// List rows of one partition.
    pub fn list(&self, partition: ArticleStatus) -> Vec<ArticleListItem> {
        self.lifecycle
            .store()
            .partition(partition)
            .iter()
            .map(ArticleListItem::from)
            .collect()
    }

    /// Every static page.
    pub fn pages(&self) -> &[Page] {
        self.lifecycle.store().pages()
    }

    /// Loads an article into the form.
    pub fn select_article(&mut self, partition: ArticleStatus, id: &str) -> ContentResult<&ArticleForm> {
        let article = self
            .lifecycle
            .store()
            .find_in(partition, id)
            .cloned()
            .ok_or_else(|| ContentError::not_found("article", id))?;
        self.form = ArticleForm::from_article(&article);
        self.base = Some(article);
        self.selection = Some(Selection::Article {
            partition,
            id: id.to_string(),
        });
        Ok(&self.form)
    }

    /// Clears selection and form for a new article.
    pub fn new_article(&mut self) -> &mut ArticleForm {
        self.selection = None;
        self.base = None;
        self.form = ArticleForm::default();
        &mut self.form
    }

    /// Current article form.
    pub fn form(&self) -> &ArticleForm {
        &self.form
    }

    /// Editable article form.
    pub fn form_mut(&mut self) -> &mut ArticleForm {
        &mut self.form
    }

    /// Id of the selected article, if any.
    pub fn selected_id(&self) -> Option<&str> {
        match &self.selection {
            Some(Selection::Article { id, .. }) | Some(Selection::Page { id }) => Some(id),
            None => None,
        }
    }

    fn form_article(&self) -> Article {
        let base = self
            .base
            .clone()
            .unwrap_or_else(|| Article::new(String::new(), ArticleContent::default()));
        self.form.apply_to(base)
    }

    fn remember(&mut self, article: Article) {
        self.selection = Some(Selection::Article {
            partition: article.status,
            id: article.id.clone(),
        });
        self.form = ArticleForm::from_article(&article);
        self.base = Some(article);
    }

    /// Saves the form as a draft.
    pub fn save_draft(&mut self) -> Notice {
        match self.lifecycle.save_draft(self.form_article()) {
            Ok(article) => {
                let notice = Notice::success(format!("Draft \"{}\" saved", article.title));
                self.remember(article);
                notice
            },
            Err(err) => Notice::from(&err),
        }
    }

    /// Schedules the form content for `when`.
    pub fn schedule(&mut self, when: DateTime<Utc>) -> Notice {
        match self.lifecycle.schedule(self.form_article(), when) {
            Ok(article) => {
                let notice = Notice::success(format!(
                    "\"{}\" scheduled for {}",
                    article.title,
                    when.format("%Y-%m-%d %H:%M UTC")
                ));
                self.remember(article);
                notice
            },
            Err(err) => Notice::from(&err),
        }
    }

    fn stage(&mut self, action: PendingAction) -> &PendingAction {
        if let Some(replaced) = self.pending.take() {
            tracing::debug!(?replaced, "pending action replaced");
        }
        self.pending.insert(action)
    }

    /// Stages publication of article `id`.
    pub fn request_publish(&mut self, id: &str) -> &PendingAction {
        self.stage(PendingAction::Publish { id: id.to_string() })
    }

    /// Stages publication by title.
    pub fn request_publish_by_title(&mut self, title: &str) -> &PendingAction {
        self.stage(PendingAction::PublishByTitle {
            title: title.trim().to_string(),
        })
    }

    /// Stages deletion of article `id` from `partition`.
    pub fn request_delete(&mut self, id: &str, partition: ArticleStatus) -> &PendingAction {
        self.stage(PendingAction::Delete {
            id: id.to_string(),
            partition,
        })
    }

    /// Stages deletion of page `id`.
    pub fn request_delete_page(&mut self, id: &str) -> &PendingAction {
        self.stage(PendingAction::DeletePage { id: id.to_string() })
    }

    /// Action waiting for confirmation.
    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    /// Drops the staged action without running it.
    pub fn cancel(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    /// Runs the staged action.
    pub fn confirm(&mut self) -> Notice {
        let Some(action) = self.pending.take() else {
            return Notice::warning("Nothing to confirm");
        };

        let outcome = match &action {
            PendingAction::Publish { id } => self
                .lifecycle
                .publish(id)
                .map(|article| format!("\"{}\" is now live", article.title)),
            PendingAction::PublishByTitle { title } => self
                .lifecycle
                .publish_by_title(title)
                .map(|article| format!("\"{}\" is now live", article.title)),
            PendingAction::Delete { id, partition } => self
                .lifecycle
                .delete(id, *partition)
                .map(|article| format!("\"{}\" deleted", article.title)),
            PendingAction::DeletePage { id } => self
                .lifecycle
                .delete_page(id)
                .map(|page| format!("Page \"{}\" deleted", page.title)),
        };

        match outcome {
            Ok(message) => {
                self.after_confirmed(&action);
                Notice::success(message)
            },
            Err(err) => Notice::from(&err),
        }
    }

    fn after_confirmed(&mut self, action: &PendingAction) {
        let touched = match action {
            PendingAction::Publish { id }
            | PendingAction::Delete { id, .. }
            | PendingAction::DeletePage { id } => Some(id.as_str()),
            PendingAction::PublishByTitle { .. } => None,
        };
        let deleted = matches!(action, PendingAction::Delete { .. } | PendingAction::DeletePage { .. });
        if deleted && touched.is_some() && touched == self.selected_id() {
            self.selection = None;
            self.base = None;
            self.page_form = None;
            self.form = ArticleForm::default();
        }
    }

    /// Loads a page into the page form.
    pub fn select_page(&mut self, id: &str) -> ContentResult<&mut Page> {
        let page = self
            .lifecycle
            .store()
            .page(id)
            .cloned()
            .ok_or_else(|| ContentError::not_found("page", id))?;
        self.selection = Some(Selection::Page { id: id.to_string() });
        Ok(self.page_form.insert(page))
    }

    /// Starts a blank page.
    pub fn new_page(&mut self) -> &mut Page {
        self.selection = None;
        self.page_form.insert(Page {
            id: String::new(),
            title: String::new(),
            slug: String::new(),
            content: String::new(),
            last_updated: Utc::now(),
            is_system: false,
        })
    }

    /// Editable page, once one is selected.
    pub fn page_form_mut(&mut self) -> Option<&mut Page> {
        self.page_form.as_mut()
    }

    /// Creates or updates the selected page.
    pub fn save_page(&mut self) -> Notice {
        let Some(page) = self.page_form.clone() else {
            return Notice::warning("No page selected");
        };
        match self.lifecycle.save_page(page) {
            Ok(saved) => {
                let notice = Notice::success(format!("Page \"{}\" saved", saved.title));
                self.selection = Some(Selection::Page { id: saved.id.clone() });
                self.page_form = Some(saved);
                notice
            },
            Err(err) => Notice::from(&err),
        }
    }
}
