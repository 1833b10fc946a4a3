//! Shared content model and lifecycle engine for the Humanities Last Chance
//! magazine: article/page records, the local fallback store, the remote
//! content client and the Draft → Scheduled → Published state machine.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod comments;
pub mod content;
pub mod content_store;
pub mod dashboard;
pub mod error;
pub mod lifecycle;
pub mod local_store;
pub mod remote;
pub mod slug;
pub mod sync;

pub use error::{ContentError, ContentResult};

// 文章分类：固定枚举
/// Editorial sections of the magazine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Essays and opinion pieces.
    #[default]
    Blog,
    /// Conversations with writers and scholars.
    Interviews,
    /// Book, film and exhibition reviews.
    Reviews,
}

impl Category {
    /// All sections in display order.
    pub const ALL: [Category; 3] = [Category::Blog, Category::Interviews, Category::Reviews];

    /// Display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blog => "Blog",
            Self::Interviews => "Interviews",
            Self::Reviews => "Reviews",
        }
    }

    /// Case-insensitive lookup that also accepts the singular forms.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "blog" | "blogs" | "post" | "posts" => Some(Self::Blog),
            "interview" | "interviews" => Some(Self::Interviews),
            "review" | "reviews" => Some(Self::Reviews),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown category `{s}`"))
    }
}

/// The three mutually exclusive partitions an article can live in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    /// Being edited; not visible to readers.
    #[default]
    Draft,
    /// Waiting for its `scheduled_date`.
    Scheduled,
    /// Visible on the public site.
    Published,
}

impl ArticleStatus {
    /// Every partition, in lookup order.
    pub const ALL: [ArticleStatus; 3] =
        [ArticleStatus::Draft, ArticleStatus::Scheduled, ArticleStatus::Published];

    /// Lowercase name used in URLs and CLI arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" | "drafts" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "published" => Ok(Self::Published),
            other => Err(format!("unknown partition `{other}`")),
        }
    }
}

/// Rich text body: either structured blocks from the remote editor or
/// sanitized HTML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArticleContent {
    /// Sanitized HTML fragment.
    Html(String),
    /// Portable-text style block list, kept as received.
    Blocks(Vec<serde_json::Value>),
}

impl Default for ArticleContent {
    fn default() -> Self {
        Self::Html(String::new())
    }
}

impl ArticleContent {
    /// True when the body carries no readable text.
    pub fn is_blank(&self) -> bool {
        self.plain_text().trim().is_empty()
    }

    /// Readable text with markup removed, used for excerpts and validation.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Html(html) => content::strip_tags(html),
            Self::Blocks(blocks) => content::blocks_text(blocks),
        }
    }
}

impl From<&str> for ArticleContent {
    fn from(value: &str) -> Self {
        Self::Html(value.to_string())
    }
}

// 完整文章数据模型
/// A magazine article in exactly one partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Stable identity, UUID v4 unless imported.
    pub id: String,
    /// Headline.
    pub title: String,
    /// URL slug, unique among articles.
    #[serde(default)]
    pub slug: String,
    /// Section.
    #[serde(default)]
    pub category: Category,
    /// Byline.
    #[serde(default)]
    pub author: String,
    /// Display date, e.g. `March 3, 2025`.
    #[serde(default)]
    pub date: String,
    /// First publication time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Body.
    #[serde(default)]
    pub content: ArticleContent,
    /// Summary shown in listings.
    #[serde(default)]
    pub excerpt: String,
    /// Cover image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Caption under the cover image.
    #[serde(default)]
    pub image_caption: Option<String>,
    /// Normalized tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Reader comments, oldest first.
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Pinned to the front page.
    #[serde(default)]
    pub featured: bool,
    /// Partition the article lives in.
    #[serde(default)]
    pub status: ArticleStatus,
    /// Only present while the article sits in the Scheduled partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<DateTime<Utc>>,
}

impl Article {
    /// A fresh draft with no identity yet; the lifecycle assigns one on save.
    pub fn new(title: impl Into<String>, content: impl Into<ArticleContent>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            slug: String::new(),
            category: Category::default(),
            author: String::new(),
            date: String::new(),
            published_at: None,
            content: content.into(),
            excerpt: String::new(),
            image: None,
            image_caption: None,
            tags: Vec::new(),
            comments: Vec::new(),
            featured: false,
            status: ArticleStatus::Draft,
            scheduled_date: None,
        }
    }

    /// Excerpt if the author wrote one, otherwise the opening of the body.
    pub fn summary(&self) -> String {
        if !self.excerpt.trim().is_empty() {
            return self.excerpt.trim().to_string();
        }
        content::excerpt_from(&self.content.plain_text(), content::EXCERPT_CHARS)
    }
}

impl From<String> for ArticleContent {
    fn from(value: String) -> Self {
        Self::Html(value)
    }
}

// 列表项（精简版）
/// List projection of [`Article`] without body or comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListItem {
    /// Article identity.
    pub id: String,
    /// Headline.
    pub title: String,
    /// URL slug.
    pub slug: String,
    /// Section.
    pub category: Category,
    /// Byline.
    pub author: String,
    /// Display date.
    pub date: String,
    /// First publication time.
    pub published_at: Option<DateTime<Utc>>,
    /// Excerpt, derived from the body when empty.
    pub excerpt: String,
    /// Cover image URL.
    pub image: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Pinned to the front page.
    pub featured: bool,
    /// Partition.
    pub status: ArticleStatus,
    /// Target time while scheduled.
    pub scheduled_date: Option<DateTime<Utc>>,
    /// Number of comments.
    pub comment_count: usize,
}

impl From<&Article> for ArticleListItem {
    fn from(a: &Article) -> Self {
        ArticleListItem {
            id: a.id.clone(),
            title: a.title.clone(),
            slug: a.slug.clone(),
            category: a.category,
            author: a.author.clone(),
            date: a.date.clone(),
            published_at: a.published_at,
            excerpt: a.summary(),
            image: a.image.clone(),
            tags: a.tags.clone(),
            featured: a.featured,
            status: a.status,
            scheduled_date: a.scheduled_date,
            comment_count: a.comments.len(),
        }
    }
}

/// A reader comment, owned by its article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Identity, stored remotely as `_key`.
    pub id: String,
    /// Display name of the reader.
    pub name: String,
    /// Comment text.
    pub content: String,
    /// Submission time.
    pub date: DateTime<Utc>,
    /// Like count.
    #[serde(default)]
    pub likes: u32,
    /// Dislike count.
    #[serde(default)]
    pub dislikes: u32,
}

/// A static page such as About or Contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Stable identity.
    pub id: String,
    /// Title.
    pub title: String,
    /// URL slug.
    pub slug: String,
    /// Sanitized HTML body.
    pub content: String,
    /// Last save time.
    pub last_updated: DateTime<Utc>,
    /// Seeded pages can be edited but not deleted.
    #[serde(default)]
    pub is_system: bool,
}

impl Page {
    /// Pages seeded when the pages key has never been written.
    pub fn system_defaults(now: DateTime<Utc>) -> Vec<Page> {
        [("about", "About"), ("contact", "Contact"), ("privacy", "Privacy Policy")]
            .into_iter()
            .map(|(slug, title)| Page {
                id: format!("page-{slug}"),
                title: title.to_string(),
                slug: slug.to_string(),
                content: String::new(),
                last_updated: now,
                is_system: true,
            })
            .collect()
    }
}

/// Trims tags, drops empty ones and removes case-insensitive duplicates while
/// keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.to_lowercase()))
        .collect()
}

/// Display form of a publication timestamp.
pub fn display_date(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}
