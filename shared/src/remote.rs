//! Client for the remote headless content store.
//!
//! Documents arrive in inconsistent shapes (category as a string or a label
//! object, slug as a string or `{current}`, body as blocks or HTML). They are
//! normalized once, here, into [`Article`] values.

use std::{
    env,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use crate::{
    comments::VoteKind, content::sanitize_html, display_date, normalize_tags, slug::slugify,
    Article, ArticleContent, ArticleStatus, Category, Comment, ContentError, ContentResult,
};

/// Output format requested for every image.
pub const IMAGE_FORMAT: &str = "webp";
/// Output quality requested for every image.
pub const IMAGE_QUALITY: u8 = 80;
/// Output width requested for every image.
pub const IMAGE_WIDTH: u32 = 1200;

const DEFAULT_API_VERSION: &str = "2023-05-03";
const DEFAULT_DATASET: &str = "production";
const DEFAULT_CDN_BASE: &str = "https://cdn.sanity.io";
const POST_TYPE: &str = "post";

/// Document id prefix the content studio uses for unpublished edits.
const DRAFT_ID_PREFIX: &str = "drafts.";

/// Connection settings for the remote store.
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    /// Project identifier.
    pub project_id: String,
    /// Dataset name, e.g. `production`.
    pub dataset: String,
    /// API date version without the leading `v`.
    pub api_version: String,
    /// Bearer token; required for mutations.
    pub token: Option<String>,
    /// API origin; tests point it at a mock server.
    pub base_url: String,
    /// Image CDN origin.
    pub cdn_base: String,
    /// Request timeout.
    pub timeout_seconds: u64,
}

impl RemoteConfig {
    /// Settings with the default API version and hosts.
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        let project_id = project_id.into();
        Self {
            base_url: format!("https://{project_id}.api.sanity.io"),
            project_id,
            dataset: dataset.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            token: None,
            cdn_base: DEFAULT_CDN_BASE.to_string(),
            timeout_seconds: 10,
        }
    }

    /// Reads `HLC_REMOTE_*` variables. `None` when no project id is set, which
    /// means the site runs on the local store alone.
    pub fn from_env() -> Option<Self> {
        let project_id = env::var("HLC_REMOTE_PROJECT_ID")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())?;
        let dataset = env::var("HLC_REMOTE_DATASET").unwrap_or_else(|_| DEFAULT_DATASET.to_string());
        let mut config = Self::new(project_id, dataset);

        if let Ok(version) = env::var("HLC_REMOTE_API_VERSION") {
            config.api_version = version.trim().trim_start_matches('v').to_string();
        }
        config.token = env::var("HLC_REMOTE_TOKEN")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        if let Ok(base) = env::var("HLC_REMOTE_BASE_URL") {
            config.base_url = base.trim().trim_end_matches('/').to_string();
        }
        if let Ok(cdn) = env::var("HLC_REMOTE_CDN_BASE") {
            config.cdn_base = cdn.trim().trim_end_matches('/').to_string();
        }
        config.timeout_seconds = env::var("HLC_REMOTE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(10)
            .max(1);
        Some(config)
    }

    fn query_url(&self) -> String {
        format!("{}/v{}/data/query/{}", self.base_url, self.api_version, self.dataset)
    }

    fn mutate_url(&self) -> String {
        format!("{}/v{}/data/mutate/{}", self.base_url, self.api_version, self.dataset)
    }

    /// Absolute CDN URL for an image field, with the fixed output parameters
    /// and the focal point when the image carries a hotspot.
    pub fn image_url(&self, image: &Value) -> Option<String> {
        let base = match image {
            Value::String(url) if !url.trim().is_empty() => url.trim().to_string(),
            Value::Object(_) => {
                let asset = image.get("asset")?;
                if let Some(url) = asset.get("url").and_then(Value::as_str) {
                    url.to_string()
                } else {
                    let reference = asset.get("_ref").and_then(Value::as_str)?;
                    format!(
                        "{}/images/{}/{}/{}",
                        self.cdn_base,
                        self.project_id,
                        self.dataset,
                        asset_filename(reference)?
                    )
                }
            },
            _ => return None,
        };

        let separator = if base.contains('?') { '&' } else { '?' };
        let mut url = format!(
            "{base}{separator}w={IMAGE_WIDTH}&fm={IMAGE_FORMAT}&q={IMAGE_QUALITY}&fit=crop"
        );
        let hotspot = image.get("hotspot");
        let x = hotspot.and_then(|h| h.get("x")).and_then(Value::as_f64);
        let y = hotspot.and_then(|h| h.get("y")).and_then(Value::as_f64);
        if let (Some(x), Some(y)) = (x, y) {
            url.push_str(&format!("&crop=focalpoint&fp-x={x:.3}&fp-y={y:.3}"));
        }
        Some(url)
    }
}

/// `image-<hash>-<w>x<h>-<ext>` → `<hash>-<w>x<h>.<ext>`
fn asset_filename(reference: &str) -> Option<String> {
    let rest = reference.strip_prefix("image-")?;
    let (stem, ext) = rest.rsplit_once('-')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!("{stem}.{ext}"))
}

/// Query and patch surface of the remote store.
#[async_trait]
pub trait RemoteContentStore: Send + Sync {
    /// Every published article, newest first.
    async fn fetch_all(&self) -> ContentResult<Vec<Article>>;

    /// Published article with `slug`, if the remote store has one.
    async fn fetch_by_slug(&self, slug: &str) -> ContentResult<Option<Article>>;

    /// Articles in `category`, matched case-insensitively. Unknown sections
    /// yield an empty list.
    async fn fetch_by_category(&self, category: &str) -> ContentResult<Vec<Article>>;

    /// Appends `comment` to the article's comment list without rewriting the
    /// rest of the document.
    async fn append_comment(&self, article_id: &str, comment: &Comment) -> ContentResult<()>;

    /// Sets one counter of `comment` to its current value plus one, as seen
    /// in the caller's copy. Not atomic: concurrent votes may be lost.
    async fn increment_vote(
        &self,
        article_id: &str,
        comment: &Comment,
        kind: VoteKind,
    ) -> ContentResult<u32>;
}

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

/// HTTP client for a Sanity-style content lake.
pub struct SanityClient {
    http: reqwest::Client,
    config: RemoteConfig,
}

impl SanityClient {
    /// Client with a configured timeout.
    pub fn new(config: RemoteConfig) -> ContentResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { http, config })
    }

    /// Settings the client was built with.
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    async fn query<T: DeserializeOwned>(&self, groq: &str, params: &[(&str, Value)]) -> ContentResult<T> {
        let mut pairs: Vec<(String, String)> = vec![("query".to_string(), groq.to_string())];
        for (name, value) in params {
            pairs.push((format!("${name}"), serde_json::to_string(value)?));
        }

        // Tokens can read unpublished edits, so the perspective is pinned.
        pairs.push(("perspective".to_string(), "published".to_string()));

        let mut request = self.http.get(self.config.query_url()).query(&pairs);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::RemoteFetch(format!("query answered HTTP {status}")));
        }
        let body: QueryResponse<T> = response
            .json()
            .await
            .map_err(|err| ContentError::RemoteFetch(format!("undecodable query result: {err}")))?;
        Ok(body.result)
    }

    async fn mutate(&self, mutations: Value) -> ContentResult<()> {
        let mut request = self
            .http
            .post(self.config.mutate_url())
            .json(&json!({ "mutations": mutations }));
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::RemoteFetch(format!("mutation answered HTTP {status}")));
        }
        Ok(())
    }

    fn normalize_all(&self, docs: Vec<Value>) -> Vec<Article> {
        docs.into_iter()
            .filter(|doc| !is_studio_draft(doc))
            .filter_map(|doc| match normalize(doc, &self.config) {
                Ok(article) => Some(article),
                Err(err) => {
                    tracing::warn!("skipping remote document: {err}");
                    None
                },
            })
            .collect()
    }
}

#[async_trait]
impl RemoteContentStore for SanityClient {
    async fn fetch_all(&self) -> ContentResult<Vec<Article>> {
        let groq =
            format!(r#"*[_type == "{POST_TYPE}" && !(_id in path("drafts.**"))] | order(publishedAt desc)"#);
        let docs: Vec<Value> = self.query(&groq, &[]).await?;
        Ok(self.normalize_all(docs))
    }

    async fn fetch_by_slug(&self, slug: &str) -> ContentResult<Option<Article>> {
        let groq = format!(
            r#"*[_type == "{POST_TYPE}" && !(_id in path("drafts.**")) && (slug.current == $slug || slug == $slug)][0]"#
        );
        let doc: Option<Value> = self.query(&groq, &[("slug", json!(slug))]).await?;
        match doc {
            Some(Value::Null) | None => Ok(None),
            Some(doc) if is_studio_draft(&doc) => Ok(None),
            Some(doc) => normalize(doc, &self.config).map(Some),
        }
    }

    async fn fetch_by_category(&self, category: &str) -> ContentResult<Vec<Article>> {
        let Some(wanted) = Category::parse(category) else {
            tracing::debug!(category, "unknown category requested");
            return Ok(Vec::new());
        };
        let groq = format!(
            r#"*[_type == "{POST_TYPE}" && !(_id in path("drafts.**")) && lower(coalesce(category.title, category.label, category.name, category)) in $aliases] | order(publishedAt desc)"#
        );
        let docs: Vec<Value> = self
            .query(&groq, &[("aliases", json!(category_aliases(wanted)))])
            .await?;
        Ok(self
            .normalize_all(docs)
            .into_iter()
            .filter(|article| article.category == wanted)
            .collect())
    }

    async fn append_comment(&self, article_id: &str, comment: &Comment) -> ContentResult<()> {
        let item = json!({
            "_key": comment.id,
            "_type": "comment",
            "name": comment.name,
            "content": comment.content,
            "date": comment.date.to_rfc3339(),
            "likes": comment.likes,
            "dislikes": comment.dislikes,
        });
        self.mutate(json!([{
            "patch": {
                "id": article_id,
                "setIfMissing": { "comments": [] },
                "insert": { "after": "comments[-1]", "items": [item] },
            }
        }]))
        .await?;
        tracing::info!(article_id, comment_id = %comment.id, "comment appended remotely");
        Ok(())
    }

    async fn increment_vote(
        &self,
        article_id: &str,
        comment: &Comment,
        kind: VoteKind,
    ) -> ContentResult<u32> {
        let key = groq_key(&comment.id)?;
        let next = kind.count(comment).saturating_add(1);
        let mut set = serde_json::Map::new();
        set.insert(
            format!(r#"comments[_key=="{key}"].{}"#, kind.field()),
            json!(next),
        );
        self.mutate(json!([{
            "patch": {
                "id": article_id,
                "set": set,
            }
        }]))
        .await?;
        Ok(next)
    }
}

/// `id` when it is safe to splice into a GROQ field path: non-empty and
/// limited to ASCII letters, digits, `-` and `_`.
fn groq_key(id: &str) -> ContentResult<&str> {
    let safe = !id.is_empty()
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if safe {
        Ok(id)
    } else {
        Err(ContentError::Validation(format!("invalid comment key {id:?}")))
    }
}

fn is_studio_draft(doc: &Value) -> bool {
    doc.get("_id")
        .and_then(Value::as_str)
        .is_some_and(|id| id.starts_with(DRAFT_ID_PREFIX))
}

fn category_aliases(category: Category) -> Vec<&'static str> {
    match category {
        Category::Blog => vec!["blog", "blogs", "post", "posts"],
        Category::Interviews => vec!["interview", "interviews"],
        Category::Reviews => vec!["review", "reviews"],
    }
}

/// Text of a field that is either a plain string or an object carrying a
/// `title`, `label`, `name`, `value` or `current` member.
fn label_of(value: &Value) -> Option<String> {
    let label = match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Object(map) => ["title", "label", "name", "value", "current"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(|text| text.trim().to_string()),
        _ => None,
    };
    label.filter(|text| !text.is_empty())
}

/// Maps a raw category field onto the closed enumeration. Missing or
/// unrecognised values fall back to [`Category::Blog`].
pub fn normalize_category(value: Option<&Value>) -> Category {
    let label = match value {
        Some(Value::Array(items)) => items.iter().find_map(label_of),
        Some(other) => label_of(other),
        None => None,
    };
    match label.as_deref().map(|text| (text, Category::parse(text))) {
        Some((_, Some(category))) => category,
        Some((text, None)) => {
            tracing::warn!(category = text, "unrecognised category, filing under Blog");
            Category::Blog
        },
        None => Category::Blog,
    }
}

/// Tag labels from strings or label objects, deduplicated.
pub fn normalize_tag_values(values: &[Value]) -> Vec<String> {
    normalize_tags(values.iter().filter_map(label_of))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|at| at.and_utc())
        })
}

fn normalize_comment(value: &Value) -> Option<Comment> {
    let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    let counter = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_i64)
            .map(|n| u32::try_from(n.max(0)).unwrap_or(u32::MAX))
            .unwrap_or(0)
    };
    let id = text("_key").or_else(|| text("id"))?;
    Some(Comment {
        id,
        name: text("name").unwrap_or_else(|| "Anonymous".to_string()),
        content: text("content").or_else(|| text("comment")).unwrap_or_default(),
        date: text("date")
            .or_else(|| text("_createdAt"))
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now),
        likes: counter("likes"),
        dislikes: counter("dislikes"),
    })
}

/// Turns one raw remote document into an [`Article`] in the Published
/// partition.
pub fn normalize(doc: Value, config: &RemoteConfig) -> ContentResult<Article> {
    let field = |key: &str| doc.get(key).filter(|value| !value.is_null());
    let text = |key: &str| field(key).and_then(Value::as_str).map(|s| s.trim().to_string());

    let id = text("_id")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ContentError::Validation("remote document has no _id".to_string()))?;
    let title = text("title").unwrap_or_default();

    let slug = field("slug")
        .and_then(label_of)
        .map(|raw| slugify(&raw))
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| slugify(&title));

    let content = match field("body").or_else(|| field("content")) {
        Some(Value::Array(blocks)) => ArticleContent::Blocks(blocks.clone()),
        Some(Value::String(html)) => ArticleContent::Html(sanitize_html(html)),
        _ => ArticleContent::default(),
    };

    let image_field = field("mainImage").or_else(|| field("image"));
    let image = image_field.and_then(|image| config.image_url(image));
    let image_caption = image_field
        .and_then(|image| image.get("caption"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| text("imageCaption"))
        .filter(|caption| !caption.is_empty());

    let published_at = text("publishedAt")
        .or_else(|| text("_createdAt"))
        .as_deref()
        .and_then(parse_timestamp);
    let date = text("date")
        .filter(|date| !date.is_empty())
        .or_else(|| published_at.map(display_date))
        .unwrap_or_default();

    let tags = field("tags")
        .and_then(Value::as_array)
        .map(|values| normalize_tag_values(values))
        .unwrap_or_default();
    let comments = field("comments")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(normalize_comment).collect())
        .unwrap_or_default();

    Ok(Article {
        id,
        slug,
        category: normalize_category(field("category").or_else(|| field("categories"))),
        author: field("author").and_then(label_of).unwrap_or_default(),
        date,
        published_at,
        content,
        excerpt: text("excerpt").unwrap_or_default(),
        image,
        image_caption,
        tags,
        comments,
        featured: field("featured").and_then(Value::as_bool).unwrap_or(false),
        status: ArticleStatus::Published,
        scheduled_date: None,
        title,
    })
}

/// Remote store kept in memory. Serves local development without a content
/// project and lets callers simulate an outage.
#[derive(Default)]
pub struct InMemoryRemote {
    articles: Mutex<Vec<Article>>,
    offline: AtomicBool,
}

impl InMemoryRemote {
    /// Remote preloaded with `articles`.
    pub fn with_articles(articles: Vec<Article>) -> Self {
        Self {
            articles: Mutex::new(articles),
            offline: AtomicBool::new(false),
        }
    }

    /// Adds or replaces an article, as an editor would in the content studio.
    pub fn upsert(&self, article: Article) {
        let mut guard = self.articles.lock();
        match guard.iter_mut().find(|a| a.id == article.id) {
            Some(existing) => *existing = article,
            None => guard.push(article),
        }
    }

    /// While offline every call fails with `RemoteFetch`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Current contents.
    pub fn snapshot(&self) -> Vec<Article> {
        self.articles.lock().clone()
    }

    fn ensure_online(&self) -> ContentResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ContentError::RemoteFetch("remote store unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteContentStore for InMemoryRemote {
    async fn fetch_all(&self) -> ContentResult<Vec<Article>> {
        self.ensure_online()?;
        Ok(self.snapshot())
    }

    async fn fetch_by_slug(&self, slug: &str) -> ContentResult<Option<Article>> {
        self.ensure_online()?;
        Ok(self.articles.lock().iter().find(|a| a.slug == slug).cloned())
    }

    async fn fetch_by_category(&self, category: &str) -> ContentResult<Vec<Article>> {
        self.ensure_online()?;
        let Some(wanted) = Category::parse(category) else {
            return Ok(Vec::new());
        };
        Ok(self
            .articles
            .lock()
            .iter()
            .filter(|a| a.category == wanted)
            .cloned()
            .collect())
    }

    async fn append_comment(&self, article_id: &str, comment: &Comment) -> ContentResult<()> {
        self.ensure_online()?;
        let mut guard = self.articles.lock();
        let article = guard
            .iter_mut()
            .find(|a| a.id == article_id)
            .ok_or_else(|| ContentError::not_found("article", article_id))?;
        article.comments.push(comment.clone());
        Ok(())
    }

    async fn increment_vote(
        &self,
        article_id: &str,
        comment: &Comment,
        kind: VoteKind,
    ) -> ContentResult<u32> {
        self.ensure_online()?;
        // Same read-modify-write contract as the HTTP client: the caller's
        // copy decides the new value.
        let next = kind.count(comment).saturating_add(1);
        let mut guard = self.articles.lock();
        let stored = guard
            .iter_mut()
            .find(|a| a.id == article_id)
            .and_then(|a| a.comments.iter_mut().find(|c| c.id == comment.id))
            .ok_or_else(|| ContentError::not_found("comment", comment.id.as_str()))?;
        match kind {
            VoteKind::Like => stored.likes = next,
            VoteKind::Dislike => stored.dislikes = next,
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RemoteConfig {
        RemoteConfig::new("proj42", "production")
    }

    #[test]
    fn category_normalization_accepts_every_shape() {
        assert_eq!(normalize_category(Some(&json!("interviews"))), Category::Interviews);
        assert_eq!(normalize_category(Some(&json!({"title": "Reviews"}))), Category::Reviews);
        assert_eq!(normalize_category(Some(&json!([{"label": "Review"}]))), Category::Reviews);
        assert_eq!(normalize_category(Some(&json!("Poetry"))), Category::Blog);
        assert_eq!(normalize_category(None), Category::Blog);
    }

    #[test]
    fn tag_normalization_mixes_strings_and_objects() {
        let tags = normalize_tag_values(&[json!("Shakespeare"), json!({"label": "drama"}), json!("shakespeare")]);
        assert_eq!(tags, vec!["Shakespeare".to_string(), "drama".to_string()]);
    }

    #[test]
    fn image_url_uses_fixed_parameters_and_hotspot() {
        let image = json!({
            "asset": {"_ref": "image-abc123-1200x800-jpg"},
            "hotspot": {"x": 0.5, "y": 0.25},
        });
        let url = config().image_url(&image).expect("image url");
        assert_eq!(
            url,
            "https://cdn.sanity.io/images/proj42/production/abc123-1200x800.jpg\
             ?w=1200&fm=webp&q=80&fit=crop&crop=focalpoint&fp-x=0.500&fp-y=0.250"
        );

        let plain = config()
            .image_url(&json!({"asset": {"_ref": "image-def-10x10-png"}}))
            .expect("plain url");
        assert!(plain.ends_with("def-10x10.png?w=1200&fm=webp&q=80&fit=crop"));
        assert!(config().image_url(&json!({"asset": {"_ref": "file-xyz"}})).is_none());
    }

    #[test]
    fn normalize_handles_inconsistent_document_shapes() {
        let doc = json!({
            "_id": "post-1",
            "title": "Should Hamlet Take Prozac",
            "slug": {"current": "hamlet-prozac"},
            "category": {"title": "Interviews"},
            "author": {"name": "R. Burton"},
            "publishedAt": "2024-03-01T10:00:00Z",
            "body": [{"_type": "block", "children": [{"text": "To be"}]}],
            "tags": ["Melancholy", {"label": "Drama"}],
            "comments": [{"_key": "c1", "name": "Ophelia", "content": "Hm", "likes": -3, "dislikes": 2}],
            "mainImage": {"asset": {"_ref": "image-aa-1x1-jpg"}, "caption": "Elsinore"},
        });
        let article = normalize(doc, &config()).expect("normalize");
        assert_eq!(article.slug, "hamlet-prozac");
        assert_eq!(article.category, Category::Interviews);
        assert_eq!(article.author, "R. Burton");
        assert_eq!(article.date, "March 1, 2024");
        assert_eq!(article.status, ArticleStatus::Published);
        assert_eq!(article.content.plain_text(), "To be");
        assert_eq!(article.tags, vec!["Melancholy".to_string(), "Drama".to_string()]);
        assert_eq!(article.comments[0].likes, 0);
        assert_eq!(article.comments[0].dislikes, 2);
        assert_eq!(article.image_caption.as_deref(), Some("Elsinore"));
    }

    #[test]
    fn normalize_derives_slug_and_sanitizes_html() {
        let doc = json!({
            "_id": "post-2",
            "title": "A Review of Nothing",
            "category": "review",
            "content": "<p>ok</p><script>bad()</script>",
            "publishedAt": "2024-05-02",
        });
        let article = normalize(doc, &config()).expect("normalize");
        assert_eq!(article.slug, "a-review-of-nothing");
        assert_eq!(article.category, Category::Reviews);
        assert_eq!(article.content, ArticleContent::Html("<p>ok</p>".to_string()));
        assert!(article.published_at.is_some());
    }

    #[test]
    fn normalize_requires_an_id() {
        let err = normalize(json!({"title": "orphan"}), &config()).expect_err("no id");
        assert!(matches!(err, ContentError::Validation(_)));
    }
}
