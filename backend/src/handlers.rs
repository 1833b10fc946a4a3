use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Json, Redirect},
};
use chrono::{DateTime, Utc};
use hlc_shared::{
    comments::{NewComment, VoteKind},
    sync::Source,
    Article, ArticleContent, ArticleListItem, ArticleStatus, Category, Comment, ContentError,
    Page,
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct ArticleQuery {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleListItem>,
    pub total: usize,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Explicit confirmation for irreversible admin actions.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize)]
pub struct PublishByTitleRequest {
    pub title: String,
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub kind: VoteKind,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub comment_id: String,
    pub kind: VoteKind,
    pub value: u32,
}

#[derive(Debug, Serialize)]
pub struct PublishDueResponse {
    pub published: Vec<ArticleListItem>,
    pub total: usize,
}

/// Author-editable article fields. When `id` names an existing article the
/// input is applied on top of it, keeping comments and publication dates.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleInput {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: ArticleContent,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_caption: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

impl ArticleInput {
    fn into_article(self, existing: Option<Article>) -> Result<Article, ContentError> {
        let category = match self.category.as_deref() {
            Some(raw) => Category::parse(raw)
                .ok_or_else(|| ContentError::Validation(format!("unknown category `{raw}`")))?,
            None => existing.as_ref().map(|a| a.category).unwrap_or_default(),
        };
        let mut article = existing.unwrap_or_else(|| Article::new(String::new(), ArticleContent::default()));
        if let Some(id) = self.id {
            article.id = id;
        }
        if let Some(slug) = self.slug {
            article.slug = slug;
        }
        article.title = self.title;
        article.content = self.content;
        article.excerpt = self.excerpt;
        article.category = category;
        article.author = self.author;
        article.tags = self.tags;
        article.image = self.image;
        article.image_caption = self.image_caption;
        article.featured = self.featured;
        Ok(article)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInput {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
}

fn content_error(err: ContentError) -> ApiError {
    let status = match err {
        ContentError::Validation(_) => StatusCode::BAD_REQUEST,
        ContentError::NotFound { .. } => StatusCode::NOT_FOUND,
        ContentError::SystemPage(_) => StatusCode::FORBIDDEN,
        ContentError::RemoteFetch(_) => StatusCode::BAD_GATEWAY,
        ContentError::Persistence(_) | ContentError::Serialization(_) | ContentError::Io(_) => {
            return internal_error("Failed to persist content", err);
        },
    };
    tracing::warn!(status = status.as_u16(), "request rejected: {err}");
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: status.as_u16(),
        }),
    )
}

fn internal_error(message: &str, err: impl std::fmt::Display) -> ApiError {
    tracing::error!("{}: {}", message, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.to_string(),
            code: 500,
        }),
    )
}

fn bad_request(message: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message,
            code: 400,
        }),
    )
}

fn require_confirmation(confirmed: bool, action: &str) -> Result<(), ApiError> {
    if confirmed {
        return Ok(());
    }
    Err((
        StatusCode::PRECONDITION_REQUIRED,
        Json(ErrorResponse {
            error: format!("{action} requires {{\"confirm\": true}}"),
            code: StatusCode::PRECONDITION_REQUIRED.as_u16(),
        }),
    ))
}

fn parse_partition(raw: &str) -> Result<ArticleStatus, ApiError> {
    raw.parse::<ArticleStatus>().map_err(bad_request)
}

// ---- public ----

pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ArticleQuery>,
) -> ApiResult<ArticleListResponse> {
    let loaded = state.published_articles().await;

    let category = match query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(raw) => Some(Category::parse(raw).ok_or_else(|| bad_request(format!("unknown category `{raw}`")))?),
        None => None,
    };
    let tag = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(str::to_lowercase);

    let articles: Vec<ArticleListItem> = loaded
        .value
        .iter()
        .filter(|article| category.map_or(true, |wanted| article.category == wanted))
        .filter(|article| {
            tag.as_ref()
                .map_or(true, |wanted| article.tags.iter().any(|t| t.to_lowercase() == *wanted))
        })
        .map(ArticleListItem::from)
        .collect();
    let total = articles.len();

    Ok(Json(ArticleListResponse {
        articles,
        total,
        source: loaded.source,
        warning: loaded.warning,
    }))
}

pub async fn get_article(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<Article> {
    let loaded = state.sync().load_by_slug(&slug).await;
    if let Some(warning) = &loaded.warning {
        tracing::debug!(slug, "{warning}");
    }
    loaded
        .value
        .map(Json)
        .ok_or_else(|| content_error(ContentError::NotFound {
            what: "article",
            key: slug,
        }))
}

/// Old article links moved from `/article/:slug` to `/articles/:slug`.
pub async fn legacy_article_redirect(Path(slug): Path<String>) -> Redirect {
    Redirect::permanent(&format!("/articles/{slug}"))
}

pub async fn list_pages(State(state): State<AppState>) -> ApiResult<Vec<Page>> {
    Ok(Json(state.lifecycle().lock().await.store().pages().to_vec()))
}

pub async fn get_page(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<Page> {
    state
        .lifecycle()
        .lock()
        .await
        .store()
        .page_by_slug(&slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| content_error(ContentError::NotFound {
            what: "page",
            key: slug,
        }))
}

pub async fn submit_comment(
    State(state): State<AppState>,
    Path(article_id): Path<String>,
    Json(input): Json<NewComment>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state
        .sync()
        .submit_comment(&article_id, input)
        .await
        .map_err(content_error)?;
    tracing::info!(article_id, comment_id = %comment.id, "comment submitted");
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn vote_comment(
    State(state): State<AppState>,
    Path((article_id, comment_id)): Path<(String, String)>,
    Json(request): Json<VoteRequest>,
) -> ApiResult<VoteResponse> {
    let value = state
        .sync()
        .vote(&article_id, &comment_id, request.kind)
        .await
        .map_err(content_error)?;
    Ok(Json(VoteResponse {
        comment_id,
        kind: request.kind,
        value,
    }))
}

// ---- admin ----

pub async fn admin_list_partition(
    State(state): State<AppState>,
    Path(partition): Path<String>,
) -> ApiResult<ArticleListResponse> {
    let partition = parse_partition(&partition)?;
    let articles: Vec<ArticleListItem> = state
        .lifecycle()
        .lock()
        .await
        .store()
        .partition(partition)
        .iter()
        .map(ArticleListItem::from)
        .collect();
    let total = articles.len();
    Ok(Json(ArticleListResponse {
        articles,
        total,
        source: Source::Local,
        warning: None,
    }))
}

pub async fn save_draft(
    State(state): State<AppState>,
    Json(input): Json<ArticleInput>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    let mut lifecycle = state.lifecycle().lock().await;
    let existing = input
        .id
        .as_deref()
        .and_then(|id| lifecycle.store().find(id))
        .map(|(_, article)| article.clone());
    let created = existing.is_none();
    let article = input.into_article(existing).map_err(content_error)?;
    let saved = lifecycle.save_draft(article).map_err(content_error)?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(saved)))
}

pub async fn schedule_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ScheduleRequest>,
) -> ApiResult<Article> {
    let mut lifecycle = state.lifecycle().lock().await;
    let article = lifecycle
        .store()
        .find(&id)
        .map(|(_, article)| article.clone())
        .ok_or_else(|| content_error(ContentError::NotFound {
            what: "article",
            key: id.clone(),
        }))?;
    lifecycle
        .schedule(article, request.at)
        .map(Json)
        .map_err(content_error)
}

pub async fn publish_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    confirm: Option<Json<ConfirmRequest>>,
) -> ApiResult<Article> {
    require_confirmation(confirm.is_some_and(|Json(c)| c.confirm), "publishing")?;
    state
        .lifecycle()
        .lock()
        .await
        .publish(&id)
        .map(Json)
        .map_err(content_error)
}

pub async fn publish_by_title(
    State(state): State<AppState>,
    Json(request): Json<PublishByTitleRequest>,
) -> ApiResult<Article> {
    require_confirmation(request.confirm, "publishing")?;
    state
        .lifecycle()
        .lock()
        .await
        .publish_by_title(&request.title)
        .map(Json)
        .map_err(content_error)
}

pub async fn delete_article(
    State(state): State<AppState>,
    Path((partition, id)): Path<(String, String)>,
    confirm: Option<Json<ConfirmRequest>>,
) -> ApiResult<Article> {
    let partition = parse_partition(&partition)?;
    require_confirmation(confirm.is_some_and(|Json(c)| c.confirm), "deleting")?;
    state
        .lifecycle()
        .lock()
        .await
        .delete(&id, partition)
        .map(Json)
        .map_err(content_error)
}

pub async fn publish_due(State(state): State<AppState>) -> ApiResult<PublishDueResponse> {
    let published = state
        .lifecycle()
        .lock()
        .await
        .publish_due(Utc::now())
        .map_err(content_error)?;
    let published: Vec<ArticleListItem> = published.iter().map(ArticleListItem::from).collect();
    let total = published.len();
    Ok(Json(PublishDueResponse { published, total }))
}

pub async fn save_page(State(state): State<AppState>, Json(input): Json<PageInput>) -> ApiResult<Page> {
    let mut lifecycle = state.lifecycle().lock().await;
    let existing = input
        .id
        .as_deref()
        .and_then(|id| lifecycle.store().page(id))
        .cloned();
    let page = Page {
        id: input.id.unwrap_or_default(),
        title: input.title,
        slug: input
            .slug
            .or_else(|| existing.as_ref().map(|page| page.slug.clone()))
            .unwrap_or_default(),
        content: input.content,
        last_updated: Utc::now(),
        is_system: existing.is_some_and(|page| page.is_system),
    };
    lifecycle.save_page(page).map(Json).map_err(content_error)
}

pub async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    confirm: Option<Json<ConfirmRequest>>,
) -> ApiResult<Page> {
    require_confirmation(confirm.is_some_and(|Json(c)| c.confirm), "deleting")?;
    state
        .lifecycle()
        .lock()
        .await
        .delete_page(&id)
        .map(Json)
        .map_err(content_error)
}
