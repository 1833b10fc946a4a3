use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::{handlers, request_context, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Article routes share one parameter name per segment: `:key` is a
    // partition or an id depending on the route.
    let admin = Router::new()
        .route("/articles/:key", get(handlers::admin_list_partition))
        .route("/articles/:key/:id", delete(handlers::delete_article))
        .route("/drafts", post(handlers::save_draft))
        .route("/articles/:key/schedule", post(handlers::schedule_article))
        .route("/articles/:key/publish", post(handlers::publish_article))
        .route("/publish-by-title", post(handlers::publish_by_title))
        .route("/publish-due", post(handlers::publish_due))
        .route("/pages", put(handlers::save_page))
        .route("/pages/:id", delete(handlers::delete_page));

    Router::new()
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/articles/:article", get(handlers::get_article))
        .route("/api/articles/:article/comments", post(handlers::submit_comment))
        .route(
            "/api/articles/:article/comments/:comment_id/vote",
            post(handlers::vote_comment),
        )
        .route("/articles/:slug", get(handlers::get_article))
        .route("/article/:slug", get(handlers::legacy_article_redirect))
        .route("/api/pages", get(handlers::list_pages))
        .route("/api/pages/:slug", get(handlers::get_page))
        .nest("/api/admin", admin)
        .with_state(state)
        .layer(middleware::from_fn(request_context::request_id_middleware))
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use hlc_shared::{
        content_store::ContentStore,
        lifecycle::Lifecycle,
        local_store::LocalStore,
        remote::{InMemoryRemote, RemoteContentStore},
        sync::ContentSync,
        Article, ArticleStatus,
    };
    use serde_json::{json, Value};
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    use super::*;

    async fn app_with(remote: Option<Arc<dyn RemoteContentStore>>) -> (Router, AppState) {
        let store = ContentStore::load(LocalStore::in_memory()).expect("store");
        let lifecycle = Arc::new(Mutex::new(Lifecycle::new(store)));
        let state = AppState::new(ContentSync::new(lifecycle, remote)).await;
        (create_router(state.clone()), state)
    }

    async fn app() -> (Router, AppState) {
        app_with(None).await
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        app.clone().oneshot(request).await.expect("response")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    async fn create_draft(app: &Router, title: &str) -> Value {
        let response = send(
            app,
            Method::POST,
            "/api/admin/drafts",
            Some(json!({"title": title, "content": "<p>body</p>", "tags": ["Drama"]})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    #[tokio::test]
    async fn legacy_article_path_redirects_permanently() {
        let (app, _) = app().await;
        let response = send(&app, Method::GET, "/article/hamlet-prozac", None).await;
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
            Some("/articles/hamlet-prozac")
        );
    }

    #[tokio::test]
    async fn publish_requires_confirmation() {
        let (app, state) = app().await;
        let draft = create_draft(&app, "Unconfirmed").await;
        let id = draft["id"].as_str().expect("id").to_string();
        let uri = format!("/api/admin/articles/{id}/publish");

        let response = send(&app, Method::POST, &uri, None).await;
        assert_eq!(response.status(), StatusCode::PRECONDITION_REQUIRED);
        let response = send(&app, Method::POST, &uri, Some(json!({"confirm": false}))).await;
        assert_eq!(response.status(), StatusCode::PRECONDITION_REQUIRED);
        assert_eq!(
            state.lifecycle().lock().await.store().partitions_of(&id),
            vec![ArticleStatus::Draft]
        );

        let response = send(&app, Method::POST, &uri, Some(json!({"confirm": true}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            state.lifecycle().lock().await.store().partitions_of(&id),
            vec![ArticleStatus::Published]
        );
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let (app, state) = app().await;
        let draft = create_draft(&app, "Doomed").await;
        let id = draft["id"].as_str().expect("id").to_string();
        let uri = format!("/api/admin/articles/draft/{id}");

        let response = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(response.status(), StatusCode::PRECONDITION_REQUIRED);
        assert_eq!(state.lifecycle().lock().await.store().partition(ArticleStatus::Draft).len(), 1);

        let response = send(&app, Method::DELETE, &uri, Some(json!({"confirm": true}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.lifecycle().lock().await.store().partition(ArticleStatus::Draft).is_empty());
    }

    #[tokio::test]
    async fn published_list_reflects_new_publications() {
        let (app, _) = app().await;
        let listed = json_body(send(&app, Method::GET, "/api/articles", None).await).await;
        assert_eq!(listed["total"], 0);
        assert_eq!(listed["source"], "local");

        create_draft(&app, "Should Hamlet Take Prozac").await;
        let response = send(
            &app,
            Method::POST,
            "/api/admin/publish-by-title",
            Some(json!({"title": "should hamlet take prozac", "confirm": true})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let listed = json_body(send(&app, Method::GET, "/api/articles?tag=drama", None).await).await;
        assert_eq!(listed["total"], 1);
        let slug = listed["articles"][0]["slug"].as_str().expect("slug").to_string();

        let response = send(&app, Method::GET, &format!("/articles/{slug}"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&app, Method::GET, "/api/articles?category=reviews", None).await;
        assert_eq!(json_body(response).await["total"], 0);

        let again = send(
            &app,
            Method::POST,
            "/api/admin/publish-by-title",
            Some(json!({"title": "Should Hamlet Take Prozac", "confirm": true})),
        )
        .await;
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(again).await["code"], 404);
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let (app, _) = app().await;
        let response = send(
            &app,
            Method::POST,
            "/api/admin/drafts",
            Some(json!({"title": "", "content": "<p>x</p>"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, Method::GET, "/api/articles/ghost", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &app,
            Method::DELETE,
            "/api/admin/pages/page-about",
            Some(json!({"confirm": true})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(&app, Method::GET, "/api/admin/articles/archive", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn comments_and_votes_round_trip() {
        let (app, state) = app().await;
        let article = state
            .lifecycle()
            .lock()
            .await
            .create_published(Article::new("Open thread", "<p>talk</p>"))
            .expect("publish");

        let uri = format!("/api/articles/{}/comments", article.id);
        let response = send(&app, Method::POST, &uri, Some(json!({"name": " ", "content": "hi"}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({"name": "Horatio", "content": "Good night, sweet prince"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let comment = json_body(response).await;
        let comment_id = comment["id"].as_str().expect("comment id");

        let vote_uri = format!("/api/articles/{}/comments/{comment_id}/vote", article.id);
        let response = send(&app, Method::POST, &vote_uri, Some(json!({"kind": "like"}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["value"], 1);
    }

    #[tokio::test]
    async fn drafts_are_closed_to_reader_comments() {
        let (app, _) = app().await;
        let draft = create_draft(&app, "Closed thread").await;
        let uri = format!("/api/articles/{}/comments", draft["id"].as_str().expect("id"));
        let response = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({"name": "Ghost", "content": "Remember me"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_html_is_sanitized_before_it_goes_public() {
        let (app, _) = app().await;
        let response = send(
            &app,
            Method::POST,
            "/api/admin/drafts",
            Some(json!({
                "title": "Injected",
                "content": "<p>ok</p><script>alert(1)</script><img src=\"x\" onerror=\"alert(2)\">",
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let draft = json_body(response).await;
        let id = draft["id"].as_str().expect("id");
        let response = send(
            &app,
            Method::POST,
            &format!("/api/admin/articles/{id}/publish"),
            Some(json!({"confirm": true})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let slug = draft["slug"].as_str().expect("slug");
        let article = json_body(send(&app, Method::GET, &format!("/api/articles/{slug}"), None).await).await;
        let body = article["content"].as_str().expect("html body");
        assert!(body.contains("<p>ok</p>"));
        assert!(!body.contains("<script"));
        assert!(!body.contains("onerror"));
    }

    #[tokio::test]
    async fn remote_outage_serves_fallback_with_warning() {
        let remote = Arc::new(InMemoryRemote::default());
        remote.set_offline(true);
        let (app, _) = app_with(Some(remote)).await;
        let response = send(&app, Method::GET, "/api/articles", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["source"], "fallback");
        assert!(body["warning"].is_string());
    }

    #[tokio::test]
    async fn pages_can_be_saved_and_read_by_slug() {
        let (app, _) = app().await;
        let response = send(
            &app,
            Method::PUT,
            "/api/admin/pages",
            Some(json!({"title": "Masthead", "content": "<p>Editors</p>"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, Method::GET, "/api/pages/masthead", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["title"], "Masthead");

        let pages = json_body(send(&app, Method::GET, "/api/pages", None).await).await;
        assert_eq!(pages.as_array().map(Vec::len), Some(4));
    }
}
