use std::{collections::HashMap, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use reactviews::{Rendered, ViewEngines, ViewError};
use serde_json::{json, Value};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Create the application router.
pub fn create_app(engines: ViewEngines) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/{*page}", get(page))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(engines)
}

/// Query parameters become the request-scoped locals.
fn locals(page: &str, query: HashMap<String, String>) -> Value {
    json!({ "page": page, "query": query })
}

async fn index(
    State(engines): State<ViewEngines>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Rendered, ViewError> {
    engines.render("index", locals("index", query)).await
}

async fn page(
    State(engines): State<ViewEngines>,
    Path(page): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Rendered, ViewError> {
    let locals = locals(&page, query);
    engines.render(&page, locals).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use reactviews::{RenderOptions, Settings, ViewEngine};
    use tower::ServiceExt;

    /// Renders the locals it receives as JSON.
    struct EchoEngine;

    impl ViewEngine for EchoEngine {
        fn render_view(
            &self,
            file_path: &std::path::Path,
            options: &RenderOptions,
        ) -> reactviews::Result<String> {
            let name = file_path.file_name().unwrap().to_string_lossy();
            Ok(format!("{name} {}", options.locals))
        }
    }

    fn demo_views() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("views")
    }

    async fn get_page(uri: &str) -> (StatusCode, String) {
        let engines = ViewEngines::new(Settings::new(demo_views())).engine("jsx", EchoEngine);
        let response = create_app(engines)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_index_renders_index_view() {
        let (status, body) = get_page("/?name=ada").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"index.jsx {"page":"index","query":{"name":"ada"}}"#);
    }

    #[tokio::test]
    async fn test_page_renders_named_view() {
        let (status, body) = get_page("/about").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"about.jsx {"page":"about","query":{}}"#);
    }

    #[tokio::test]
    async fn test_missing_page() {
        let (status, body) = get_page("/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "View not found");
    }
}
