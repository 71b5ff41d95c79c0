mod lookup;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use ordergate_core::{AppConfig, Environment};
use ordergate_shopify::AdminClient;

use crate::middleware::{enforce_origin, request_id, OriginPolicy};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// `None` when `SHOP`/`ADMIN_TOKEN` are not configured; lookups then
    /// answer "server not configured".
    pub client: Option<Arc<AdminClient>>,
}

/// Error taxonomy at the handler boundary. Every variant renders as JSON
/// with a leading `ok: false` discriminator.
#[derive(Debug)]
pub enum LookupError {
    Validation(String),
    NotConfigured,
    OrderNotFound,
    ItemsNotFound,
    Upstream(String),
}

impl LookupError {
    fn status(&self) -> StatusCode {
        match self {
            LookupError::Validation(_) => StatusCode::BAD_REQUEST,
            LookupError::OrderNotFound | LookupError::ItemsNotFound => StatusCode::NOT_FOUND,
            LookupError::NotConfigured | LookupError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(self) -> String {
        match self {
            LookupError::Validation(message) | LookupError::Upstream(message) => message,
            LookupError::NotConfigured => "server not configured".to_owned(),
            LookupError::OrderNotFound => "order not found".to_owned(),
            LookupError::ItemsNotFound => "no products found on that order".to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    ok: bool,
    error: String,
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorBody {
                ok: false,
                error: self.message(),
            }),
        )
            .into_response()
    }
}

pub fn build_app(state: AppState, policy: OriginPolicy) -> Router {
    let mut router = Router::new()
        .route("/", get(liveness))
        .route("/order-lookup", post(lookup::order_lookup));

    // Operational introspection; not mounted in production.
    if state.config.env != Environment::Production {
        router = router.route("/debug/origins", get(debug_origins));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(from_fn(request_id))
                .layer(from_fn_with_state(policy, enforce_origin)),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct LivenessBody {
    ok: bool,
    service: &'static str,
    version: &'static str,
}

async fn liveness() -> impl IntoResponse {
    Json(LivenessBody {
        ok: true,
        service: "ordergate",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
struct DebugOriginsBody {
    ok: bool,
    allowed: Vec<String>,
    shop: Option<String>,
    version: String,
}

async fn debug_origins(State(state): State<AppState>) -> impl IntoResponse {
    Json(DebugOriginsBody {
        ok: true,
        allowed: state.config.allowed_origins.clone(),
        shop: state.config.shop.clone(),
        version: state.config.admin_version.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use ordergate_core::{Backend, MatchMode};
    use ordergate_shopify::RestClient;

    fn test_config(match_mode: MatchMode) -> AppConfig {
        AppConfig {
            shop: Some("demo.myshopify.com".to_string()),
            admin_token: Some("test-token".to_string()),
            admin_version: "2025-07".to_string(),
            allowed_origins: vec![],
            port: 0,
            env: Environment::Test,
            log_level: "info".to_string(),
            backend: Backend::Rest,
            match_mode,
            upstream_timeout_secs: 5,
            expose_upstream_errors: false,
        }
    }

    fn app(server_uri: &str, config: AppConfig) -> Router {
        let policy = OriginPolicy::new(config.allowed_origins.clone());
        let client = RestClient::with_base_url(
            "test-token",
            5,
            &format!("{server_uri}/admin/api/2025-07"),
        )
        .expect("failed to build test RestClient");
        build_app(
            AppState {
                config: Arc::new(config),
                client: Some(Arc::new(AdminClient::Rest(client))),
            },
            policy,
        )
    }

    fn lookup_request(body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/order-lookup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("failed to build request")
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    fn matching_order_json() -> Value {
        json!({
            "orders": [{
                "id": 820_982_911,
                "name": "LS74193",
                "order_number": 74_193,
                "shipping_address": { "zip": "SW1A 1AA" },
                "fulfillments": [{
                    "tracking_numbers": ["A"],
                    "tracking_urls": ["u1"],
                    "tracking_company": "Royal Mail"
                }],
                "line_items": [{ "title": "Signet Ring", "sku": "RING-01", "product_id": null }]
            }]
        })
    }

    #[tokio::test]
    async fn successful_lookup_returns_tracking_and_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-07/orders.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&matching_order_json()))
            .mount(&server)
            .await;

        let response = app(&server.uri(), test_config(MatchMode::Strict))
            .oneshot(lookup_request(json!({
                "orderCode": "LS74193",
                "postcode": "SW1A 1AA"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["order"]["name"], "LS74193");
        assert_eq!(body["order"]["orderNumber"], 74_193);
        assert_eq!(body["order"]["tracking"][0]["number"], "A");
        assert_eq!(body["order"]["tracking"][0]["url"], "u1");
        assert_eq!(body["order"]["tracking"][0]["company"], "Royal Mail");
        assert_eq!(body["items"][0]["title"], "Signet Ring");
        assert_eq!(body["items"][0]["skus"][0], "RING-01");
    }

    #[tokio::test]
    async fn missing_postcode_is_400_without_any_upstream_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-07/orders.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&matching_order_json()))
            .expect(0)
            .mount(&server)
            .await;

        let response = app(&server.uri(), test_config(MatchMode::Strict))
            .oneshot(lookup_request(json!({ "orderCode": "LS74193" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "postcode is required");
    }

    #[tokio::test]
    async fn whitespace_only_order_code_is_400() {
        let server = MockServer::start().await;
        let response = app(&server.uri(), test_config(MatchMode::Strict))
            .oneshot(lookup_request(json!({ "orderCode": "  ", "postcode": "SW1A 1AA" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "orderCode is required");
    }

    #[tokio::test]
    async fn strict_mode_reports_not_found_without_postcode_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-07/orders.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&matching_order_json()))
            .mount(&server)
            .await;

        let response = app(&server.uri(), test_config(MatchMode::Strict))
            .oneshot(lookup_request(json!({
                "orderCode": "LS74193",
                "postcode": "EC1A 1BB"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "order not found");
    }

    #[tokio::test]
    async fn lenient_mode_falls_back_to_first_candidate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-07/orders.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&matching_order_json()))
            .mount(&server)
            .await;

        let response = app(&server.uri(), test_config(MatchMode::Lenient))
            .oneshot(lookup_request(json!({
                "orderCode": "LS74193",
                "postcode": "EC1A 1BB"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["order"]["name"], "LS74193");
    }

    #[tokio::test]
    async fn order_without_items_is_a_distinct_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-07/orders.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
                "orders": [{
                    "id": 1,
                    "name": "LS74193",
                    "shipping_address": { "zip": "SW1A 1AA" },
                    "line_items": []
                }]
            })))
            .mount(&server)
            .await;

        let response = app(&server.uri(), test_config(MatchMode::Strict))
            .oneshot(lookup_request(json!({
                "orderCode": "LS74193",
                "postcode": "SW1A 1AA"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "no products found on that order");
    }

    #[tokio::test]
    async fn upstream_failure_is_masked_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-07/orders.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let response = app(&server.uri(), test_config(MatchMode::Strict))
            .oneshot(lookup_request(json!({
                "orderCode": "LS74193",
                "postcode": "SW1A 1AA"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "server error");
    }

    #[tokio::test]
    async fn upstream_failure_detail_is_forwarded_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-07/orders.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut config = test_config(MatchMode::Strict);
        config.expose_upstream_errors = true;

        let response = app(&server.uri(), config)
            .oneshot(lookup_request(json!({
                "orderCode": "LS74193",
                "postcode": "SW1A 1AA"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("500"), "expected upstream detail: {message}");
    }

    #[tokio::test]
    async fn missing_credentials_answer_server_not_configured() {
        let mut config = test_config(MatchMode::Strict);
        config.shop = None;
        config.admin_token = None;
        let router = build_app(
            AppState {
                config: Arc::new(config),
                client: None,
            },
            OriginPolicy::new(vec![]),
        );

        let response = router
            .oneshot(lookup_request(json!({
                "orderCode": "LS74193",
                "postcode": "SW1A 1AA"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "server not configured");
    }

    #[tokio::test]
    async fn disallowed_origin_is_rejected_before_the_handler() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-07/orders.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&matching_order_json()))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = test_config(MatchMode::Strict);
        config.allowed_origins = vec!["https://shop.example".to_string()];

        let mut request = lookup_request(json!({
            "orderCode": "LS74193",
            "postcode": "SW1A 1AA"
        }));
        request
            .headers_mut()
            .insert(header::ORIGIN, "https://evil.example".parse().unwrap());

        let response = app(&server.uri(), config).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
        // Methods are still advertised on rejected responses.
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .is_some());
    }

    #[tokio::test]
    async fn allowed_origin_is_echoed_with_vary_marker() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-07/orders.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&matching_order_json()))
            .mount(&server)
            .await;

        let mut config = test_config(MatchMode::Strict);
        config.allowed_origins = vec!["https://shop.example".to_string()];

        let mut request = lookup_request(json!({
            "orderCode": "LS74193",
            "postcode": "SW1A 1AA"
        }));
        request
            .headers_mut()
            .insert(header::ORIGIN, "https://shop.example".parse().unwrap());

        let response = app(&server.uri(), config).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "https://shop.example"
        );
        assert_eq!(response.headers().get(header::VARY).unwrap(), "Origin");
    }

    #[tokio::test]
    async fn permissive_mode_answers_wildcard_origin() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-07/orders.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&matching_order_json()))
            .mount(&server)
            .await;

        let mut request = lookup_request(json!({
            "orderCode": "LS74193",
            "postcode": "SW1A 1AA"
        }));
        request
            .headers_mut()
            .insert(header::ORIGIN, "https://anywhere.example".parse().unwrap());

        let response = app(&server.uri(), test_config(MatchMode::Strict))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn preflight_short_circuits_with_no_body() {
        let server = MockServer::start().await;
        let mut config = test_config(MatchMode::Strict);
        config.allowed_origins = vec!["https://shop.example".to_string()];

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/order-lookup")
            .header(header::ORIGIN, "https://shop.example")
            .body(Body::empty())
            .unwrap();

        let response = app(&server.uri(), config).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_METHODS)
                .unwrap(),
            "GET, POST, OPTIONS"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn liveness_answers_ok() {
        let server = MockServer::start().await;
        let request = Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(Body::empty())
            .unwrap();

        let response = app(&server.uri(), test_config(MatchMode::Strict))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["service"], "ordergate");
    }

    #[tokio::test]
    async fn debug_origins_reports_configuration_outside_production() {
        let server = MockServer::start().await;
        let mut config = test_config(MatchMode::Strict);
        config.allowed_origins = vec!["https://shop.example".to_string()];

        let request = Request::builder()
            .method(Method::GET)
            .uri("/debug/origins")
            .body(Body::empty())
            .unwrap();

        let response = app(&server.uri(), config).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["allowed"][0], "https://shop.example");
        assert_eq!(body["shop"], "demo.myshopify.com");
        assert_eq!(body["version"], "2025-07");
    }

    #[tokio::test]
    async fn debug_origins_is_not_mounted_in_production() {
        let server = MockServer::start().await;
        let mut config = test_config(MatchMode::Strict);
        config.env = Environment::Production;

        let request = Request::builder()
            .method(Method::GET)
            .uri("/debug/origins")
            .body(Body::empty())
            .unwrap();

        let response = app(&server.uri(), config).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn lookup_error_statuses_match_the_taxonomy() {
        assert_eq!(
            LookupError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LookupError::NotConfigured.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(LookupError::OrderNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(LookupError::ItemsNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            LookupError::Upstream("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
