use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use ordergate_core::AppConfig;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Outcome of checking a request's `Origin` header against the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OriginDecision {
    /// Origin matched an allow-list entry: echo it and mark `Vary: Origin`.
    Echo(String),
    /// Allow-list is empty; every origin is accepted.
    Permissive,
    /// No `Origin` header — a non-browser caller, allowed without echoing.
    NoOrigin,
    /// Origin present but not allowed; blocked before routing.
    Reject,
}

/// Origin allow-list settings used by the gate middleware.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: Arc<Vec<String>>,
}

impl OriginPolicy {
    #[must_use]
    pub fn new(allowed: Vec<String>) -> Self {
        Self {
            allowed: Arc::new(allowed),
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.allowed_origins.clone())
    }

    /// An empty allow-list accepts every origin. Intended for local testing;
    /// unsafe in production.
    #[must_use]
    pub fn is_permissive(&self) -> bool {
        self.allowed.is_empty()
    }

    fn decide(&self, origin: Option<&str>) -> OriginDecision {
        let Some(origin) = origin else {
            return OriginDecision::NoOrigin;
        };
        if self.allowed.is_empty() {
            return OriginDecision::Permissive;
        }
        let trimmed = origin.trim_end_matches('/');
        if self.allowed.iter().any(|allowed| allowed == trimmed) {
            OriginDecision::Echo(origin.to_owned())
        } else {
            OriginDecision::Reject
        }
    }
}

/// Middleware gating every request on its `Origin` header.
///
/// Rejected requests answer 403 with no body and never reach a handler.
/// `OPTIONS` preflights short-circuit with a success status and no body.
/// Every response, rejected ones included, advertises the permitted methods
/// and headers.
pub async fn enforce_origin(
    State(policy): State<OriginPolicy>,
    req: Request,
    next: Next,
) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let decision = policy.decide(origin.as_deref());

    let mut response = match &decision {
        OriginDecision::Reject => {
            tracing::warn!(
                origin = origin.as_deref().unwrap_or_default(),
                "request blocked: origin not in allow-list"
            );
            StatusCode::FORBIDDEN.into_response()
        }
        _ if req.method() == Method::OPTIONS => StatusCode::OK.into_response(),
        _ => next.run(req).await,
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );

    match decision {
        OriginDecision::Echo(origin) => {
            if let Ok(value) = HeaderValue::from_str(&origin) {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
                headers.append(header::VARY, HeaderValue::from_static("Origin"));
            }
        }
        OriginDecision::Permissive => {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
        }
        OriginDecision::NoOrigin | OriginDecision::Reject => {}
    }

    response
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}
