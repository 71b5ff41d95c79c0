use thiserror::Error;

/// Errors surfaced by the Admin API clients.
///
/// Messages are safe to log and (optionally) forward to clients: they never
/// contain the access token, and request URLs are stripped from transport
/// errors so the admin endpoint is not echoed either.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("unexpected HTTP status {status} from the admin API during {context}")]
    Status { status: u16, context: String },

    /// The API answered 2xx but reported an application-level error list.
    #[error("admin API error: {0}")]
    Api(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid admin API base URL: {0}")]
    BaseUrl(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(error: reqwest::Error) -> Self {
        // The URL would name the private admin endpoint in surfaced messages.
        Self::Http(error.without_url())
    }
}
