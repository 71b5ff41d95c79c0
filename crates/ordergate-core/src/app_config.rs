use crate::resolve::MatchMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Upstream Admin API protocol the proxy talks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Rest,
    Graphql,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Rest => write!(f, "rest"),
            Backend::Graphql => write!(f, "graphql"),
        }
    }
}

/// Immutable process configuration, built once at startup and passed
/// explicitly to every component that needs it.
///
/// `shop` and `admin_token` are optional on purpose: their absence does not
/// fail startup, it turns every lookup into a 500 "server not configured"
/// response.
#[derive(Clone)]
pub struct AppConfig {
    pub shop: Option<String>,
    pub admin_token: Option<String>,
    pub admin_version: String,
    pub allowed_origins: Vec<String>,
    pub port: u16,
    pub env: Environment,
    pub log_level: String,
    pub backend: Backend,
    pub match_mode: MatchMode,
    pub upstream_timeout_secs: u64,
    pub expose_upstream_errors: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("shop", &self.shop)
            .field(
                "admin_token",
                &self.admin_token.as_ref().map(|_| "[redacted]"),
            )
            .field("admin_version", &self.admin_version)
            .field("allowed_origins", &self.allowed_origins)
            .field("port", &self.port)
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("backend", &self.backend)
            .field("match_mode", &self.match_mode)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("expose_upstream_errors", &self.expose_upstream_errors)
            .finish()
    }
}
