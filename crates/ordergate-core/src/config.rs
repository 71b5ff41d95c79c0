use crate::app_config::{AppConfig, Backend, Environment};
use crate::resolve::MatchMode;
use crate::ConfigError;

/// Admin API version used when `ADMIN_VERSION` is not set.
pub const DEFAULT_ADMIN_VERSION: &str = "2025-07";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a recognized env var holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a recognized env var holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u16 = |var: &str, default: &str| -> Result<u16, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u16>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<bool>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let shop = optional("SHOP").map(|raw| parse_shop(&raw)).transpose()?;
    let admin_token = optional("ADMIN_TOKEN");
    let admin_version = or_default("ADMIN_VERSION", DEFAULT_ADMIN_VERSION);
    let allowed_origins = parse_origin_list(&or_default("ALLOWED_ORIGIN", ""));
    let port = parse_u16("PORT", "3000")?;

    let env = parse_environment(&or_default("ORDERGATE_ENV", "development"));
    let log_level = or_default("ORDERGATE_LOG_LEVEL", "info");
    let backend = parse_backend(&or_default("ORDERGATE_BACKEND", "rest"))?;
    let match_mode = parse_match_mode(&or_default("ORDERGATE_MATCH_MODE", "strict"))?;
    let upstream_timeout_secs = parse_u64("ORDERGATE_UPSTREAM_TIMEOUT_SECS", "10")?;
    let expose_upstream_errors = parse_bool("ORDERGATE_EXPOSE_UPSTREAM_ERRORS", "false")?;

    Ok(AppConfig {
        shop,
        admin_token,
        admin_version,
        allowed_origins,
        port,
        env,
        log_level,
        backend,
        match_mode,
        upstream_timeout_secs,
        expose_upstream_errors,
    })
}

/// Validate the `SHOP` value: a bare domain, no scheme, no path.
fn parse_shop(raw: &str) -> Result<String, ConfigError> {
    let shop = raw.trim().trim_end_matches('/');
    if shop.contains("://") || shop.contains('/') {
        return Err(ConfigError::InvalidEnvVar {
            var: "SHOP".to_string(),
            reason: format!("expected a bare domain (no scheme or path), got \"{raw}\""),
        });
    }
    Ok(shop.to_string())
}

/// Parse the comma-separated `ALLOWED_ORIGIN` list.
///
/// Entries are trimmed and stored without a trailing slash so they compare
/// equal to the `Origin` header a browser sends. An empty result means
/// permissive mode.
#[must_use]
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .map(|s| s.trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_backend(s: &str) -> Result<Backend, ConfigError> {
    match s {
        "rest" => Ok(Backend::Rest),
        "graphql" => Ok(Backend::Graphql),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ORDERGATE_BACKEND".to_string(),
            reason: format!("expected \"rest\" or \"graphql\", got \"{other}\""),
        }),
    }
}

fn parse_match_mode(s: &str) -> Result<MatchMode, ConfigError> {
    match s {
        "strict" => Ok(MatchMode::Strict),
        "lenient" => Ok(MatchMode::Lenient),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ORDERGATE_MATCH_MODE".to_string(),
            reason: format!("expected \"strict\" or \"lenient\", got \"{other}\""),
        }),
    }
}
