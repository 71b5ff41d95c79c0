use thiserror::Error;

pub mod app_config;
pub mod compose;
pub mod config;
pub mod order;
pub mod postcode;
pub mod resolve;

pub use app_config::{AppConfig, Backend, Environment};
pub use compose::{compose_items, compose_tracking, ItemShape, LineItemView, TrackingEntry};
pub use config::{load_app_config, load_app_config_from_env};
pub use order::{CandidateOrder, Fulfillment, LineItem};
pub use postcode::Postcode;
pub use resolve::{resolve_order, MatchMode};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
