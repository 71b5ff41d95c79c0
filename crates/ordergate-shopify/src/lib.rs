//! Shopify Admin API client for the order-lookup proxy.
//!
//! Two protocol variants implement the same contract: [`rest::RestClient`]
//! (orders search + one batched products fetch) and
//! [`graphql::GraphqlClient`] (a single query with embedded product data).
//! [`client::AdminClient`] selects between them from configuration.

pub mod client;
pub mod error;
pub mod graphql;
pub mod rest;

pub use client::AdminClient;
pub use error::UpstreamError;
pub use graphql::GraphqlClient;
pub use rest::RestClient;

/// Header carrying the Admin API access token.
pub(crate) const TOKEN_HEADER: &str = "X-Shopify-Access-Token";

pub(crate) const USER_AGENT: &str = "ordergate/0.1 (order-lookup)";
