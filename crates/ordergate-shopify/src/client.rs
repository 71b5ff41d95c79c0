//! Protocol-agnostic entry point used by the HTTP handler.

use ordergate_core::order::CandidateOrder;
use ordergate_core::{AppConfig, Backend, ItemShape};

use crate::error::UpstreamError;
use crate::graphql::GraphqlClient;
use crate::rest::RestClient;

/// Admin API client over one of the two supported protocols.
///
/// Both variants implement the same contract: `fetch_orders` lists candidate
/// orders for an order code, `enrich_order` fills product-level line-item
/// fields, and `item_shape` tells the composer which projection the variant
/// produces.
pub enum AdminClient {
    Rest(RestClient),
    Graphql(GraphqlClient),
}

impl AdminClient {
    /// Builds the client for the configured backend.
    ///
    /// Returns `Ok(None)` when `SHOP` or `ADMIN_TOKEN` is not configured;
    /// lookups then answer "server not configured" instead of failing
    /// startup.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the underlying HTTP client cannot be
    /// constructed or the shop domain does not form a valid URL.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, UpstreamError> {
        let (Some(shop), Some(token)) = (config.shop.as_deref(), config.admin_token.as_deref())
        else {
            return Ok(None);
        };

        let client = match config.backend {
            Backend::Rest => Self::Rest(RestClient::new(
                shop,
                token,
                &config.admin_version,
                config.upstream_timeout_secs,
            )?),
            Backend::Graphql => Self::Graphql(GraphqlClient::new(
                shop,
                token,
                &config.admin_version,
                config.upstream_timeout_secs,
            )?),
        };
        Ok(Some(client))
    }

    /// Lists candidate orders matching `code`, most relevant first.
    ///
    /// # Errors
    ///
    /// Propagates the variant's [`UpstreamError`]. Never retries.
    pub async fn fetch_orders(&self, code: &str) -> Result<Vec<CandidateOrder>, UpstreamError> {
        match self {
            Self::Rest(client) => client.fetch_orders(code).await,
            Self::Graphql(client) => client.fetch_orders(code).await,
        }
    }

    /// Fills product-level fields on the order's line items.
    ///
    /// REST issues one batched products call; GraphQL already embedded the
    /// data at fetch time. Failures degrade items to line-item-only data
    /// instead of failing the lookup.
    pub async fn enrich_order(&self, order: &mut CandidateOrder) {
        match self {
            Self::Rest(client) => client.enrich_line_items(&mut order.line_items).await,
            Self::Graphql(_) => {}
        }
    }

    #[must_use]
    pub fn item_shape(&self) -> ItemShape {
        match self {
            Self::Rest(_) => ItemShape::PerLineItem,
            Self::Graphql(_) => ItemShape::GroupedByHandle,
        }
    }
}
