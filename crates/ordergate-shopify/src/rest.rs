//! REST variant of the Admin API client.
//!
//! Orders are listed with a name-filtered search (`status=any` so fulfilled
//! and archived orders are included, first page only). Product data for the
//! matched order is loaded with one batched `products.json?ids=...` call
//! rather than per-product requests.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use ordergate_core::order::{CandidateOrder, Fulfillment, LineItem};

use crate::error::UpstreamError;
use crate::{TOKEN_HEADER, USER_AGENT};

/// Client for the Admin REST API.
///
/// Use [`RestClient::new`] for production or [`RestClient::with_base_url`] to
/// point at a mock server in tests.
pub struct RestClient {
    client: Client,
    token: String,
    orders_url: Url,
    products_url: Url,
}

impl RestClient {
    /// Creates a client for `https://{shop}/admin/api/{version}`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`UpstreamError::BaseUrl`] if `shop` does
    /// not form a valid URL.
    pub fn new(
        shop: &str,
        token: &str,
        version: &str,
        timeout_secs: u64,
    ) -> Result<Self, UpstreamError> {
        let base = format!("https://{shop}/admin/api/{version}");
        Self::with_base_url(token, timeout_secs, &base)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// `base_url` replaces the `https://{shop}/admin/api/{version}` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`UpstreamError::BaseUrl`] if `base_url` is
    /// not a valid URL base.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        // Normalise: exactly one trailing slash so join() appends instead of
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base = Url::parse(&normalised)
            .map_err(|e| UpstreamError::BaseUrl(format!("not a valid URL base: {e}")))?;
        let orders_url = base
            .join("orders.json")
            .map_err(|e| UpstreamError::BaseUrl(e.to_string()))?;
        let products_url = base
            .join("products.json")
            .map_err(|e| UpstreamError::BaseUrl(e.to_string()))?;

        Ok(Self {
            client,
            token: token.to_owned(),
            orders_url,
            products_url,
        })
    }

    /// Lists candidate orders whose name matches `code`, fulfilled and
    /// archived ones included.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Status`] on any non-2xx response.
    /// - [`UpstreamError::Http`] on network failure or timeout.
    /// - [`UpstreamError::Deserialize`] if the body is not the expected shape.
    pub async fn fetch_orders(&self, code: &str) -> Result<Vec<CandidateOrder>, UpstreamError> {
        let mut url = self.orders_url.clone();
        url.query_pairs_mut()
            .append_pair("status", "any")
            .append_pair("name", code);

        let body = self.request_json(url, "orders search").await?;
        let parsed: OrdersResponse =
            serde_json::from_value(body).map_err(|e| UpstreamError::Deserialize {
                context: format!("orders search for \"{code}\""),
                source: e,
            })?;

        Ok(parsed.orders.into_iter().map(map_order).collect())
    }

    /// Fills product-level fields on `items` with one batched products fetch.
    ///
    /// A failed fetch is non-fatal: the items keep their line-item-only data
    /// and the failure is logged.
    pub async fn enrich_line_items(&self, items: &mut [LineItem]) {
        let mut ids: Vec<i64> = Vec::new();
        for item in items.iter() {
            if let Some(id) = item.product_id {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        if ids.is_empty() {
            return;
        }

        match self.fetch_products(&ids).await {
            Ok(products) => {
                for item in items.iter_mut() {
                    let Some(product) = item
                        .product_id
                        .and_then(|id| products.iter().find(|p| p.id == id))
                    else {
                        continue;
                    };
                    item.product_title = product.title.clone().filter(|t| !t.is_empty());
                    item.handle = product.handle.clone().filter(|h| !h.is_empty());
                    item.image = product.primary_image();
                }
            }
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    product_count = ids.len(),
                    "batched product fetch failed; items fall back to line-item data"
                );
            }
        }
    }

    /// Fetches the given products in a single call.
    ///
    /// # Errors
    ///
    /// Same failure surface as [`RestClient::fetch_orders`].
    async fn fetch_products(&self, ids: &[i64]) -> Result<Vec<RestProduct>, UpstreamError> {
        let joined = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let mut url = self.products_url.clone();
        url.query_pairs_mut()
            .append_pair("ids", &joined)
            .append_pair("fields", "id,title,handle,image,images");

        let body = self.request_json(url, "products fetch").await?;
        let parsed: ProductsResponse =
            serde_json::from_value(body).map_err(|e| UpstreamError::Deserialize {
                context: "products fetch".to_owned(),
                source: e,
            })?;

        Ok(parsed.products)
    }

    /// Sends an authenticated GET, asserts a 2xx status, and parses the body
    /// as JSON.
    async fn request_json(
        &self,
        url: Url,
        context: &str,
    ) -> Result<serde_json::Value, UpstreamError> {
        let response = self
            .client
            .get(url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                context: context.to_owned(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| UpstreamError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OrdersResponse {
    #[serde(default)]
    orders: Vec<RestOrder>,
}

#[derive(Debug, Deserialize)]
struct RestOrder {
    id: i64,
    name: String,
    order_number: Option<i64>,
    shipping_address: Option<RestAddress>,
    billing_address: Option<RestAddress>,
    #[serde(default)]
    fulfillments: Vec<RestFulfillment>,
    #[serde(default)]
    line_items: Vec<RestLineItem>,
}

#[derive(Debug, Deserialize)]
struct RestAddress {
    zip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestFulfillment {
    #[serde(default)]
    tracking_numbers: Vec<String>,
    #[serde(default)]
    tracking_urls: Vec<String>,
    tracking_number: Option<String>,
    tracking_url: Option<String>,
    tracking_company: Option<String>,
    company: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestLineItem {
    title: String,
    sku: Option<String>,
    product_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    #[serde(default)]
    products: Vec<RestProduct>,
}

#[derive(Debug, Deserialize)]
struct RestProduct {
    id: i64,
    title: Option<String>,
    handle: Option<String>,
    image: Option<RestImage>,
    #[serde(default)]
    images: Vec<RestImage>,
}

#[derive(Debug, Deserialize)]
struct RestImage {
    src: Option<String>,
}

impl RestProduct {
    fn primary_image(&self) -> Option<String> {
        self.image
            .as_ref()
            .and_then(|i| i.src.clone())
            .or_else(|| self.images.first().and_then(|i| i.src.clone()))
    }
}

fn map_order(order: RestOrder) -> CandidateOrder {
    CandidateOrder {
        id: Some(order.id.to_string()),
        name: order.name,
        order_number: order.order_number,
        shipping_postcode: order.shipping_address.and_then(|a| a.zip),
        billing_postcode: order.billing_address.and_then(|a| a.zip),
        fulfillments: order.fulfillments.into_iter().map(map_fulfillment).collect(),
        line_items: order.line_items.into_iter().map(map_line_item).collect(),
    }
}

fn map_fulfillment(fulfillment: RestFulfillment) -> Fulfillment {
    Fulfillment {
        tracking_numbers: fulfillment.tracking_numbers,
        tracking_urls: fulfillment.tracking_urls,
        legacy_number: fulfillment.tracking_number.filter(|s| !s.is_empty()),
        legacy_url: fulfillment.tracking_url.filter(|s| !s.is_empty()),
        company: fulfillment.tracking_company.filter(|s| !s.is_empty()),
        legacy_company: fulfillment.company.filter(|s| !s.is_empty()),
    }
}

fn map_line_item(item: RestLineItem) -> LineItem {
    LineItem {
        title: item.title,
        sku: item.sku.filter(|s| !s.is_empty()),
        product_id: item.product_id,
        product_title: None,
        handle: None,
        image: None,
    }
}
