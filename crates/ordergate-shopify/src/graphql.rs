//! GraphQL variant of the Admin API client.
//!
//! A single query fetches the top matching orders with line items, variants
//! and products embedded, so no follow-up calls are needed.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use ordergate_core::order::{CandidateOrder, Fulfillment, LineItem};

use crate::error::UpstreamError;
use crate::{TOKEN_HEADER, USER_AGENT};

/// How many most-recently-created matches to request.
const FIRST_PAGE: u32 = 5;

const ORDERS_QUERY: &str = r"
query OrderLookup($search: String!, $first: Int!) {
  orders(first: $first, query: $search, sortKey: CREATED_AT, reverse: true) {
    edges {
      node {
        id
        name
        shippingAddress { zip }
        billingAddress { zip }
        fulfillments {
          trackingInfo { number url company }
        }
        lineItems(first: 50) {
          edges {
            node {
              title
              sku
              variant {
                sku
                product {
                  title
                  handle
                  featuredImage { url }
                }
              }
            }
          }
        }
      }
    }
  }
}
";

/// Client for the Admin GraphQL API.
///
/// Use [`GraphqlClient::new`] for production or
/// [`GraphqlClient::with_base_url`] to point at a mock server in tests.
pub struct GraphqlClient {
    client: Client,
    token: String,
    endpoint: Url,
}

impl GraphqlClient {
    /// Creates a client for `https://{shop}/admin/api/{version}/graphql.json`.
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

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base = Url::parse(&normalised)
            .map_err(|e| UpstreamError::BaseUrl(format!("not a valid URL base: {e}")))?;
        let endpoint = base
            .join("graphql.json")
            .map_err(|e| UpstreamError::BaseUrl(e.to_string()))?;

        Ok(Self {
            client,
            token: token.to_owned(),
            endpoint,
        })
    }

    /// Fetches the top [`FIRST_PAGE`] most-recently-created orders matching
    /// `code`, with line items and product data embedded.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Status`] on any non-2xx response.
    /// - [`UpstreamError::Api`] if the response body carries a GraphQL error
    ///   list.
    /// - [`UpstreamError::Http`] on network failure or timeout.
    /// - [`UpstreamError::Deserialize`] if the body is not the expected shape.
    pub async fn fetch_orders(&self, code: &str) -> Result<Vec<CandidateOrder>, UpstreamError> {
        let payload = serde_json::json!({
            "query": ORDERS_QUERY,
            "variables": {
                "search": build_search_query(code),
                "first": FIRST_PAGE,
            },
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(TOKEN_HEADER, &self.token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                context: "orders query".to_owned(),
            });
        }

        let body = response.text().await?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Deserialize {
                context: "orders query".to_owned(),
                source: e,
            })?;
        check_graphql_errors(&value)?;

        let Some(data) = value.get("data") else {
            return Err(UpstreamError::Api(
                "response carries neither data nor errors".to_owned(),
            ));
        };
        let data: OrdersData =
            serde_json::from_value(data.clone()).map_err(|e| UpstreamError::Deserialize {
                context: format!("orders query for \"{code}\""),
                source: e,
            })?;

        Ok(data
            .orders
            .edges
            .into_iter()
            .map(|edge| map_order(edge.node))
            .collect())
    }
}

/// Builds the `orders(query:)` search string: the code quoted literally, the
/// `#`-prefixed form when not already prefixed, and an exact order-number
/// clause when the code contains digits, OR-joined.
fn build_search_query(code: &str) -> String {
    // A double quote would terminate the quoted term early.
    let code: String = code.chars().filter(|c| *c != '"').collect();

    let mut clauses = vec![format!("name:\"{code}\"")];
    if !code.starts_with('#') {
        clauses.push(format!("name:\"#{code}\""));
    }

    let digits: String = code.chars().filter(char::is_ascii_digit).collect();
    if !digits.is_empty() {
        clauses.push(format!("order_number:{digits}"));
    }

    clauses.join(" OR ")
}

/// Returns an error if the body's top-level `errors` list is non-empty.
fn check_graphql_errors(body: &serde_json::Value) -> Result<(), UpstreamError> {
    let Some(errors) = body.get("errors").and_then(serde_json::Value::as_array) else {
        return Ok(());
    };
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors
        .iter()
        .filter_map(|e| e.get("message").and_then(serde_json::Value::as_str))
        .collect::<Vec<_>>()
        .join("; ");
    Err(UpstreamError::Api(if message.is_empty() {
        "unknown error".to_owned()
    } else {
        message
    }))
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OrdersData {
    orders: OrderConnection,
}

#[derive(Debug, Deserialize)]
struct OrderConnection {
    #[serde(default)]
    edges: Vec<OrderEdge>,
}

#[derive(Debug, Deserialize)]
struct OrderEdge {
    node: OrderNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderNode {
    id: String,
    name: String,
    shipping_address: Option<AddressNode>,
    billing_address: Option<AddressNode>,
    #[serde(default)]
    fulfillments: Vec<FulfillmentNode>,
    line_items: Option<LineItemConnection>,
}

#[derive(Debug, Deserialize)]
struct AddressNode {
    zip: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FulfillmentNode {
    #[serde(default)]
    tracking_info: Vec<TrackingInfoNode>,
}

#[derive(Debug, Deserialize)]
struct TrackingInfoNode {
    number: Option<String>,
    url: Option<String>,
    company: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LineItemConnection {
    #[serde(default)]
    edges: Vec<LineItemEdge>,
}

#[derive(Debug, Deserialize)]
struct LineItemEdge {
    node: LineItemNode,
}

#[derive(Debug, Deserialize)]
struct LineItemNode {
    title: String,
    sku: Option<String>,
    variant: Option<VariantNode>,
}

#[derive(Debug, Deserialize)]
struct VariantNode {
    sku: Option<String>,
    product: Option<ProductNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    title: Option<String>,
    handle: Option<String>,
    featured_image: Option<ImageNode>,
}

#[derive(Debug, Deserialize)]
struct ImageNode {
    url: Option<String>,
}

fn map_order(node: OrderNode) -> CandidateOrder {
    CandidateOrder {
        id: Some(node.id),
        name: node.name,
        order_number: None,
        shipping_postcode: node.shipping_address.and_then(|a| a.zip),
        billing_postcode: node.billing_address.and_then(|a| a.zip),
        fulfillments: node.fulfillments.into_iter().map(map_fulfillment).collect(),
        line_items: node
            .line_items
            .map(|c| c.edges.into_iter().map(|e| map_line_item(e.node)).collect())
            .unwrap_or_default(),
    }
}

fn map_fulfillment(node: FulfillmentNode) -> Fulfillment {
    let company = node
        .tracking_info
        .iter()
        .find_map(|t| t.company.clone().filter(|c| !c.is_empty()));

    Fulfillment {
        tracking_numbers: node
            .tracking_info
            .iter()
            .filter_map(|t| t.number.clone().filter(|n| !n.is_empty()))
            .collect(),
        tracking_urls: node
            .tracking_info
            .iter()
            .filter_map(|t| t.url.clone().filter(|u| !u.is_empty()))
            .collect(),
        legacy_number: None,
        legacy_url: None,
        company,
        legacy_company: None,
    }
}

fn map_line_item(node: LineItemNode) -> LineItem {
    let variant_sku = node
        .variant
        .as_ref()
        .and_then(|v| v.sku.clone().filter(|s| !s.is_empty()));
    let product = node.variant.and_then(|v| v.product);

    LineItem {
        title: node.title,
        sku: variant_sku.or_else(|| node.sku.filter(|s| !s.is_empty())),
        product_id: None,
        product_title: product
            .as_ref()
            .and_then(|p| p.title.clone().filter(|t| !t.is_empty())),
        handle: product
            .as_ref()
            .and_then(|p| p.handle.clone().filter(|h| !h.is_empty())),
        image: product
            .and_then(|p| p.featured_image)
            .and_then(|i| i.url.filter(|u| !u.is_empty())),
    }
}
