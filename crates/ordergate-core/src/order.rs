//! Platform-neutral order shapes shared between the upstream client and the
//! composer. Everything here is transient: fetched per request, never cached
//! or persisted.

/// One order as returned by the upstream search, reduced to the fields the
/// lookup flow needs.
#[derive(Debug, Clone, Default)]
pub struct CandidateOrder {
    /// Platform order ID (numeric for REST, gid for GraphQL).
    pub id: Option<String>,
    /// Customer-facing order name, e.g. `"#1234"` or `"LS74193"`.
    pub name: String,
    pub order_number: Option<i64>,
    pub shipping_postcode: Option<String>,
    pub billing_postcode: Option<String>,
    pub fulfillments: Vec<Fulfillment>,
    pub line_items: Vec<LineItem>,
}

/// A shipment record attached to an order.
///
/// `tracking_numbers`/`tracking_urls` are the parallel lists the platform
/// reports; `legacy_number`/`legacy_url` are the older single-value fields
/// used as fallback when the lists are empty.
#[derive(Debug, Clone, Default)]
pub struct Fulfillment {
    pub tracking_numbers: Vec<String>,
    pub tracking_urls: Vec<String>,
    pub legacy_number: Option<String>,
    pub legacy_url: Option<String>,
    pub company: Option<String>,
    pub legacy_company: Option<String>,
}

/// One purchased product entry within an order.
///
/// The product-level fields (`product_title`, `handle`, `image`) are embedded
/// directly by the GraphQL variant, filled in by REST product enrichment, or
/// left `None` when the product could not be loaded.
#[derive(Debug, Clone, Default)]
pub struct LineItem {
    pub title: String,
    pub sku: Option<String>,
    pub product_id: Option<i64>,
    pub product_title: Option<String>,
    pub handle: Option<String>,
    pub image: Option<String>,
}
