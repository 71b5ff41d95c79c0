//! Response composition: derive the tracking array and item list from a
//! matched order's raw fields.

use serde::Serialize;

use crate::order::{CandidateOrder, Fulfillment, LineItem};

/// One tracking entry derived from a fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEntry {
    pub number: Option<String>,
    pub url: Option<String>,
    pub company: Option<String>,
}

/// One item as shown to the help widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemView {
    pub title: String,
    pub handle: Option<String>,
    pub image: Option<String>,
    pub skus: Vec<String>,
}

/// How line items are projected into views. Follows the upstream protocol:
/// REST enriches each line item individually, GraphQL embeds product data and
/// deduplicates by handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemShape {
    PerLineItem,
    GroupedByHandle,
}

/// Derives tracking entries from every fulfillment on the order.
///
/// Per fulfillment: the explicit number list is preferred, falling back to
/// the single legacy number. Each number pairs with the url at the same
/// position of the url list (explicit list, else the legacy url), falls back
/// to the first url when positions don't align, and to `None` when no url
/// exists. A fulfillment with urls but no numbers yields one numberless
/// entry; one with neither is skipped.
#[must_use]
pub fn compose_tracking(order: &CandidateOrder) -> Vec<TrackingEntry> {
    order.fulfillments.iter().flat_map(fulfillment_entries).collect()
}

fn fulfillment_entries(fulfillment: &Fulfillment) -> Vec<TrackingEntry> {
    let numbers: Vec<&str> = if fulfillment.tracking_numbers.is_empty() {
        fulfillment.legacy_number.as_deref().into_iter().collect()
    } else {
        fulfillment.tracking_numbers.iter().map(String::as_str).collect()
    };

    let urls: Vec<&str> = if fulfillment.tracking_urls.is_empty() {
        fulfillment.legacy_url.as_deref().into_iter().collect()
    } else {
        fulfillment.tracking_urls.iter().map(String::as_str).collect()
    };

    let company = fulfillment
        .company
        .clone()
        .or_else(|| fulfillment.legacy_company.clone());

    if numbers.is_empty() {
        return match urls.first() {
            Some(url) => vec![TrackingEntry {
                number: None,
                url: Some((*url).to_string()),
                company,
            }],
            None => Vec::new(),
        };
    }

    numbers
        .iter()
        .enumerate()
        .map(|(idx, number)| TrackingEntry {
            number: Some((*number).to_string()),
            url: urls
                .get(idx)
                .or_else(|| urls.first())
                .map(|u| (*u).to_string()),
            company: company.clone(),
        })
        .collect()
}

/// Projects line items into the shape the configured backend produces.
#[must_use]
pub fn compose_items(items: &[LineItem], shape: ItemShape) -> Vec<LineItemView> {
    match shape {
        ItemShape::PerLineItem => per_line_item_views(items),
        ItemShape::GroupedByHandle => grouped_by_handle_views(items),
    }
}

/// One view per original line item, enriched with fetched product data when
/// available, else falling back to the line item's own fields.
fn per_line_item_views(items: &[LineItem]) -> Vec<LineItemView> {
    items
        .iter()
        .map(|item| LineItemView {
            title: non_empty(item.product_title.as_deref())
                .unwrap_or(&item.title)
                .to_string(),
            handle: item.handle.clone(),
            image: item.image.clone(),
            skus: non_empty(item.sku.as_deref())
                .map(ToOwned::to_owned)
                .into_iter()
                .collect(),
        })
        .collect()
}

/// Line items grouped by product handle in first-seen order; items without a
/// handle are dropped. Each group accumulates the union of distinct SKUs in
/// first-seen order.
fn grouped_by_handle_views(items: &[LineItem]) -> Vec<LineItemView> {
    let mut views: Vec<LineItemView> = Vec::new();

    for item in items {
        let Some(handle) = non_empty(item.handle.as_deref()) else {
            continue;
        };
        let sku = non_empty(item.sku.as_deref());

        if let Some(view) = views
            .iter_mut()
            .find(|v| v.handle.as_deref() == Some(handle))
        {
            if let Some(sku) = sku {
                if !view.skus.iter().any(|s| s == sku) {
                    view.skus.push(sku.to_string());
                }
            }
            continue;
        }

        let title = non_empty(item.product_title.as_deref())
            .or_else(|| non_empty(Some(item.title.as_str())))
            .unwrap_or(handle)
            .to_string();

        views.push(LineItemView {
            title,
            handle: Some(handle.to_string()),
            image: item.image.clone(),
            skus: sku.map(ToOwned::to_owned).into_iter().collect(),
        });
    }

    views
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}
