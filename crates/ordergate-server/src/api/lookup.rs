use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ordergate_core::{
    compose_items, compose_tracking, resolve_order, LineItemView, Postcode, TrackingEntry,
};

use super::{AppState, LookupError};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LookupRequest {
    #[serde(default)]
    pub order_code: String,
    #[serde(default)]
    pub postcode: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ResultPayload {
    pub ok: bool,
    pub order: OrderSummary,
    pub items: Vec<LineItemView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OrderSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<i64>,
    pub tracking: Vec<TrackingEntry>,
}

/// `POST /order-lookup` — the whole transaction: validate, resolve against
/// the upstream candidates, compose the reply.
///
/// Every exit renders a JSON body; the browser-side widget never has to
/// handle a non-JSON response.
pub(super) async fn order_lookup(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<LookupRequest>, JsonRejection>,
) -> Result<Json<ResultPayload>, LookupError> {
    let Json(request) =
        payload.map_err(|e| LookupError::Validation(format!("invalid JSON body: {e}")))?;

    let order_code = request.order_code.trim().to_owned();
    let postcode = request.postcode.trim();
    if order_code.is_empty() {
        return Err(LookupError::Validation("orderCode is required".to_owned()));
    }
    if postcode.is_empty() {
        return Err(LookupError::Validation("postcode is required".to_owned()));
    }

    let client = state.client.as_ref().ok_or(LookupError::NotConfigured)?;

    info!(request_id = %request_id.0, order_code = %order_code, "order lookup");

    let orders = client.fetch_orders(&order_code).await.map_err(|error| {
        warn!(request_id = %request_id.0, error = %error, "upstream order search failed");
        if state.config.expose_upstream_errors {
            LookupError::Upstream(error.to_string())
        } else {
            LookupError::Upstream("server error".to_owned())
        }
    })?;

    let target = Postcode::normalize(postcode);
    let Some(matched) = resolve_order(&orders, &target, state.config.match_mode) else {
        info!(
            request_id = %request_id.0,
            order_code = %order_code,
            candidates = orders.len(),
            "no candidate matched the postcode"
        );
        return Err(LookupError::OrderNotFound);
    };

    let mut order = matched.clone();
    client.enrich_order(&mut order).await;

    let tracking = compose_tracking(&order);
    let items = compose_items(&order.line_items, client.item_shape());
    if items.is_empty() {
        return Err(LookupError::ItemsNotFound);
    }

    Ok(Json(ResultPayload {
        ok: true,
        order: OrderSummary {
            id: order.id,
            name: order.name,
            order_number: order.order_number,
            tracking,
        },
        items,
    }))
}
