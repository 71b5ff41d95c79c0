//! Candidate selection: pick the order that matches the caller's postcode.

use crate::order::CandidateOrder;
use crate::postcode::Postcode;

/// What to do when no candidate's postcode matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// No postcode match means not found, even with order-code candidates.
    /// Stronger identity verification; the default.
    Strict,
    /// Fall back to the first candidate. Accepts an order-code match without
    /// a postcode match — weaker identity verification.
    Lenient,
}

/// Selects the best-matching order for the target postcode.
///
/// Candidates are scanned in upstream order (assumed to reflect relevance and
/// recency); the first one whose normalized shipping or billing postcode
/// equals `target` wins. With no match, `Lenient` falls back to the first
/// candidate and `Strict` reports none. An empty candidate list is always
/// none, independent of mode.
#[must_use]
pub fn resolve_order<'a>(
    orders: &'a [CandidateOrder],
    target: &Postcode,
    mode: MatchMode,
) -> Option<&'a CandidateOrder> {
    let matches = |raw: Option<&str>| raw.is_some_and(|p| &Postcode::normalize(p) == target);

    orders
        .iter()
        .find(|order| {
            matches(order.shipping_postcode.as_deref())
                || matches(order.billing_postcode.as_deref())
        })
        .or_else(|| match mode {
            MatchMode::Strict => None,
            MatchMode::Lenient => orders.first(),
        })
}
