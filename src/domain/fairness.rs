//! Trade fairness scoring.
//!
//! A request valued at zero or below is scored as if it were worth
//! [`REQUEST_VALUE_FLOOR`]. This keeps the ratio finite, but it also means a
//! genuinely free item is treated as worth one currency unit; the explanation
//! text says so whenever the floor applies.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::entities::{FairnessReport, FairnessResult, OfferSide, TradeProposal};
use crate::util::coerce::number_or;
use crate::util::rounding::{clamp_unit, round2};

pub const REQUEST_VALUE_FLOOR: f64 = 1.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TradeInputError {
    #[error("offer and request required")]
    MissingSides,
    #[error("trade proposal must be a JSON object")]
    NotAnObject,
}

impl TradeProposal {
    /// Reads `{offer: {value}, request: {value}, proposerCash?}`.
    ///
    /// Both sides must be objects; their values and the cash amount default
    /// to zero when absent or unusable.
    pub fn from_json(raw: &Value) -> Result<Self, TradeInputError> {
        let Value::Object(fields) = raw else {
            return Err(TradeInputError::NotAnObject);
        };
        let side = |key: &str| match fields.get(key) {
            Some(side @ Value::Object(_)) => Some(OfferSide {
                value: number_or(side.get("value"), 0.0),
            }),
            _ => None,
        };
        let (Some(offer), Some(request)) = (side("offer"), side("request")) else {
            return Err(TradeInputError::MissingSides);
        };
        Ok(Self {
            offer,
            request,
            proposer_cash: number_or(fields.get("proposerCash"), 0.0),
        })
    }
}

/// Scores how far `offer_value + proposer_cash` covers `request_value`.
///
/// `suggested_cash` is the total cash needed alongside the offered item to
/// match the request; it does not subtract cash already proposed.
pub fn evaluate(offer_value: f64, request_value: f64, proposer_cash: f64) -> FairnessResult {
    let offer_value = finite_or_zero(offer_value);
    let proposer_cash = finite_or_zero(proposer_cash);
    let request_value = floored_request(request_value);

    let ratio = (offer_value + proposer_cash) / request_value;

    FairnessResult {
        fairness_score: round2(clamp_unit(ratio)),
        suggested_cash: round2((request_value - offer_value).max(0.0)),
        fairness_ratio: round2(ratio),
    }
}

/// Evaluates a proposal and renders it in the caller-facing shape.
pub fn report(proposal: &TradeProposal) -> FairnessReport {
    let offer_value = proposal.offer.value;
    let request_value = proposal.request.value;
    let cash = proposal.proposer_cash;
    let result = evaluate(offer_value, request_value, cash);
    debug!(?proposal, ?result, "evaluated trade");

    let mut explanation = format!(
        "Computed as (offer {offer_value} + proposerCash {cash}) / request {}. Suggested cash to equalize: {}.",
        floored_request(request_value),
        result.suggested_cash,
    );
    if request_value <= 0.0 || !request_value.is_finite() {
        explanation.push_str(&format!(
            " The requested item has no positive value ({request_value}), so it was scored as if worth {REQUEST_VALUE_FLOOR}; this is a floor, not a valuation."
        ));
    }
    if result.suggested_cash > 0.0 {
        explanation.push_str(
            " The suggested cash is the full amount to add alongside the offered item, not an increase over cash already proposed.",
        );
    }

    FairnessReport {
        fairness_score: result.fairness_score,
        suggested_cash: result.suggested_cash,
        fairness_ratio: result.fairness_ratio,
        explanation,
        offer_val: offer_value,
        request_val: request_value,
    }
}

fn floored_request(request_value: f64) -> f64 {
    if request_value.is_finite() && request_value > 0.0 {
        request_value
    } else {
        REQUEST_VALUE_FLOOR
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
