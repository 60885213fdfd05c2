//! Confidence of a locally computed valuation, from which fields were supplied.

use super::entities::ItemMetadata;
use crate::util::rounding::{clamp_unit, round2};

pub const MISSING_BRAND_PENALTY: f64 = 0.05;
pub const MISSING_YEAR_PENALTY: f64 = 0.10;
pub const MISSING_DESCRIPTION_PENALTY: f64 = 0.05;
pub const MISSING_TITLE_PENALTY: f64 = 0.10;

/// Starts at full confidence and deducts a fixed penalty per missing signal.
pub fn score(metadata: &ItemMetadata) -> f64 {
    let mut confidence = 1.0;
    if metadata.brand.is_none() {
        confidence -= MISSING_BRAND_PENALTY;
    }
    if metadata.year.is_none() {
        confidence -= MISSING_YEAR_PENALTY;
    }
    if metadata.description.is_none() {
        confidence -= MISSING_DESCRIPTION_PENALTY;
    }
    if metadata.title.is_none() {
        confidence -= MISSING_TITLE_PENALTY;
    }
    round2(clamp_unit(confidence))
}
