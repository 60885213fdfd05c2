//! Outbound collaborators.

use std::future::Future;

use serde_json::Value;

use crate::domain::ItemMetadata;

pub mod gemini;

/// Anything that can propose a valuation candidate for an item.
///
/// Implementations return the parsed JSON they received; the validation
/// gate decides whether it is trustworthy.
pub trait CandidateSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch_candidate(
        &self,
        metadata: &ItemMetadata,
    ) -> impl Future<Output = Result<Value, Self::Error>> + Send;
}
