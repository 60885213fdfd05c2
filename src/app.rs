//! Request orchestration: metadata check, optional collaborator call, gate.

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::{
    domain::{
        fairness, Appraisal, FairnessReport, HeuristicEngine, ItemMetadata, TradeInputError,
        TradeProposal, ValidationGate,
    },
    infra::CandidateSource,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppraisalError {
    #[error("provide title or description")]
    MissingText,
}

/// Produces valuations, asking `source` first when one is configured.
pub struct Appraiser<S> {
    gate: ValidationGate,
    source: Option<S>,
}

impl<S: CandidateSource> Appraiser<S> {
    pub fn new(engine: HeuristicEngine, source: Option<S>) -> Self {
        Self {
            gate: ValidationGate::new(engine),
            source,
        }
    }

    pub fn gate(&self) -> &ValidationGate {
        &self.gate
    }

    /// Runs the full valuation path for one item.
    ///
    /// The collaborator is awaited once with no retry; its timeout is the
    /// source's own. Rejected output and call failures both resolve to the
    /// annotated heuristic valuation.
    pub async fn appraise(&self, metadata: &ItemMetadata) -> Result<Appraisal, AppraisalError> {
        if !metadata.has_text() {
            return Err(AppraisalError::MissingText);
        }

        let Some(source) = &self.source else {
            return Ok(self.gate.heuristic(metadata));
        };

        let appraisal = match source.fetch_candidate(metadata).await {
            Ok(candidate) => self.gate.accept(Some(&candidate), metadata),
            Err(error) => self.gate.recover(&error, metadata),
        };
        info!(origin = %appraisal.origin, value = appraisal.valuation.value, "appraisal complete");
        Ok(appraisal)
    }

    /// Scores a trade given as `{offer:{value}, request:{value}, proposerCash?}`.
    pub fn evaluate_trade(&self, raw: &Value) -> Result<FairnessReport, TradeInputError> {
        let proposal = TradeProposal::from_json(raw)?;
        Ok(fairness::report(&proposal))
    }
}
