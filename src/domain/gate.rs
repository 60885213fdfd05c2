//! Validation gate for valuations produced by the external collaborator.
//!
//! Rejection is routine, so it is a value ([`GateVerdict::Invalid`]) rather
//! than an error. A rejected or failed candidate is replaced by the local
//! heuristic valuation, and the explanation says which of the two happened.
//! Candidates that pass the structural check are repaired field by field.

use std::fmt;

use serde_json::{Map, Value};
use tracing::{info, warn};

use super::entities::{Breakdown, ItemMetadata, Valuation};
use super::heuristics::HeuristicEngine;
use crate::util::coerce::{is_present, number_or, text_or_empty};
use crate::util::rounding::{clamp_unit, round2};

pub const INVALID_OUTPUT_NOTE: &str = " (fallback: AI returned invalid output)";
pub const UPSTREAM_FAILURE_NOTE: &str = " (fallback: AI error)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing usable came back (absent, `null`, or not a JSON object).
    NotAnObject,
    MissingValue,
    MissingBreakdown,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NotAnObject => write!(f, "candidate is not a JSON object"),
            RejectReason::MissingValue => write!(f, "candidate has no value"),
            RejectReason::MissingBreakdown => write!(f, "candidate has no breakdown object"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GateVerdict {
    Valid(Valuation),
    Invalid(RejectReason),
}

#[derive(Clone, Debug, PartialEq)]
pub enum FallbackCause {
    InvalidOutput(RejectReason),
    UpstreamFailure(String),
}

impl FallbackCause {
    /// Suffix appended to the heuristic explanation.
    pub fn annotation(&self) -> &'static str {
        match self {
            FallbackCause::InvalidOutput(_) => INVALID_OUTPUT_NOTE,
            FallbackCause::UpstreamFailure(_) => UPSTREAM_FAILURE_NOTE,
        }
    }
}

impl fmt::Display for FallbackCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackCause::InvalidOutput(reason) => {
                write!(f, "invalid collaborator output: {reason}")
            }
            FallbackCause::UpstreamFailure(error) => write!(f, "collaborator call failed: {error}"),
        }
    }
}

/// Where the returned valuation came from.
#[derive(Clone, Debug, PartialEq)]
pub enum ValuationOrigin {
    /// Sanitized collaborator output.
    Collaborator,
    /// Local engine by configuration; no collaborator was asked.
    Heuristic,
    /// Local engine standing in for a rejected or failed collaborator.
    Fallback(FallbackCause),
}

impl fmt::Display for ValuationOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuationOrigin::Collaborator => write!(f, "collaborator"),
            ValuationOrigin::Heuristic => write!(f, "heuristic"),
            ValuationOrigin::Fallback(cause) => write!(f, "heuristic fallback ({cause})"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Appraisal {
    pub valuation: Valuation,
    pub origin: ValuationOrigin,
}

impl Appraisal {
    pub fn is_authoritative(&self) -> bool {
        self.origin == ValuationOrigin::Collaborator
    }
}

/// Structural check and sanitization of one candidate.
pub fn inspect(candidate: Option<&Value>) -> GateVerdict {
    let Some(Value::Object(fields)) = candidate else {
        return GateVerdict::Invalid(RejectReason::NotAnObject);
    };
    if !is_present(fields.get("value")) {
        return GateVerdict::Invalid(RejectReason::MissingValue);
    }
    if !matches!(fields.get("breakdown"), Some(Value::Object(_))) {
        return GateVerdict::Invalid(RejectReason::MissingBreakdown);
    }
    GateVerdict::Valid(sanitize(fields))
}

fn sanitize(fields: &Map<String, Value>) -> Valuation {
    let breakdown = fields
        .get("breakdown")
        .map(Breakdown::from_json)
        .unwrap_or_default();

    Valuation {
        value: round2(number_or(fields.get("value"), 0.0)),
        confidence: round2(clamp_unit(number_or(fields.get("confidence"), 0.0))),
        breakdown: Breakdown {
            base_price: round2(breakdown.base_price),
            age_factor: round2(breakdown.age_factor),
            condition_factor: round2(breakdown.condition_factor),
            brand_factor: round2(breakdown.brand_factor),
            accessory_value: round2(breakdown.accessory_value),
        },
        explanation: text_or_empty(fields.get("explanation")),
    }
}

/// Decides between a collaborator candidate and the heuristic engine.
#[derive(Clone, Debug, Default)]
pub struct ValidationGate {
    engine: HeuristicEngine,
}

impl ValidationGate {
    pub fn new(engine: HeuristicEngine) -> Self {
        Self { engine }
    }

    /// Returns the sanitized candidate, or the heuristic valuation of
    /// `metadata` annotated as an invalid-output fallback.
    pub fn accept(&self, candidate: Option<&Value>, metadata: &ItemMetadata) -> Appraisal {
        match inspect(candidate) {
            GateVerdict::Valid(valuation) => {
                info!(value = valuation.value, "accepted collaborator valuation");
                Appraisal {
                    valuation,
                    origin: ValuationOrigin::Collaborator,
                }
            }
            GateVerdict::Invalid(reason) => {
                self.fallback(FallbackCause::InvalidOutput(reason), metadata)
            }
        }
    }

    /// Heuristic valuation standing in for a collaborator call that failed.
    pub fn recover(&self, error: &dyn fmt::Display, metadata: &ItemMetadata) -> Appraisal {
        self.fallback(FallbackCause::UpstreamFailure(error.to_string()), metadata)
    }

    /// Heuristic valuation with no collaborator involved.
    pub fn heuristic(&self, metadata: &ItemMetadata) -> Appraisal {
        Appraisal {
            valuation: self.engine.valuate(metadata),
            origin: ValuationOrigin::Heuristic,
        }
    }

    fn fallback(&self, cause: FallbackCause, metadata: &ItemMetadata) -> Appraisal {
        warn!(%cause, "falling back to heuristic valuation");
        let mut valuation = self.engine.valuate(metadata);
        valuation.explanation.push_str(cause.annotation());
        Appraisal {
            valuation,
            origin: ValuationOrigin::Fallback(cause),
        }
    }
}
