//! Domain logic for item valuation and trade fairness lives here.

pub mod breakdown;
pub mod confidence;
pub mod entities;
pub mod fairness;
pub mod gate;
pub mod heuristics;
pub mod pricing;

pub use breakdown::{compute_value, IntermediateSteps, ValueComputation};
pub use entities::{
    Breakdown, FairnessReport, FairnessResult, ItemMetadata, OfferSide, TradeProposal, Valuation,
    YearInput,
};
pub use fairness::{evaluate, report, TradeInputError, REQUEST_VALUE_FLOOR};
pub use gate::{
    inspect, Appraisal, FallbackCause, GateVerdict, RejectReason, ValidationGate, ValuationOrigin,
};
pub use heuristics::HeuristicEngine;
pub use pricing::{PricingTables, TablesError};
