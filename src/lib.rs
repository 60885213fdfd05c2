//! Used-item valuation and barter fairness scoring.
//!
//! `domain` holds the deterministic engine, the fairness evaluator and the
//! validation gate; `infra` holds the optional generative-AI collaborator;
//! `app` wires them together.

pub mod app;
pub mod domain;
pub mod infra;
pub mod util;
