pub mod coerce;
pub mod config;
pub mod rounding;
pub mod version;
