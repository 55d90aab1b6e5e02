//! Single-bus energy system dispatch with voltage and current flow limits
//!
//! An [`EnergySystem`](domain::EnergySystem) of buses, sources and sinks is
//! turned into a linear program by [`OperationalModel`](optimizer::OperationalModel).
//! Extra [`ConstraintRule`](optimizer::ConstraintRule)s bound individual flows
//! before the model is handed to a `good_lp` solver backend.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod optimizer;
pub mod plot;
pub mod results;
pub mod scenario;
pub mod telemetry;

pub use error::{ModelError, ModelResult};
