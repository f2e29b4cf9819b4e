//! Scenario sweep driver (§4.C10): enumerates the `(interval, entry lag,
//! policy set)` matrix and aggregates per-scenario outcomes into a
//! leaderboard.

pub mod matrix;
pub mod scenario;

pub use matrix::{build_matrix, build_per_caller_rows, Matrix, MatrixEntry, OverlayStats};
pub use scenario::{default_scenario, enumerate_scenarios, scenarios_for, Scenario};
