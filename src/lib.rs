//! Temperature-driven electricity demand and cost analysis for grid regions
//!
//! Fits per-region polynomial temperature-demand curves, projects demand
//! over a historical baseline and a recent period, and prices the
//! difference through piecewise-linear wholesale price curves.

pub mod analysis;
pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod pipeline;
pub mod repo;
pub mod telemetry;

pub use error::{AnalysisError, Result};
