//! Core domain types and logic.

pub mod price;
pub mod alignment;
pub mod moving_average;
pub mod simulation;
pub mod metrics;
pub mod analysis;
pub mod sweep;
pub mod config_validation;
pub mod error;
