//! Core domain types and logic.

pub mod cash_flow;
pub mod holding;
pub mod xirr;
pub mod aggregation;
pub mod summary;
pub mod run_config;
pub mod config_validation;
pub mod error;
