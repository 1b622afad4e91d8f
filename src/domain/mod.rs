//! Core domain types and logic.

pub mod snapshot;
pub mod screen;
pub mod score;
pub mod ranking;
pub mod sizing;
pub mod position;
pub mod simulator;
pub mod ledger;
pub mod calendar;
pub mod backtest;
pub mod metrics;
pub mod earnings;
pub mod config_validation;
pub mod error;
