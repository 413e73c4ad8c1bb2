//! Core domain types and logic.

pub mod bar;
pub mod config;
pub mod config_validation;
pub mod engine;
pub mod error;
pub mod indicator;
pub mod lifecycle;
pub mod position;
pub mod signal;
pub mod sizing;
pub mod time_policy;
