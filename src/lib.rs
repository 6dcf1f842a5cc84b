//! SPC: weekly I-MR control charts
//!
//! Reads one week of measurements per feature, accumulates small weeks across
//! runs until enough points exist, then charts the series with Cp/Cpk and a
//! sigma-level risk classification.

pub mod cli;
pub mod core;
pub mod yaml;
