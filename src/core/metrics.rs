//! Process capability metrics for an individuals (I-MR) series
//!
//! Cp and Cpk use the sample standard deviation (n-1). A series without
//! spread is treated as a perfect process: every index is infinite.

use std::fmt;

use crate::core::limits::Limits;

/// Risk category derived from the sigma level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    HighRisk,
    Poor,
    Moderate,
    Acceptable,
    Good,
    Excellent,
    NotAvailable,
}

impl RiskLevel {
    /// Classify a sigma level; each bracket includes its lower bound
    pub fn from_sigma(sigma: f64) -> Self {
        if !sigma.is_finite() {
            return RiskLevel::NotAvailable;
        }
        match sigma {
            s if s < 3.0 => RiskLevel::HighRisk,
            s if s < 4.0 => RiskLevel::Poor,
            s if s < 4.5 => RiskLevel::Moderate,
            s if s < 5.0 => RiskLevel::Acceptable,
            s if s < 6.0 => RiskLevel::Good,
            _ => RiskLevel::Excellent,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::HighRisk => write!(f, "High risk"),
            RiskLevel::Poor => write!(f, "Poor"),
            RiskLevel::Moderate => write!(f, "Moderate"),
            RiskLevel::Acceptable => write!(f, "Acceptable"),
            RiskLevel::Good => write!(f, "Good"),
            RiskLevel::Excellent => write!(f, "Excellent"),
            RiskLevel::NotAvailable => write!(f, "N/A"),
        }
    }
}

/// Capability summary of one combined series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capability {
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation, 0 when fewer than two points
    pub std_dev: f64,
    pub cp: f64,
    pub cpk: f64,
    /// `Cpk * 3` rounded to three decimals
    pub sigma_level: f64,
    pub risk: RiskLevel,
}

impl Capability {
    pub fn compute(values: &[f64], limits: &Limits) -> Self {
        let n = values.len();
        let mean = mean(values);
        let std_dev = sample_std_dev(values, mean);

        let (cp, cpk) = if std_dev > 0.0 {
            let cp = limits.spec_width() / (6.0 * std_dev);
            let upper = (limits.usl - mean) / (3.0 * std_dev);
            let lower = (mean - limits.lsl) / (3.0 * std_dev);
            (cp, upper.min(lower))
        } else {
            (f64::INFINITY, f64::INFINITY)
        };

        let sigma_level = if cpk.is_finite() {
            round_to(cpk * 3.0, 3)
        } else {
            f64::INFINITY
        };

        Self {
            n,
            mean,
            std_dev,
            cp,
            cpk,
            sigma_level,
            risk: RiskLevel::from_sigma(sigma_level),
        }
    }
}

/// 1-based positions of points strictly outside the control limits
pub fn out_of_control(values: &[f64], limits: &Limits) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > limits.ucl || **v < limits.lcl)
        .map(|(i, _)| i + 1)
        .collect()
}

/// Display text for a stored sigma: `N/A` when absent, `inf` when infinite
pub fn sigma_text(sigma: Option<f64>) -> String {
    match sigma {
        None => "N/A".to_string(),
        Some(s) if !s.is_finite() => "inf".to_string(),
        Some(s) => format!("{:.3}", s),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
