//! ppm readings and their risk tiers.

use std::fmt;

use serde::Serialize;

use crate::config::Thresholds;

/// A single CO2 concentration sample in parts per million.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Reading(pub i64);

impl Reading {
    pub fn ppm(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ppm", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Safe,
    Warning,
    Alert,
    HighRisk,
}

impl RiskTier {
    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Safe => "Safe",
            RiskTier::Warning => "Warning",
            RiskTier::Alert => "Alert",
            RiskTier::HighRisk => "High Risk",
        }
    }

    pub fn advisory(self) -> &'static str {
        match self {
            RiskTier::Safe => "No effects",
            RiskTier::Warning => "Mild headache",
            RiskTier::Alert => "Headache, dizziness and a tendency to faint",
            RiskTier::HighRisk => "Accelerated breathing, syncope and possible death",
        }
    }

    /// Whether this tier raises the critical alert.
    pub fn is_critical(self) -> bool {
        self == RiskTier::HighRisk
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A tier together with the text shown next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub tier: RiskTier,
    pub advisory: &'static str,
}

impl From<RiskTier> for Assessment {
    fn from(tier: RiskTier) -> Self {
        Self {
            tier,
            advisory: tier.advisory(),
        }
    }
}

impl Thresholds {
    /// Map a reading onto its tier. Each bound is the inclusive start of a tier.
    pub fn classify(&self, reading: Reading) -> RiskTier {
        let ppm = reading.ppm();
        if ppm < self.warning_ppm {
            RiskTier::Safe
        } else if ppm < self.alert_ppm {
            RiskTier::Warning
        } else if ppm < self.high_risk_ppm {
            RiskTier::Alert
        } else {
            RiskTier::HighRisk
        }
    }

    pub fn assess(&self, reading: Reading) -> Assessment {
        self.classify(reading).into()
    }
}

/// Parse the leading integer of a payload.
///
/// Surrounding whitespace and a sign are accepted and anything after the
/// digits is ignored, so `"750ppm"` reads as 750 and `"12.7"` as 12.
/// Returns `None` when no digits lead the payload or the value overflows.
pub fn parse_reading(payload: &str) -> Option<Reading> {
    let s = payload.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, s.get(1..)?),
        Some(b'+') => (false, s.get(1..)?),
        _ => (false, s),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = rest.get(..digits_end)?;
    if digits.is_empty() {
        return None;
    }
    let value: i64 = digits.parse().ok()?;
    Some(Reading(if negative { -value } else { value }))
}
