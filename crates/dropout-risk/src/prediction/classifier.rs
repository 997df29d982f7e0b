use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest score still banded as [`RiskBand::Low`].
pub const LOW_RISK_CEILING: f64 = 0.4;
/// Highest score still banded as [`RiskBand::Moderate`].
pub const MODERATE_RISK_CEILING: f64 = 0.7;

/// Ordered severity tiers for a dropout risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    pub const fn ordered() -> [Self; 3] {
        [Self::Low, Self::Moderate, Self::High]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Moderate => "Moderate Risk",
            Self::High => "High Risk",
        }
    }

    pub const fn advisory(self) -> &'static str {
        match self {
            Self::Low => "on track",
            Self::Moderate => "monitor and support",
            Self::High => "immediate intervention recommended",
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bands a score. Total over every `f64`: anything above the moderate ceiling,
/// including `NaN`, is [`RiskBand::High`].
pub fn classify(score: f64) -> RiskBand {
    match score {
        s if s <= LOW_RISK_CEILING => RiskBand::Low,
        s if s <= MODERATE_RISK_CEILING => RiskBand::Moderate,
        _ => RiskBand::High,
    }
}

/// A classified score ready for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub band: RiskBand,
    pub advisory: &'static str,
}

impl RiskAssessment {
    pub fn from_score(score: f64) -> Self {
        let band = classify(score);
        Self {
            score,
            band,
            advisory: band.advisory(),
        }
    }

    /// Score as a percentage with one decimal place, e.g. `85.0%`.
    pub fn percent(&self) -> String {
        format!("{:.1}%", self.score * 100.0)
    }
}
