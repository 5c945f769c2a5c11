//! Confidence bands and categorization policy

use serde::{Deserialize, Serialize};
use tracing::info;

use super::metrics::{ForecastMetrics, ForecastMetricsError};
use crate::domain::{categorize, clip_index, AqiCategory};

/// Default band half-width as a fraction of the clipped prediction
pub const DEFAULT_BAND_FRACTION: f64 = 0.10;
/// Two-sided 95% normal quantile
pub const Z_95: f64 = 1.96;

/// How the half-width (margin) of a confidence band is derived.
///
/// In both modes the band is centred on the raw model output and both
/// bounds are clipped to the displayable index range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConfidenceMode {
    /// margin = fraction × clipped prediction
    Proportional { fraction: f64 },
    /// margin = z × standard deviation of held-out residuals
    ResidualStd { residual_std: f64, z: f64 },
}

impl Default for ConfidenceMode {
    fn default() -> Self {
        Self::Proportional {
            fraction: DEFAULT_BAND_FRACTION,
        }
    }
}

impl ConfidenceMode {
    pub fn proportional(fraction: f64) -> Self {
        Self::Proportional { fraction }
    }

    /// 95% band from a residual standard deviation
    pub fn residual(residual_std: f64) -> Self {
        Self::ResidualStd {
            residual_std,
            z: Z_95,
        }
    }

    /// 95% band from held-out actual/predicted pairs
    pub fn from_holdout(actual: &[f64], predicted: &[f64]) -> Result<Self, ForecastMetricsError> {
        let metrics = ForecastMetrics::calculate(actual, predicted)?;
        info!(%metrics, "held-out evaluation for confidence bands");
        Ok(Self::residual(metrics.residual_std()))
    }

    pub fn margin(&self, clipped: f64) -> f64 {
        match *self {
            Self::Proportional { fraction } => clipped * fraction,
            Self::ResidualStd { residual_std, z } => z * residual_std,
        }
    }

    /// `(lower, upper)` around `raw`, clipped
    pub fn band(&self, raw: f64, clipped: f64) -> (f64, f64) {
        let margin = self.margin(clipped);
        (clip_index(raw - margin), clip_index(raw + margin))
    }
}

/// Which value the AQI category is read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryBasis {
    /// Unclipped model output; "Hazardous" stays reachable
    #[default]
    Raw,
    /// Clipped display value; tops out at "Very Unhealthy"
    Clipped,
}

impl CategoryBasis {
    pub fn categorize(&self, raw: f64, clipped: f64) -> AqiCategory {
        match self {
            Self::Raw => categorize(raw),
            Self::Clipped => categorize(clipped),
        }
    }
}
