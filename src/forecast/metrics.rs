//! Held-out evaluation metrics
//!
//! MAE, RMSE, MAPE, R² and the residual standard deviation that backs the
//! residual-based confidence band.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Forecast accuracy metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Square Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error (%)
    pub mape: f64,
    /// R² (coefficient of determination)
    pub r2: f64,
    /// Number of samples evaluated
    pub sample_count: usize,
    /// Maximum absolute error observed
    pub max_error: f64,
    /// Population standard deviation of the residuals (actual - predicted)
    pub std_dev: f64,
}

impl ForecastMetrics {
    /// Calculate metrics from actual and predicted values
    pub fn calculate(actual: &[f64], predicted: &[f64]) -> Result<Self, ForecastMetricsError> {
        if actual.len() != predicted.len() {
            return Err(ForecastMetricsError::DimensionMismatch {
                actual: actual.len(),
                predicted: predicted.len(),
            });
        }

        if actual.is_empty() {
            return Err(ForecastMetricsError::EmptyData);
        }

        let n = actual.len() as f64;
        let residuals: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();

        let mae = residuals.iter().map(|e| e.abs()).sum::<f64>() / n;
        let mse = residuals.iter().map(|e| e * e).sum::<f64>() / n;
        let rmse = mse.sqrt();

        // Percentage error skips zero actuals
        let percentage_errors: Vec<f64> = actual
            .iter()
            .zip(&residuals)
            .filter(|(a, _)| a.abs() > 1e-6)
            .map(|(a, e)| (e.abs() / a.abs()) * 100.0)
            .collect();
        let mape = if percentage_errors.is_empty() {
            0.0
        } else {
            percentage_errors.iter().sum::<f64>() / percentage_errors.len() as f64
        };

        let mean_actual = actual.iter().sum::<f64>() / n;
        let total_variance: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
        let residual_variance: f64 = residuals.iter().map(|e| e * e).sum();
        let r2 = if total_variance > 1e-10 {
            1.0 - (residual_variance / total_variance)
        } else {
            0.0
        };

        let max_error = residuals.iter().map(|e| e.abs()).fold(0.0f64, f64::max);

        let mean_error = residuals.iter().sum::<f64>() / n;
        let variance = residuals
            .iter()
            .map(|e| (e - mean_error).powi(2))
            .sum::<f64>()
            / n;

        Ok(ForecastMetrics {
            mae,
            rmse,
            mape,
            r2,
            sample_count: actual.len(),
            max_error,
            std_dev: variance.sqrt(),
        })
    }

    /// Residual standard deviation used for confidence bands
    pub fn residual_std(&self) -> f64 {
        self.std_dev
    }
}

impl fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Metrics: n={}, MAE={:.3}, RMSE={:.3}, MAPE={:.2}%, R²={:.3}, max error={:.3}, residual σ={:.3}",
            self.sample_count, self.mae, self.rmse, self.mape, self.r2, self.max_error, self.std_dev
        )
    }
}

/// Forecast metrics calculation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastMetricsError {
    #[error("Dimension mismatch: actual={actual}, predicted={predicted}")]
    DimensionMismatch { actual: usize, predicted: usize },

    #[error("Empty data provided")]
    EmptyData,
}
