//! Regressor contract and the bundled linear model

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A trained regressor.
///
/// `inputs` are ordered by the artifact's feature names and already scaled
/// when the artifacts carry a scaler. Implementations must be safe for
/// concurrent read-only use.
pub trait PredictiveModel: Send + Sync {
    /// Predict a pollution index from one input row
    fn predict(&self, inputs: &[f64]) -> Result<f64>;
}

/// Linear regression over an ordered feature schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearRegressionModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressionModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }
}

impl PredictiveModel for LinearRegressionModel {
    fn predict(&self, inputs: &[f64]) -> Result<f64> {
        if inputs.len() != self.coefficients.len() {
            anyhow::bail!(
                "Feature count mismatch: expected {}, got {}",
                self.coefficients.len(),
                inputs.len()
            );
        }

        let prediction: f64 = inputs
            .iter()
            .zip(self.coefficients.iter())
            .map(|(f, c)| f * c)
            .sum::<f64>()
            + self.intercept;

        Ok(prediction)
    }
}
