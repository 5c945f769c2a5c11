use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Z-score scaler fitted on training inputs, one mean/std per schema column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl StandardScaler {
    pub fn new(means: Vec<f64>, stds: Vec<f64>) -> Result<Self> {
        if means.len() != stds.len() {
            anyhow::bail!(
                "Scaler parameter count mismatch: {} means, {} stds",
                means.len(),
                stds.len()
            );
        }
        Ok(Self { means, stds })
    }

    /// Fit on row-major training data (population std, as in z-score scaling)
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            anyhow::bail!("Cannot fit scaler on empty data");
        };
        let width = first.len();
        if rows.iter().any(|r| r.len() != width) {
            anyhow::bail!("All rows must have the same length");
        }

        let n = rows.len() as f64;
        let mut means = vec![0.0; width];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v / n;
            }
        }
        let mut stds = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in stds.iter_mut().zip(row).zip(&means) {
                *s += (v - m).powi(2) / n;
            }
        }
        stds.iter_mut().for_each(|s| *s = s.sqrt());

        Ok(Self { means, stds })
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    pub fn transform(&self, inputs: &[f64]) -> Result<Vec<f64>> {
        if inputs.len() != self.means.len() {
            anyhow::bail!(
                "Standardization parameter count mismatch: expected {}, got {}",
                self.means.len(),
                inputs.len()
            );
        }

        Ok(inputs
            .iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(f, (mean, std))| {
                if std.abs() < 1e-10 {
                    0.0
                } else {
                    (f - mean) / std
                }
            })
            .collect())
    }
}
