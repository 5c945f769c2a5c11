//! Training-set statistics
//!
//! Feature columns are chosen from a declarative [`TrainingSchema`] (a named
//! target plus explicitly excluded columns) rather than by guessing from
//! column names.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mean and sample standard deviation of one training column
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeatureStats {
    pub mean: f64,
    pub std: f64,
}

impl FeatureStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if values.len() < 2 {
            0.0
        } else {
            let ss = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            (ss / (n - 1.0)).sqrt()
        };
        Some(Self { mean, std })
    }
}

/// Which training columns are the target and which are never features
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingSchema {
    pub target: String,
    #[serde(default)]
    pub excluded: Vec<String>,
}

impl TrainingSchema {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            excluded: Vec::new(),
        }
    }

    pub fn excluding<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn is_feature(&self, column: &str) -> bool {
        column != self.target && !self.excluded.iter().any(|c| c == column)
    }

    /// Feature columns in their original order
    pub fn feature_columns<'a>(&self, columns: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        columns
            .into_iter()
            .filter(|c| self.is_feature(c))
            .map(str::to_string)
            .collect()
    }
}

/// Per-feature statistics of the training set
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TrainingStatistics {
    features: BTreeMap<String, FeatureStats>,
}

impl TrainingStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, stats: FeatureStats) {
        self.features.insert(name.into(), stats);
    }

    pub fn with(mut self, name: impl Into<String>, mean: f64, std: f64) -> Self {
        self.insert(name, FeatureStats { mean, std });
        self
    }

    /// Compute statistics for the schema's feature columns
    pub fn from_columns(schema: &TrainingSchema, columns: &[(String, Vec<f64>)]) -> Result<Self> {
        if !columns.iter().any(|(name, _)| name == &schema.target) {
            anyhow::bail!("Target column '{}' not present in training data", schema.target);
        }

        let mut out = Self::new();
        for (name, values) in columns.iter().filter(|(name, _)| schema.is_feature(name)) {
            match FeatureStats::from_values(values) {
                Some(stats) => out.insert(name.clone(), stats),
                None => anyhow::bail!("Training column '{}' is empty", name),
            }
        }
        Ok(out)
    }

    pub fn get(&self, name: &str) -> Option<&FeatureStats> {
        self.features.get(name)
    }

    pub fn mean(&self, name: &str) -> Option<f64> {
        self.get(name).map(|s| s.mean)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
