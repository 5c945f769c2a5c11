//! Model collaborator boundary
//!
//! The forecaster treats a trained regressor as an opaque function over an
//! ordered feature vector. This module holds that contract plus everything
//! loaded alongside the model at startup:
//! - Named feature vectors and their projection onto a model schema
//! - Standard scaling of model inputs
//! - Training statistics used for data-driven feature defaults
//! - Artifact loading

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::collections::BTreeMap;

pub mod artifacts;
pub mod models;
pub mod scaler;
pub mod statistics;

pub use artifacts::ModelArtifacts;
pub use models::{LinearRegressionModel, PredictiveModel};
pub use scaler::StandardScaler;
pub use statistics::{FeatureStats, TrainingSchema, TrainingStatistics};

/// Explicit feature values supplied by a caller, keyed by feature name
pub type FeatureOverrides = BTreeMap<String, f64>;

/// Kind of regressor stored in an artifact bundle
#[derive(Debug, Clone, Copy, Default, serde::Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    LinearRegression,
    RandomForest,
    GradientBoosting,
    #[default]
    Other,
}

/// Descriptive metadata shipped with a model
#[derive(Debug, Clone, Default, serde::Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub model_type: ModelType,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub trained_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub training_samples: usize,
}

/// Named feature values in insertion order.
///
/// Extra names beyond a model's schema are kept for display and ignored when
/// the vector is projected onto the schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.position(name).map(|i| self.values[i])
    }

    /// Replace the value for `name`, appending it when absent
    pub fn set(&mut self, name: &str, value: f64) {
        match self.position(name) {
            Some(i) => self.values[i] = value,
            None => {
                self.names.push(name.to_string());
                self.values.push(value);
            }
        }
    }

    /// Merge `overrides` onto this vector; override values win on conflict
    pub fn apply(&mut self, overrides: &FeatureOverrides) {
        for (name, value) in overrides {
            self.set(name, *value);
        }
    }

    pub fn merged(&self, overrides: &FeatureOverrides) -> Self {
        let mut out = self.clone();
        out.apply(overrides);
        out
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Values ordered by `schema`; names missing from the vector become 0
    pub fn project(&self, schema: &[String]) -> Vec<f64> {
        schema
            .iter()
            .map(|name| self.get(name).unwrap_or(0.0))
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut out = FeatureVector::new();
        for (name, value) in iter {
            out.set(&name.into(), value);
        }
        out
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut fv: FeatureVector = [("hour", 3.0), ("traffic_volume", 5000.0)]
            .into_iter()
            .collect();
        fv.set("hour", 4.0);
        fv.set("humidity", 60.0);

        assert_eq!(fv.len(), 3);
        assert_eq!(fv.get("hour"), Some(4.0));
        assert_eq!(fv.names(), &schema(&["hour", "traffic_volume", "humidity"]));
    }

    #[test]
    fn test_merge_override_wins() {
        let base: FeatureVector = [("traffic_volume", 5000.0), ("humidity", 60.0)]
            .into_iter()
            .collect();
        let overrides = FeatureOverrides::from([
            ("traffic_volume".to_string(), 3000.0),
            ("not_a_feature".to_string(), 1.0),
        ]);

        let merged = base.merged(&overrides);
        assert_eq!(merged.get("traffic_volume"), Some(3000.0));
        assert_eq!(merged.get("humidity"), Some(60.0));
        assert_eq!(merged.get("not_a_feature"), Some(1.0));
        // the original is untouched
        assert_eq!(base.get("traffic_volume"), Some(5000.0));
    }

    #[test]
    fn test_project_fills_missing_with_zero() {
        let fv: FeatureVector = [("b", 2.0), ("extra", 9.0), ("a", 1.0)]
            .into_iter()
            .collect();
        assert_eq!(fv.project(&schema(&["a", "b", "c"])), vec![1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let fv: FeatureVector = [("z", 1.0), ("a", 2.0)].into_iter().collect();
        let json = serde_json::to_string(&fv).unwrap();
        assert_eq!(json, r#"{"z":1.0,"a":2.0}"#);
    }
}
