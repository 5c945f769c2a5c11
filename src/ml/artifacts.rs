//! Loaded model artifacts
//!
//! Everything the forecaster needs from training, loaded once at startup and
//! shared read-only afterwards.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fmt, path::Path, sync::Arc};
use tracing::info;

use super::{
    FeatureVector, LinearRegressionModel, ModelMetadata, PredictiveModel, StandardScaler,
    TrainingStatistics,
};

/// Regressor definitions that can be stored in an artifact file
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ModelSpec {
    LinearRegression(LinearRegressionModel),
}

#[derive(Debug, Deserialize)]
struct ArtifactFile {
    #[serde(default)]
    metadata: ModelMetadata,
    feature_names: Vec<String>,
    model: ModelSpec,
    #[serde(default)]
    scaler: Option<StandardScaler>,
    #[serde(default)]
    statistics: Option<TrainingStatistics>,
    #[serde(default)]
    residual_std: Option<f64>,
}

/// Model, feature schema and optional training context
#[derive(Clone)]
pub struct ModelArtifacts {
    model: Arc<dyn PredictiveModel>,
    feature_names: Vec<String>,
    scaler: Option<StandardScaler>,
    statistics: Option<TrainingStatistics>,
    residual_std: Option<f64>,
    metadata: ModelMetadata,
}

impl fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("feature_names", &self.feature_names)
            .field("scaler", &self.scaler.is_some())
            .field("statistics", &self.statistics.as_ref().map(|s| s.len()))
            .field("residual_std", &self.residual_std)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl ModelArtifacts {
    pub fn new(model: Arc<dyn PredictiveModel>, feature_names: Vec<String>) -> Self {
        Self {
            model,
            feature_names,
            scaler: None,
            statistics: None,
            residual_std: None,
            metadata: ModelMetadata::default(),
        }
    }

    pub fn with_scaler(mut self, scaler: StandardScaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    pub fn with_statistics(mut self, statistics: TrainingStatistics) -> Self {
        self.statistics = Some(statistics);
        self
    }

    pub fn with_residual_std(mut self, residual_std: f64) -> Self {
        self.residual_std = Some(residual_std);
        self
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Load an artifact bundle from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading model artifacts from {}", path.display()))?;
        let artifacts = Self::from_json(&raw)
            .with_context(|| format!("parsing model artifacts in {}", path.display()))?;
        info!(
            path = %path.display(),
            features = artifacts.feature_names.len(),
            scaler = artifacts.scaler.is_some(),
            statistics = artifacts.statistics.is_some(),
            model_id = %artifacts.metadata.model_id,
            "model artifacts loaded"
        );
        Ok(artifacts)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: ArtifactFile = serde_json::from_str(raw)?;
        Self::from_file(file)
    }

    fn from_file(file: ArtifactFile) -> Result<Self> {
        let n = file.feature_names.len();
        if n == 0 {
            anyhow::bail!("Artifact lists no feature names");
        }

        let model: Arc<dyn PredictiveModel> = match file.model {
            ModelSpec::LinearRegression(lr) => {
                if lr.n_features() != n {
                    anyhow::bail!(
                        "Model expects {} features but {} feature names were given",
                        lr.n_features(),
                        n
                    );
                }
                Arc::new(lr)
            }
        };

        if let Some(scaler) = &file.scaler {
            if scaler.means.len() != n || scaler.stds.len() != n {
                anyhow::bail!(
                    "Scaler has {} means and {} stds for {} features",
                    scaler.means.len(),
                    scaler.stds.len(),
                    n
                );
            }
        }

        if let Some(std) = file.residual_std {
            if !std.is_finite() || std < 0.0 {
                anyhow::bail!("residual_std must be a non-negative number, got {}", std);
            }
        }

        Ok(Self {
            model,
            feature_names: file.feature_names,
            scaler: file.scaler,
            statistics: file.statistics,
            residual_std: file.residual_std,
            metadata: file.metadata,
        })
    }

    pub fn model(&self) -> &dyn PredictiveModel {
        self.model.as_ref()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn scaler(&self) -> Option<&StandardScaler> {
        self.scaler.as_ref()
    }

    pub fn statistics(&self) -> Option<&TrainingStatistics> {
        self.statistics.as_ref()
    }

    pub fn residual_std(&self) -> Option<f64> {
        self.residual_std
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Ordered (and scaled, when a scaler is present) model input row
    pub fn model_input(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let row = features.project(&self.feature_names);
        match &self.scaler {
            Some(scaler) => scaler.transform(&row),
            None => Ok(row),
        }
    }

    /// Run the model on one feature vector
    pub fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let row = self.model_input(features)?;
        self.model.predict(&row)
    }
}
