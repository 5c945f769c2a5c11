use std::sync::Arc;
use tracing::debug;

use super::{CategoryBasis, ConfidenceMode, FeatureSynthesizer};
use crate::{
    domain::{clip_index, ForecastSeries, PredictionRecord, ScenarioComparison, TimePoint},
    error::{ForecastError, Result},
    ml::{FeatureOverrides, FeatureVector, ModelArtifacts},
};

/// Upper limit on forecast length unless configured otherwise (one week)
pub const DEFAULT_MAX_HORIZON_HOURS: i64 = 168;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub confidence: ConfidenceMode,
    pub category_basis: CategoryBasis,
    pub max_horizon_hours: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            confidence: ConfidenceMode::default(),
            category_basis: CategoryBasis::default(),
            max_horizon_hours: DEFAULT_MAX_HORIZON_HOURS,
        }
    }
}

/// A prediction together with the features that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct PointForecast {
    pub record: PredictionRecord,
    pub features: FeatureVector,
}

/// Hourly pollution forecasts from synthesized features.
///
/// The engine holds no mutable state; a single instance can serve concurrent
/// requests as long as the bound model is safe for shared reads.
pub struct ForecastEngine {
    artifacts: Option<Arc<ModelArtifacts>>,
    synthesizer: FeatureSynthesizer,
    settings: EngineSettings,
}

impl ForecastEngine {
    pub fn new(
        artifacts: Option<Arc<ModelArtifacts>>,
        synthesizer: FeatureSynthesizer,
        settings: EngineSettings,
    ) -> Self {
        Self {
            artifacts,
            synthesizer,
            settings,
        }
    }

    /// Engine with default synthesis and settings
    pub fn with_model(artifacts: Arc<ModelArtifacts>) -> Self {
        Self::new(Some(artifacts), FeatureSynthesizer::default(), EngineSettings::default())
    }

    pub fn is_model_loaded(&self) -> bool {
        self.artifacts.is_some()
    }

    pub fn artifacts(&self) -> Option<&ModelArtifacts> {
        self.artifacts.as_deref()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn synthesizer(&self) -> &FeatureSynthesizer {
        &self.synthesizer
    }

    /// Feature names the model expects, or the synthesizer's when no model is bound
    pub fn feature_names(&self) -> Vec<String> {
        match &self.artifacts {
            Some(a) => a.feature_names().to_vec(),
            None => self.synthesizer.catalog().feature_names(),
        }
    }

    /// Feature vector for `time` in the bound model's training context
    pub fn synthesize(&self, time: TimePoint, overrides: &FeatureOverrides) -> FeatureVector {
        match &self.artifacts {
            Some(a) => self.synthesizer.synthesize_for_schema(
                time,
                overrides,
                a.statistics(),
                a.feature_names(),
            ),
            None => self.synthesizer.synthesize(time, overrides, None),
        }
    }

    /// One prediction plus the feature vector behind it
    pub fn predict_point(&self, time: TimePoint, overrides: &FeatureOverrides) -> Result<PointForecast> {
        let artifacts = self.require_model()?;
        let features = self.synthesize(time, overrides);
        let record = self.evaluate(artifacts, time, &features)?;
        Ok(PointForecast { record, features })
    }

    /// Single-hour forecast
    pub fn forecast_one(&self, time: TimePoint, overrides: &FeatureOverrides) -> Result<PredictionRecord> {
        self.forecast(time, 1, overrides)?
            .into_records()
            .pop()
            .ok_or_else(|| ForecastError::computation("empty single-hour forecast"))
    }

    /// `horizon_hours` consecutive hourly predictions starting at `start`
    pub fn forecast(
        &self,
        start: TimePoint,
        horizon_hours: i64,
        overrides: &FeatureOverrides,
    ) -> Result<ForecastSeries> {
        let artifacts = self.require_model()?;
        let horizon = self.validate_horizon(horizon_hours)?;

        let vectors = self.synthesize_window(start, horizon, overrides)?;
        let series = self.predict_series(artifacts, start, &vectors)?;
        debug!(
            start = %start.to_iso_string(),
            horizon,
            mean = series.summary().mean,
            "forecast generated"
        );
        Ok(series)
    }

    /// Baseline and scenario forecasts over the same window.
    ///
    /// Scenario overrides are applied on top of the baseline's realized
    /// feature vectors, so they act as changes relative to the baseline.
    pub fn forecast_what_if(
        &self,
        start: TimePoint,
        baseline_overrides: &FeatureOverrides,
        scenario_overrides: &FeatureOverrides,
        horizon_hours: i64,
    ) -> Result<ScenarioComparison> {
        let artifacts = self.require_model()?;
        let horizon = self.validate_horizon(horizon_hours)?;

        let baseline_vectors = self.synthesize_window(start, horizon, baseline_overrides)?;
        let scenario_vectors: Vec<(TimePoint, FeatureVector)> = baseline_vectors
            .iter()
            .map(|(t, fv)| (*t, fv.merged(scenario_overrides)))
            .collect();

        let baseline = self.predict_series(artifacts, start, &baseline_vectors)?;
        let scenario = self.predict_series(artifacts, start, &scenario_vectors)?;
        let comparison = ScenarioComparison::new(baseline, scenario);
        debug!(
            horizon,
            changes = scenario_overrides.len(),
            reduction = comparison.impact().reduction,
            "what-if scenario evaluated"
        );
        Ok(comparison)
    }

    fn require_model(&self) -> Result<&ModelArtifacts> {
        self.artifacts
            .as_deref()
            .ok_or(ForecastError::ModelUnavailable)
    }

    fn validate_horizon(&self, horizon_hours: i64) -> Result<usize> {
        if horizon_hours <= 0 {
            return Err(ForecastError::invalid_input(
                "horizon_hours",
                format!("must be positive, got {}", horizon_hours),
            ));
        }
        if horizon_hours > self.settings.max_horizon_hours {
            return Err(ForecastError::invalid_input(
                "horizon_hours",
                format!(
                    "must not exceed {}, got {}",
                    self.settings.max_horizon_hours, horizon_hours
                ),
            ));
        }
        usize::try_from(horizon_hours)
            .map_err(|_| ForecastError::invalid_input("horizon_hours", "out of range"))
    }

    fn synthesize_window(
        &self,
        start: TimePoint,
        horizon: usize,
        overrides: &FeatureOverrides,
    ) -> Result<Vec<(TimePoint, FeatureVector)>> {
        let vectors: Vec<_> = start
            .hourly(horizon)
            .map(|t| (t, self.synthesize(t, overrides)))
            .collect();
        if vectors.len() < horizon {
            return Err(ForecastError::invalid_input(
                "start_time",
                format!(
                    "a {}-hour window from this start runs past the supported date range",
                    horizon
                ),
            ));
        }
        Ok(vectors)
    }

    fn predict_series(
        &self,
        artifacts: &ModelArtifacts,
        start: TimePoint,
        vectors: &[(TimePoint, FeatureVector)],
    ) -> Result<ForecastSeries> {
        let records = vectors
            .iter()
            .map(|(t, fv)| self.evaluate(artifacts, *t, fv))
            .collect::<Result<Vec<_>>>()?;
        Ok(ForecastSeries::new(start, records))
    }

    fn evaluate(
        &self,
        artifacts: &ModelArtifacts,
        time: TimePoint,
        features: &FeatureVector,
    ) -> Result<PredictionRecord> {
        let raw = artifacts
            .predict(features)
            .map_err(ForecastError::computation)?;
        if !raw.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "model returned a non-finite value ({}) for {}",
                raw,
                time.to_iso_string()
            )));
        }

        let value = clip_index(raw);
        let band = self.settings.confidence.band(raw, value);
        let category = self.settings.category_basis.categorize(raw, value);
        Ok(PredictionRecord::new(time, raw, value, band, category))
    }
}
