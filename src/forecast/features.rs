//! Feature synthesis for pollution forecasting
//!
//! Builds a complete, named feature vector for a timestamp from fixed urban
//! activity heuristics, optional training statistics and caller overrides.

use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::{
    domain::TimePoint,
    error::ForecastError,
    ml::{FeatureOverrides, FeatureVector, TrainingStatistics},
};

pub const HOUR: &str = "hour";
pub const DAY_OF_WEEK: &str = "day_of_week";
pub const IS_WEEKEND: &str = "is_weekend";
pub const IS_RUSH_HOUR: &str = "is_rush_hour";

/// Time-derived feature names, in schema order
pub const TIME_FEATURES: [&str; 4] = [HOUR, DAY_OF_WEEK, IS_WEEKEND, IS_RUSH_HOUR];

pub const RUSH_HOUR_TRAFFIC_FACTOR: f64 = 1.5;
pub const RUSH_HOUR_EMISSION_FACTOR: f64 = 1.3;
pub const WEEKEND_TRAFFIC_FACTOR: f64 = 0.7;
pub const WEEKEND_INDUSTRIAL_FACTOR: f64 = 0.5;
/// Peak deviation (degrees) of the diurnal temperature curve
pub const DIURNAL_TEMPERATURE_AMPLITUDE: f64 = 5.0;
/// Export-mode jitter standard deviation, as a fraction of the training std
pub const JITTER_STD_FRACTION: f64 = 0.1;

/// How the activity heuristics treat a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureRole {
    /// Scaled up at rush hour, down at weekends
    Traffic,
    /// Scaled up at rush hour
    Emission,
    /// Scaled down at weekends
    Industrial,
    /// Follows the diurnal temperature curve
    Temperature,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub role: FeatureRole,
    pub default: f64,
}

impl FeatureSpec {
    pub fn new(name: impl Into<String>, role: FeatureRole, default: f64) -> Self {
        Self {
            name: name.into(),
            role,
            default,
        }
    }
}

/// Declarative table of the non-time features and their heuristic roles
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCatalog {
    specs: Vec<FeatureSpec>,
}

impl Default for FeatureCatalog {
    /// Typical urban values
    fn default() -> Self {
        use FeatureRole::*;
        Self::new(vec![
            FeatureSpec::new("traffic_volume", Traffic, 5000.0),
            FeatureSpec::new("temperature", Temperature, 25.0),
            FeatureSpec::new("humidity", Other, 60.0),
            FeatureSpec::new("wind_speed", Other, 10.0),
            FeatureSpec::new("industrial_activity", Industrial, 50.0),
            FeatureSpec::new("vehicle_emissions", Emission, 45.0),
            FeatureSpec::new("construction_activity", Other, 30.0),
            FeatureSpec::new("population_density", Other, 1000.0),
            FeatureSpec::new("green_cover_percentage", Other, 20.0),
        ])
    }
}

impl FeatureCatalog {
    pub fn new(specs: Vec<FeatureSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[FeatureSpec] {
        &self.specs
    }

    pub fn get(&self, name: &str) -> Option<&FeatureSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Replace default values and roles; unknown names are added as `Other`
    pub fn customized(
        mut self,
        defaults: &BTreeMap<String, f64>,
        roles: &BTreeMap<String, FeatureRole>,
    ) -> Self {
        for (name, value) in defaults {
            match self.specs.iter_mut().find(|s| &s.name == name) {
                Some(spec) => spec.default = *value,
                None => self
                    .specs
                    .push(FeatureSpec::new(name.clone(), FeatureRole::Other, *value)),
            }
        }
        for (name, role) in roles {
            if let Some(spec) = self.specs.iter_mut().find(|s| &s.name == name) {
                spec.role = *role;
            }
        }
        self
    }

    /// Catalog features whose default is replaced by a training mean
    pub fn shadowed_by<'a>(&'a self, stats: &TrainingStatistics) -> Vec<&'a str> {
        self.specs
            .iter()
            .filter(|s| stats.get(&s.name).is_some())
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Time features followed by catalog features
    pub fn feature_names(&self) -> Vec<String> {
        TIME_FEATURES
            .iter()
            .map(|n| n.to_string())
            .chain(self.specs.iter().map(|s| s.name.clone()))
            .collect()
    }
}

/// Deterministic feature-vector builder.
///
/// Serving mode never adds noise. Export mode adds Gaussian jitter to `Other`
/// features when training statistics are available; the jitter is seeded by
/// the configured seed and the timestamp, so output stays reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSynthesizer {
    catalog: FeatureCatalog,
    jitter_seed: Option<u64>,
}

impl Default for FeatureSynthesizer {
    fn default() -> Self {
        Self::new(FeatureCatalog::default())
    }
}

impl FeatureSynthesizer {
    pub fn new(catalog: FeatureCatalog) -> Self {
        Self {
            catalog,
            jitter_seed: None,
        }
    }

    /// Enable export-mode jitter
    pub fn with_jitter(mut self, seed: u64) -> Self {
        self.jitter_seed = Some(seed);
        self
    }

    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    pub fn is_jittered(&self) -> bool {
        self.jitter_seed.is_some()
    }

    /// Build the feature vector for `time`.
    ///
    /// `baseline` supplies training means (and stds for jitter) when known.
    /// `overrides` are applied last and always win.
    pub fn synthesize(
        &self,
        time: TimePoint,
        overrides: &FeatureOverrides,
        baseline: Option<&TrainingStatistics>,
    ) -> FeatureVector {
        self.synthesize_for_schema(time, overrides, baseline, &[])
    }

    /// Like [`synthesize`](Self::synthesize), additionally filling schema
    /// features unknown to the catalog with their training mean.
    pub fn synthesize_for_schema(
        &self,
        time: TimePoint,
        overrides: &FeatureOverrides,
        baseline: Option<&TrainingStatistics>,
        schema: &[String],
    ) -> FeatureVector {
        let rush = time.is_rush_hour();
        let weekend = time.is_weekend();
        let hour = time.hour();

        let mut out = FeatureVector::new();
        out.set(HOUR, hour as f64);
        out.set(DAY_OF_WEEK, time.day_of_week() as f64);
        out.set(IS_WEEKEND, flag(weekend));
        out.set(IS_RUSH_HOUR, flag(rush));

        let mut rng = self
            .jitter_seed
            .map(|seed| StdRng::seed_from_u64(jitter_seed(seed, time)));

        for spec in &self.catalog.specs {
            let stats = baseline.and_then(|b| b.get(&spec.name));
            let mut value = stats.map(|s| s.mean).unwrap_or(spec.default);

            match spec.role {
                FeatureRole::Traffic => {
                    if rush {
                        value *= RUSH_HOUR_TRAFFIC_FACTOR;
                    }
                    if weekend {
                        value *= WEEKEND_TRAFFIC_FACTOR;
                    }
                }
                FeatureRole::Emission => {
                    if rush {
                        value *= RUSH_HOUR_EMISSION_FACTOR;
                    }
                }
                FeatureRole::Industrial => {
                    if weekend {
                        value *= WEEKEND_INDUSTRIAL_FACTOR;
                    }
                }
                FeatureRole::Temperature => {
                    value += diurnal_temperature_offset(hour);
                }
                FeatureRole::Other => {
                    if let (Some(rng), Some(stats)) = (rng.as_mut(), stats) {
                        if let Ok(noise) = Normal::new(0.0, stats.std * JITTER_STD_FRACTION) {
                            value += noise.sample(rng);
                        }
                    }
                }
            }

            out.set(&spec.name, value);
        }

        for name in schema {
            if out.get(name).is_none() {
                if let Some(mean) = baseline.and_then(|b| b.mean(name)) {
                    out.set(name, mean);
                }
            }
        }

        out.apply(overrides);
        out
    }
}

/// `5 * sin(2π * hour / 24)`
pub fn diurnal_temperature_offset(hour: u32) -> f64 {
    DIURNAL_TEMPERATURE_AMPLITUDE * (2.0 * std::f64::consts::PI * hour as f64 / 24.0).sin()
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn jitter_seed(seed: u64, time: TimePoint) -> u64 {
    seed ^ (time.timestamp().timestamp() as u64).rotate_left(17)
}

/// Convert transport-level override values into numeric overrides.
///
/// Numbers pass through and booleans become 1/0; anything else is rejected
/// with the offending key named. Names are not checked against any schema.
pub fn parse_overrides(field: &str, raw: &Map<String, Value>) -> Result<FeatureOverrides, ForecastError> {
    raw.iter()
        .map(|(name, value)| {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::Bool(b) => Some(flag(*b)),
                _ => None,
            };
            match number {
                Some(v) if v.is_finite() => Ok((name.clone(), v)),
                _ => Err(ForecastError::invalid_input(
                    format!("{}.{}", field, name),
                    format!("expected a number, got {}", value),
                )),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parse_timestamp;
    use serde_json::json;

    fn at(raw: &str) -> TimePoint {
        parse_timestamp("timestamp", raw).unwrap()
    }

    fn synth(raw: &str) -> FeatureVector {
        FeatureSynthesizer::default().synthesize(at(raw), &FeatureOverrides::new(), None)
    }

    #[test]
    fn test_time_features() {
        // Saturday, rush hour
        let fv = synth("2025-01-11T08:15:00");
        assert_eq!(fv.get(HOUR), Some(8.0));
        assert_eq!(fv.get(DAY_OF_WEEK), Some(5.0));
        assert_eq!(fv.get(IS_WEEKEND), Some(1.0));
        assert_eq!(fv.get(IS_RUSH_HOUR), Some(1.0));
    }

    #[test]
    fn test_weekday_off_peak_uses_defaults() {
        // Wednesday 00:00, sin(0) = 0
        let fv = synth("2025-01-08T00:00:00");
        assert_eq!(fv.get("traffic_volume"), Some(5000.0));
        assert_eq!(fv.get("vehicle_emissions"), Some(45.0));
        assert_eq!(fv.get("industrial_activity"), Some(50.0));
        assert_eq!(fv.get("temperature"), Some(25.0));
        assert_eq!(fv.get("green_cover_percentage"), Some(20.0));
        assert_eq!(fv.len(), 13);
    }

    #[test]
    fn test_rush_hour_multipliers() {
        let fv = synth("2025-01-08T17:00:00");
        assert_eq!(fv.get("traffic_volume"), Some(5000.0 * 1.5));
        assert_eq!(fv.get("vehicle_emissions"), Some(45.0 * 1.3));
        assert_eq!(fv.get("industrial_activity"), Some(50.0));
    }

    #[test]
    fn test_weekend_multipliers() {
        let fv = synth("2025-01-12T12:00:00");
        assert_eq!(fv.get("traffic_volume"), Some(5000.0 * 0.7));
        assert_eq!(fv.get("industrial_activity"), Some(25.0));
        assert_eq!(fv.get("vehicle_emissions"), Some(45.0));

        let rush_weekend = synth("2025-01-12T18:00:00");
        assert_eq!(rush_weekend.get("traffic_volume"), Some(5000.0 * 1.5 * 0.7));
    }

    #[test]
    fn test_diurnal_temperature() {
        assert!((synth("2025-01-08T06:00:00").get("temperature").unwrap() - 30.0).abs() < 1e-9);
        assert!((synth("2025-01-08T18:00:00").get("temperature").unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_overrides_win() {
        let overrides = FeatureOverrides::from([
            ("traffic_volume".to_string(), 1200.0),
            (HOUR.to_string(), 3.0),
            ("custom_signal".to_string(), 7.0),
        ]);
        let fv = FeatureSynthesizer::default().synthesize(at("2025-01-08T08:00:00"), &overrides, None);
        assert_eq!(fv.get("traffic_volume"), Some(1200.0));
        assert_eq!(fv.get(HOUR), Some(3.0));
        assert_eq!(fv.get("custom_signal"), Some(7.0));
        // the rush-hour flag still reflects the timestamp
        assert_eq!(fv.get(IS_RUSH_HOUR), Some(1.0));
    }

    #[test]
    fn test_training_means_replace_defaults() {
        let stats = TrainingStatistics::new()
            .with("traffic_volume", 4000.0, 900.0)
            .with("humidity", 70.0, 0.0)
            .with("noise_db", 55.0, 3.0);
        let schema: Vec<String> = ["traffic_volume", "humidity", "noise_db", "pm10_lag"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let fv = FeatureSynthesizer::default().synthesize_for_schema(
            at("2025-01-08T08:00:00"),
            &FeatureOverrides::new(),
            Some(&stats),
            &schema,
        );
        assert_eq!(fv.get("traffic_volume"), Some(4000.0 * 1.5));
        assert_eq!(fv.get("humidity"), Some(70.0));
        assert_eq!(fv.get("noise_db"), Some(55.0));
        assert_eq!(fv.get("pm10_lag"), None);
    }

    #[test]
    fn test_training_means_win_over_configured_defaults() {
        let defaults = BTreeMap::from([
            ("traffic_volume".to_string(), 9000.0),
            ("wind_speed".to_string(), 3.0),
        ]);
        let catalog = FeatureCatalog::default().customized(&defaults, &BTreeMap::new());
        let stats = TrainingStatistics::new().with("traffic_volume", 4000.0, 900.0);
        assert_eq!(catalog.shadowed_by(&stats), vec!["traffic_volume"]);

        let fv = FeatureSynthesizer::new(catalog).synthesize(
            at("2025-01-08T12:00:00"),
            &FeatureOverrides::new(),
            Some(&stats),
        );
        assert_eq!(fv.get("traffic_volume"), Some(4000.0));
        assert_eq!(fv.get("wind_speed"), Some(3.0));
    }

    #[test]
    fn test_jitter_is_reproducible() {
        let stats = TrainingStatistics::new().with("humidity", 60.0, 10.0);
        let synthesizer = FeatureSynthesizer::default().with_jitter(42);
        let t = at("2025-01-08T10:00:00");

        let a = synthesizer.synthesize(t, &FeatureOverrides::new(), Some(&stats));
        let b = synthesizer.synthesize(t, &FeatureOverrides::new(), Some(&stats));
        assert_eq!(a, b);

        let humidity = a.get("humidity").unwrap();
        assert_ne!(humidity, 60.0);
        assert!((humidity - 60.0).abs() < 10.0);
        // features without statistics are not jittered
        assert_eq!(a.get("wind_speed"), Some(10.0));
    }

    #[test]
    fn test_serving_mode_ignores_std() {
        let stats = TrainingStatistics::new().with("humidity", 60.0, 10.0);
        let fv = FeatureSynthesizer::default().synthesize(
            at("2025-01-08T10:00:00"),
            &FeatureOverrides::new(),
            Some(&stats),
        );
        assert_eq!(fv.get("humidity"), Some(60.0));
    }

    #[test]
    fn test_catalog_customization() {
        let catalog = FeatureCatalog::default().customized(
            &BTreeMap::from([
                ("traffic_volume".to_string(), 8000.0),
                ("noise_db".to_string(), 50.0),
            ]),
            &BTreeMap::from([("construction_activity".to_string(), FeatureRole::Industrial)]),
        );
        assert_eq!(catalog.get("traffic_volume").unwrap().default, 8000.0);
        assert_eq!(catalog.get("noise_db").unwrap().role, FeatureRole::Other);
        assert_eq!(
            catalog.get("construction_activity").unwrap().role,
            FeatureRole::Industrial
        );
        assert_eq!(catalog.feature_names().len(), 14);
        assert_eq!(catalog.feature_names()[0], HOUR);
    }

    #[test]
    fn test_parse_overrides() {
        let raw = json!({"traffic_volume": 3000, "temperature": 28.5, "is_weekend": true});
        let parsed = parse_overrides("features", raw.as_object().unwrap()).unwrap();
        assert_eq!(parsed["traffic_volume"], 3000.0);
        assert_eq!(parsed["temperature"], 28.5);
        assert_eq!(parsed["is_weekend"], 1.0);
    }

    #[test]
    fn test_parse_overrides_names_bad_field() {
        let raw = json!({"traffic_volume": "lots"});
        let err = parse_overrides("scenario", raw.as_object().unwrap()).unwrap_err();
        match err {
            ForecastError::InvalidInput { field, .. } => assert_eq!(field, "scenario.traffic_volume"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
