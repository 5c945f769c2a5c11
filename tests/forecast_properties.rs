//! Invariants of feature synthesis and forecasting over generated inputs

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rstest::rstest;
use std::sync::Arc;

use pollution_forecaster::{
    domain::{TimePoint, AQI_MAX, AQI_MIN},
    error::ForecastError,
    forecast::{
        CategoryBasis, ConfidenceMode, EngineSettings, FeatureSynthesizer, ForecastEngine,
        IS_RUSH_HOUR, IS_WEEKEND,
    },
    ml::{FeatureOverrides, ModelArtifacts, PredictiveModel},
};

/// Returns the same raw output for every input
struct ConstantModel(f64);

impl PredictiveModel for ConstantModel {
    fn predict(&self, _inputs: &[f64]) -> anyhow::Result<f64> {
        Ok(self.0)
    }
}

fn engine(raw: f64, confidence: ConfidenceMode) -> ForecastEngine {
    let artifacts = ModelArtifacts::new(Arc::new(ConstantModel(raw)), vec!["hour".to_string()]);
    ForecastEngine::new(
        Some(Arc::new(artifacts)),
        FeatureSynthesizer::default(),
        EngineSettings {
            confidence,
            category_basis: CategoryBasis::Raw,
            ..EngineSettings::default()
        },
    )
}

fn time_at(secs: i64) -> TimePoint {
    TimePoint::from(Utc.timestamp_opt(secs, 0).unwrap())
}

// 2020-01-01 .. 2030-01-01
fn any_time() -> impl Strategy<Value = TimePoint> {
    (1_577_836_800i64..1_893_456_000).prop_map(time_at)
}

fn any_confidence() -> impl Strategy<Value = ConfidenceMode> {
    prop_oneof![
        (0.0f64..1.0).prop_map(ConfidenceMode::proportional),
        (0.0f64..50.0).prop_map(ConfidenceMode::residual),
    ]
}

#[rstest]
#[case(0, false)]
#[case(6, false)]
#[case(7, true)]
#[case(8, true)]
#[case(9, true)]
#[case(10, false)]
#[case(16, false)]
#[case(17, true)]
#[case(18, true)]
#[case(19, true)]
#[case(20, false)]
#[case(23, false)]
fn rush_hour_flag(#[case] hour: i64, #[case] expected: bool) {
    // 2025-01-08 is a Wednesday
    let t = time_at(1_736_294_400 + hour * 3600);
    let fv = FeatureSynthesizer::default().synthesize(t, &FeatureOverrides::new(), None);
    assert_eq!(fv.get(IS_RUSH_HOUR), Some(if expected { 1.0 } else { 0.0 }));
}

proptest! {
    #[test]
    fn synthesize_is_idempotent(
        t in any_time(),
        traffic in proptest::option::of(0.0f64..20_000.0),
    ) {
        let mut overrides = FeatureOverrides::new();
        if let Some(v) = traffic {
            overrides.insert("traffic_volume".to_string(), v);
        }
        let synthesizer = FeatureSynthesizer::default();
        prop_assert_eq!(
            synthesizer.synthesize(t, &overrides, None),
            synthesizer.synthesize(t, &overrides, None)
        );
    }

    #[test]
    fn weekend_flag_matches_day_of_week(t in any_time()) {
        let fv = FeatureSynthesizer::default().synthesize(t, &FeatureOverrides::new(), None);
        let weekend = t.day_of_week() >= 5;
        prop_assert_eq!(fv.get(IS_WEEKEND), Some(if weekend { 1.0 } else { 0.0 }));
        prop_assert_eq!(fv.get(IS_RUSH_HOUR) == Some(1.0), t.is_rush_hour());
    }

    #[test]
    fn records_stay_within_index_range(
        raw in -1_000.0f64..1_000.0,
        confidence in any_confidence(),
        t in any_time(),
    ) {
        let record = engine(raw, confidence)
            .forecast_one(t, &FeatureOverrides::new())
            .unwrap();
        prop_assert!((AQI_MIN..=AQI_MAX).contains(&record.value()));
        prop_assert!((AQI_MIN..=AQI_MAX).contains(&record.lower()));
        prop_assert!((AQI_MIN..=AQI_MAX).contains(&record.upper()));
        prop_assert!(record.lower() <= record.upper());
        prop_assert_eq!(record.raw_value(), raw);
    }

    #[test]
    fn forecast_is_hourly_from_start(t in any_time(), horizon in 1i64..=168) {
        let series = engine(42.0, ConfidenceMode::default())
            .forecast(t, horizon, &FeatureOverrides::new())
            .unwrap();
        prop_assert_eq!(series.len() as i64, horizon);
        prop_assert_eq!(series.records()[0].timestamp(), t.timestamp());
        for pair in series.records().windows(2) {
            prop_assert_eq!(pair[1].timestamp() - pair[0].timestamp(), chrono::Duration::hours(1));
        }
    }

    #[test]
    fn non_positive_horizon_rejected(horizon in -1_000i64..=0) {
        let err = engine(42.0, ConfidenceMode::default())
            .forecast(time_at(1_736_294_400), horizon, &FeatureOverrides::new())
            .unwrap_err();
        let is_invalid_input = matches!(err, ForecastError::InvalidInput { .. });
        prop_assert!(is_invalid_input);
    }

    #[test]
    fn identical_scenario_has_no_impact(
        t in any_time(),
        traffic in 0.0f64..20_000.0,
        horizon in 1i64..=48,
    ) {
        let overrides = FeatureOverrides::from([("traffic_volume".to_string(), traffic)]);
        let impact = engine(80.0, ConfidenceMode::default())
            .forecast_what_if(t, &overrides, &overrides, horizon)
            .unwrap()
            .impact();
        prop_assert_eq!(impact.reduction, 0.0);
        prop_assert_eq!(impact.reduction_percentage, 0.0);
    }
}

#[test]
fn unbound_engine_reports_model_unavailable() {
    let engine = ForecastEngine::new(None, FeatureSynthesizer::default(), EngineSettings::default());
    let t = time_at(1_736_294_400);
    assert!(matches!(
        engine.forecast(t, 48, &FeatureOverrides::new()),
        Err(ForecastError::ModelUnavailable)
    ));
}
