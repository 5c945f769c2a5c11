use axum::{body::Bytes, extract::State, Json};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::{error::ApiError, AppState};
use crate::{
    error::ForecastError,
    domain::{parse_or_now, AqiCategory, ForecastSeries, ForecastSummary, PredictionRecord},
    forecast::parse_overrides,
    ml::FeatureVector,
};

/// POST /predict request body
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PredictRequest {
    timestamp: Option<String>,
    features: Option<Map<String, Value>>,
}

/// POST /predict-48h request body
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct HorizonRequest {
    start_time: Option<String>,
    baseline_features: Option<Map<String, Value>>,
    #[validate(range(min = 1))]
    horizon_hours: Option<i64>,
}

/// POST /predict-whatif request body
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct WhatIfRequest {
    baseline: Option<Map<String, Value>>,
    scenario: Option<Map<String, Value>>,
    #[validate(range(min = 1))]
    duration_hours: Option<i64>,
    start_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    timestamp: String,
    pollution_prediction: f64,
    confidence_lower: f64,
    confidence_upper: f64,
    aqi_category: AqiCategory,
    features_used: FeatureVector,
}

#[derive(Debug, Serialize)]
pub struct HourlyPrediction {
    timestamp: String,
    hour: u32,
    day: String,
    pollution_prediction: f64,
    confidence_lower: f64,
    confidence_upper: f64,
    aqi_category: AqiCategory,
}

impl From<&PredictionRecord> for HourlyPrediction {
    fn from(record: &PredictionRecord) -> Self {
        let time = record.time_point();
        Self {
            timestamp: time.to_iso_string(),
            hour: time.hour(),
            day: time.day_name(),
            pollution_prediction: round2(record.value()),
            confidence_lower: round2(record.lower()),
            confidence_upper: round2(record.upper()),
            aqi_category: record.category(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    mean: f64,
    max: f64,
    min: f64,
    std: f64,
}

impl From<ForecastSummary> for SummaryResponse {
    fn from(s: ForecastSummary) -> Self {
        Self {
            mean: round2(s.mean),
            max: round2(s.max),
            min: round2(s.min),
            std: round2(s.std),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HorizonResponse {
    predictions: Vec<HourlyPrediction>,
    summary: SummaryResponse,
    start_time: String,
}

#[derive(Debug, Serialize)]
pub struct ScenarioPoint {
    timestamp: String,
    hour: u32,
    pollution_prediction: f64,
    aqi_category: AqiCategory,
}

impl From<&PredictionRecord> for ScenarioPoint {
    fn from(record: &PredictionRecord) -> Self {
        let time = record.time_point();
        Self {
            timestamp: time.to_iso_string(),
            hour: time.hour(),
            pollution_prediction: round2(record.value()),
            aqi_category: record.category(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImpactResponse {
    baseline_avg: f64,
    scenario_avg: f64,
    reduction: f64,
    reduction_percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct WhatIfResponse {
    baseline: Vec<ScenarioPoint>,
    scenario: Vec<ScenarioPoint>,
    impact: ImpactResponse,
    scenario_changes: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    features: Vec<String>,
    count: usize,
}

/// POST /predict - Single-hour prediction
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    // model availability is reported before any input problem
    ensure_model(&state)?;
    let req: PredictRequest = parse_body(&body)?;

    let time = parse_or_now("timestamp", req.timestamp.as_deref())?;
    let overrides = parse_overrides("features", &req.features.unwrap_or_default())?;
    let point = state.engine.predict_point(time, &overrides)?;

    tracing::info!(
        timestamp = %time.to_iso_string(),
        prediction = point.record.value(),
        category = %point.record.category(),
        "single prediction"
    );

    Ok(Json(PredictResponse {
        timestamp: time.to_iso_string(),
        pollution_prediction: round2(point.record.value()),
        confidence_lower: round2(point.record.lower()),
        confidence_upper: round2(point.record.upper()),
        aqi_category: point.record.category(),
        features_used: point.features,
    }))
}

/// POST /predict-48h - Hourly forecast, 48 hours unless `horizon_hours` is given
pub async fn predict_horizon(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<HorizonResponse>, ApiError> {
    ensure_model(&state)?;
    let req: HorizonRequest = parse_body(&body)?;

    let start = parse_or_now("start_time", req.start_time.as_deref())?;
    let overrides = parse_overrides("baseline_features", &req.baseline_features.unwrap_or_default())?;
    let horizon = req
        .horizon_hours
        .unwrap_or(state.cfg.forecast.default_horizon_hours);

    let series = state.engine.forecast(start, horizon, &overrides)?;
    tracing::info!(
        start = %start.to_iso_string(),
        horizon,
        mean = series.summary().mean,
        "horizon forecast"
    );

    Ok(Json(HorizonResponse {
        predictions: series.records().iter().map(HourlyPrediction::from).collect(),
        summary: series.summary().into(),
        start_time: start.to_iso_string(),
    }))
}

/// POST /predict-whatif - Baseline vs scenario comparison
pub async fn predict_what_if(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<WhatIfResponse>, ApiError> {
    ensure_model(&state)?;
    let req: WhatIfRequest = parse_body(&body)?;

    let start = parse_or_now("start_time", req.start_time.as_deref())?;
    let baseline = parse_overrides("baseline", &req.baseline.unwrap_or_default())?;
    let scenario_raw = req.scenario.unwrap_or_default();
    let scenario = parse_overrides("scenario", &scenario_raw)?;
    let horizon = req
        .duration_hours
        .unwrap_or(state.cfg.forecast.whatif_horizon_hours);

    let comparison = state
        .engine
        .forecast_what_if(start, &baseline, &scenario, horizon)?;
    let impact = comparison.impact();
    tracing::info!(
        horizon,
        changes = scenario.len(),
        reduction = impact.reduction,
        reduction_percentage = impact.reduction_percentage,
        "what-if scenario"
    );

    Ok(Json(WhatIfResponse {
        baseline: scenario_points(comparison.baseline()),
        scenario: scenario_points(comparison.scenario()),
        impact: ImpactResponse {
            baseline_avg: round2(impact.baseline_avg),
            scenario_avg: round2(impact.scenario_avg),
            reduction: round2(impact.reduction),
            reduction_percentage: round2(impact.reduction_percentage),
        },
        scenario_changes: scenario_raw,
    }))
}

/// GET /features - Feature names in model input order
pub async fn list_features(State(state): State<AppState>) -> Json<FeaturesResponse> {
    let features = state.engine.feature_names();
    Json(FeaturesResponse {
        count: features.len(),
        features,
    })
}

fn ensure_model(state: &AppState) -> Result<(), ApiError> {
    if state.engine.is_model_loaded() {
        Ok(())
    } else {
        Err(ForecastError::ModelUnavailable.into())
    }
}

/// An empty body is treated as `{}`
fn parse_body<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default + Validate,
{
    let req: T = if body.iter().all(u8::is_ascii_whitespace) {
        T::default()
    } else {
        serde_json::from_slice(body)?
    };
    req.validate()?;
    Ok(req)
}

fn scenario_points(series: &ForecastSeries) -> Vec<ScenarioPoint> {
    series.records().iter().map(ScenarioPoint::from).collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.345678), 12.35);
        assert_eq!(round2(0.004), 0.0);
        assert_eq!(round2(300.0), 300.0);
    }

    #[test]
    fn test_parse_body_defaults() {
        let req: HorizonRequest = parse_body(b"").unwrap();
        assert!(req.start_time.is_none());
        assert!(req.horizon_hours.is_none());

        let req: WhatIfRequest = parse_body(br#"{"scenario": {"traffic_volume": 3000}}"#).unwrap();
        assert_eq!(req.scenario.unwrap().len(), 1);
    }

    #[test]
    fn test_parse_body_rejects() {
        assert!(matches!(
            parse_body::<HorizonRequest>(br#"{"horizon_hours": 0}"#),
            Err(ApiError::ValidationError(_))
        ));
        assert!(matches!(
            parse_body::<PredictRequest>(b"{not json"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
