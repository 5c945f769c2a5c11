use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::{AqiCategory, TimePoint};

/// One hourly prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    timestamp: DateTime<FixedOffset>,
    raw_value: f64,
    value: f64,
    lower: f64,
    upper: f64,
    category: AqiCategory,
}

impl PredictionRecord {
    pub(crate) fn new(
        time: TimePoint,
        raw_value: f64,
        value: f64,
        (lower, upper): (f64, f64),
        category: AqiCategory,
    ) -> Self {
        Self {
            timestamp: time.timestamp(),
            raw_value,
            value,
            lower,
            upper,
            category,
        }
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub fn time_point(&self) -> TimePoint {
        TimePoint::new(self.timestamp)
    }

    /// Model output before clipping
    pub fn raw_value(&self) -> f64 {
        self.raw_value
    }

    /// Model output clipped to the displayable range
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn category(&self) -> AqiCategory {
        self.category
    }
}

/// Summary statistics over clipped values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation
    pub std: f64,
}

impl ForecastSummary {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                min: 0.0,
                max: 0.0,
                std: 0.0,
            };
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let min = values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

        Self {
            mean,
            min,
            max,
            std: variance.sqrt(),
        }
    }
}

/// Consecutive hourly predictions and their summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSeries {
    start_time: DateTime<FixedOffset>,
    records: Vec<PredictionRecord>,
    summary: ForecastSummary,
}

impl ForecastSeries {
    pub(crate) fn new(start: TimePoint, records: Vec<PredictionRecord>) -> Self {
        let values: Vec<f64> = records.iter().map(|r| r.value).collect();
        let summary = ForecastSummary::from_values(&values);
        Self {
            start_time: start.timestamp(),
            records,
            summary,
        }
    }

    pub fn start_time(&self) -> DateTime<FixedOffset> {
        self.start_time
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.records
    }

    pub fn summary(&self) -> ForecastSummary {
        self.summary
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|r| r.value)
    }

    pub fn into_records(self) -> Vec<PredictionRecord> {
        self.records
    }
}

/// Impact of a scenario relative to its baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioImpact {
    pub baseline_avg: f64,
    pub scenario_avg: f64,
    /// `baseline_avg - scenario_avg`; positive means the scenario is cleaner
    pub reduction: f64,
    /// Reduction relative to the baseline average, 0 when the baseline average is 0
    pub reduction_percentage: f64,
}

impl ScenarioImpact {
    pub fn between(baseline: &ForecastSeries, scenario: &ForecastSeries) -> Self {
        let baseline_avg = baseline.summary().mean;
        let scenario_avg = scenario.summary().mean;
        let reduction = baseline_avg - scenario_avg;
        let reduction_percentage = if baseline_avg == 0.0 {
            0.0
        } else {
            reduction / baseline_avg * 100.0
        };

        Self {
            baseline_avg,
            scenario_avg,
            reduction,
            reduction_percentage,
        }
    }
}

/// Baseline and scenario forecasts over identical timestamps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioComparison {
    baseline: ForecastSeries,
    scenario: ForecastSeries,
    impact: ScenarioImpact,
}

impl ScenarioComparison {
    pub(crate) fn new(baseline: ForecastSeries, scenario: ForecastSeries) -> Self {
        debug_assert_eq!(baseline.len(), scenario.len());
        let impact = ScenarioImpact::between(&baseline, &scenario);
        Self {
            baseline,
            scenario,
            impact,
        }
    }

    pub fn baseline(&self) -> &ForecastSeries {
        &self.baseline
    }

    pub fn scenario(&self) -> &ForecastSeries {
        &self.scenario
    }

    pub fn impact(&self) -> ScenarioImpact {
        self.impact
    }
}
