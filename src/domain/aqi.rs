use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

/// Lower bound of the displayable pollution index
pub const AQI_MIN: f64 = 0.0;
/// Upper bound of the displayable pollution index
pub const AQI_MAX: f64 = 300.0;

/// AQI category buckets with inclusive upper bounds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
pub enum AqiCategory {
    #[serde(rename = "Good")]
    #[strum(serialize = "Good")]
    Good,
    #[serde(rename = "Moderate")]
    #[strum(serialize = "Moderate")]
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    #[strum(serialize = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    #[serde(rename = "Unhealthy")]
    #[strum(serialize = "Unhealthy")]
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    #[strum(serialize = "Very Unhealthy")]
    VeryUnhealthy,
    #[serde(rename = "Hazardous")]
    #[strum(serialize = "Hazardous")]
    Hazardous,
}

impl AqiCategory {
    /// Categorize a pollution index value
    pub fn from_value(value: f64) -> Self {
        if value <= 50.0 {
            Self::Good
        } else if value <= 100.0 {
            Self::Moderate
        } else if value <= 150.0 {
            Self::UnhealthyForSensitiveGroups
        } else if value <= 200.0 {
            Self::Unhealthy
        } else if value <= 300.0 {
            Self::VeryUnhealthy
        } else {
            Self::Hazardous
        }
    }

    /// Inclusive upper bound of the bucket, `None` for the open-ended top bucket
    pub fn upper_bound(&self) -> Option<f64> {
        match self {
            Self::Good => Some(50.0),
            Self::Moderate => Some(100.0),
            Self::UnhealthyForSensitiveGroups => Some(150.0),
            Self::Unhealthy => Some(200.0),
            Self::VeryUnhealthy => Some(300.0),
            Self::Hazardous => None,
        }
    }
}

/// Categorize a pollution index value
pub fn categorize(value: f64) -> AqiCategory {
    AqiCategory::from_value(value)
}

/// Clip a value into the displayable index range
pub fn clip_index(value: f64) -> f64 {
    value.clamp(AQI_MIN, AQI_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    #[rstest]
    #[case(0.0, AqiCategory::Good)]
    #[case(50.0, AqiCategory::Good)]
    #[case(51.0, AqiCategory::Moderate)]
    #[case(100.0, AqiCategory::Moderate)]
    #[case(101.0, AqiCategory::UnhealthyForSensitiveGroups)]
    #[case(150.0, AqiCategory::UnhealthyForSensitiveGroups)]
    #[case(151.0, AqiCategory::Unhealthy)]
    #[case(200.0, AqiCategory::Unhealthy)]
    #[case(201.0, AqiCategory::VeryUnhealthy)]
    #[case(300.0, AqiCategory::VeryUnhealthy)]
    #[case(300.5, AqiCategory::Hazardous)]
    fn test_category_thresholds(#[case] value: f64, #[case] expected: AqiCategory) {
        assert_eq!(categorize(value), expected);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(
            AqiCategory::UnhealthyForSensitiveGroups.to_string(),
            "Unhealthy for Sensitive Groups"
        );
        let json = serde_json::to_string(&AqiCategory::VeryUnhealthy).unwrap();
        assert_eq!(json, "\"Very Unhealthy\"");
    }

    #[test]
    fn test_upper_bounds_are_ordered() {
        let bounds: Vec<f64> = AqiCategory::iter().filter_map(|c| c.upper_bound()).collect();
        assert_eq!(bounds.len(), 5);
        assert!(bounds.windows(2).all(|w| w[0] < w[1]));
        for category in AqiCategory::iter() {
            if let Some(bound) = category.upper_bound() {
                assert_eq!(categorize(bound), category);
            }
        }
    }

    #[test]
    fn test_clip_index() {
        assert_eq!(clip_index(-12.0), 0.0);
        assert_eq!(clip_index(412.0), 300.0);
        assert_eq!(clip_index(87.5), 87.5);
    }
}
