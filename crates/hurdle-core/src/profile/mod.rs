use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};

/// Tallest obstacle the baselines are meant for (42 in senior hurdle plus margin)
pub const MAX_OBSTACLE_HEIGHT_CM: f64 = 120.0;

pub const BASELINE_TAKEOFF_CONTACT_SEC: f64 = 0.14;
pub const BASELINE_LANDING_CONTACT_SEC: f64 = 0.12;

/// Height bracket an obstacle falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HurdleCategory {
    /// Up to 76.2 cm (30 in)
    Youth,
    /// Up to 83.8 cm (33 in)
    Women,
    /// Up to 99.1 cm (36–39 in)
    Intermediate,
    /// Anything taller, e.g. 106.7 cm (42 in)
    Senior,
}

struct Bracket {
    upper_cm: f64,
    category: HurdleCategory,
    takeoff_distance_m: f64,
    landing_distance_m: f64,
    flight_time_sec: f64,
    clearance_cm: f64,
}

// Upper bounds are inclusive; the last bracket catches the rest of the domain.
const BRACKETS: [Bracket; 4] = [
    Bracket {
        upper_cm: 76.2,
        category: HurdleCategory::Youth,
        takeoff_distance_m: 1.90,
        landing_distance_m: 1.05,
        flight_time_sec: 0.30,
        clearance_cm: 36.0,
    },
    Bracket {
        upper_cm: 83.8,
        category: HurdleCategory::Women,
        takeoff_distance_m: 1.95,
        landing_distance_m: 1.10,
        flight_time_sec: 0.32,
        clearance_cm: 33.0,
    },
    Bracket {
        upper_cm: 99.1,
        category: HurdleCategory::Intermediate,
        takeoff_distance_m: 2.00,
        landing_distance_m: 1.15,
        flight_time_sec: 0.34,
        clearance_cm: 30.0,
    },
    Bracket {
        upper_cm: MAX_OBSTACLE_HEIGHT_CM,
        category: HurdleCategory::Senior,
        takeoff_distance_m: 2.10,
        landing_distance_m: 1.20,
        flight_time_sec: 0.36,
        clearance_cm: 28.0,
    },
];

/// Obstacle height together with the baseline metrics of its bracket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleProfile {
    pub height_cm: f64,
    pub category: HurdleCategory,
    pub baseline_takeoff_distance_m: f64,
    pub baseline_landing_distance_m: f64,
    pub baseline_flight_time_sec: f64,
    pub baseline_clearance_cm: f64,
    pub baseline_takeoff_contact_sec: f64,
    pub baseline_landing_contact_sec: f64,
}

impl ObstacleProfile {
    /// Looks up the bracket for `height_cm`, rejecting heights outside (0, 120] cm
    pub fn for_height(height_cm: f64) -> Result<Self> {
        validate_height(height_cm)?;

        let bracket = BRACKETS
            .iter()
            .find(|b| height_cm <= b.upper_cm)
            .ok_or_else(|| {
                AnalysisError::Validation(format!(
                    "obstacle height {height_cm} cm does not map to any bracket"
                ))
            })?;

        Ok(Self {
            height_cm,
            category: bracket.category,
            baseline_takeoff_distance_m: bracket.takeoff_distance_m,
            baseline_landing_distance_m: bracket.landing_distance_m,
            baseline_flight_time_sec: bracket.flight_time_sec,
            baseline_clearance_cm: bracket.clearance_cm,
            baseline_takeoff_contact_sec: BASELINE_TAKEOFF_CONTACT_SEC,
            baseline_landing_contact_sec: BASELINE_LANDING_CONTACT_SEC,
        })
    }
}

pub fn validate_height(height_cm: f64) -> Result<()> {
    if !height_cm.is_finite() || height_cm <= 0.0 {
        return Err(AnalysisError::Validation(format!(
            "obstacle height must be a positive number of centimeters, got {height_cm}"
        )));
    }
    if height_cm > MAX_OBSTACLE_HEIGHT_CM {
        return Err(AnalysisError::Validation(format!(
            "obstacle height {height_cm} cm exceeds the supported maximum of {MAX_OBSTACLE_HEIGHT_CM} cm"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_boundaries_are_inclusive() {
        assert_eq!(
            ObstacleProfile::for_height(76.2).unwrap().category,
            HurdleCategory::Youth
        );
        assert_eq!(
            ObstacleProfile::for_height(76.3).unwrap().category,
            HurdleCategory::Women
        );
        assert_eq!(
            ObstacleProfile::for_height(83.8).unwrap().category,
            HurdleCategory::Women
        );
        assert_eq!(
            ObstacleProfile::for_height(91.4).unwrap().category,
            HurdleCategory::Intermediate
        );
        assert_eq!(
            ObstacleProfile::for_height(99.2).unwrap().category,
            HurdleCategory::Senior
        );
    }

    #[test]
    fn senior_height_uses_tallest_baseline() {
        let profile = ObstacleProfile::for_height(106.7).unwrap();
        assert_eq!(profile.category, HurdleCategory::Senior);
        assert_eq!(profile.baseline_takeoff_distance_m, 2.10);
        assert_eq!(profile.baseline_landing_distance_m, 1.20);
        assert_eq!(profile.baseline_flight_time_sec, 0.36);
        assert_eq!(profile.baseline_clearance_cm, 28.0);
    }

    #[test]
    fn invalid_heights_fail_validation() {
        for height in [0.0, -10.0, f64::NAN, f64::INFINITY, 130.0] {
            assert!(
                matches!(
                    ObstacleProfile::for_height(height),
                    Err(AnalysisError::Validation(_))
                ),
                "height {height} should be rejected"
            );
        }
    }
}
