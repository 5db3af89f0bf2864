use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metrics::AnalysisResult;
use crate::profile::ObstacleProfile;

const START_SCORE: f64 = 100.0;

const TAKEOFF_WINDOW_M: (f64, f64) = (1.7, 2.3);
const TAKEOFF_PENALTY: f64 = 10.0;
// Landing placement decides whether the next stride is safe, so it weighs more.
const LANDING_WINDOW_M: (f64, f64) = (0.9, 1.4);
const LANDING_PENALTY: f64 = 15.0;
const FLIGHT_TIME_TOLERANCE: f64 = 1.15;
const FLIGHT_TIME_PENALTY: f64 = 10.0;
const CLEARANCE_TOLERANCE: f64 = 1.5;
const CLEARANCE_PENALTY: f64 = 5.0;
const MAX_TAKEOFF_CONTACT_SEC: f64 = 0.18;
const CONTACT_PENALTY: f64 = 5.0;

/// Ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TechniqueRating {
    WorldClass,
    Elite,
    Advanced,
    Intermediate,
    NeedsWork,
}

impl TechniqueRating {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 95.0 => TechniqueRating::WorldClass,
            s if s >= 85.0 => TechniqueRating::Elite,
            s if s >= 75.0 => TechniqueRating::Advanced,
            s if s >= 60.0 => TechniqueRating::Intermediate,
            _ => TechniqueRating::NeedsWork,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TechniqueRating::WorldClass => "WORLD CLASS",
            TechniqueRating::Elite => "ELITE",
            TechniqueRating::Advanced => "ADVANCED",
            TechniqueRating::Intermediate => "INTERMEDIATE",
            TechniqueRating::NeedsWork => "NEEDS WORK",
        }
    }
}

impl fmt::Display for TechniqueRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueAssessment {
    pub score: f64,
    pub rating: TechniqueRating,
    pub remarks: Vec<String>,
}

impl TechniqueAssessment {
    /// Remarks joined into a single comment line
    pub fn comment(&self) -> String {
        self.remarks.join(" ")
    }
}

/// Rule-based rating of a clearance.
#[derive(Debug, Clone, Copy, Default)]
pub struct TechniqueScorer;

impl TechniqueScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn assess(&self, result: &AnalysisResult, profile: &ObstacleProfile) -> TechniqueAssessment {
        let mut score = START_SCORE;
        let mut remarks = Vec::new();

        if result.takeoff_distance_m < TAKEOFF_WINDOW_M.0 {
            score -= TAKEOFF_PENALTY;
            remarks.push(format!(
                "Takeoff at {:.2} m is too close to the hurdle; the lead leg risks hitting the bar.",
                result.takeoff_distance_m
            ));
        } else if result.takeoff_distance_m > TAKEOFF_WINDOW_M.1 {
            score -= TAKEOFF_PENALTY;
            remarks.push(format!(
                "Takeoff at {:.2} m is too far from the hurdle; the flight arc gets long and floaty.",
                result.takeoff_distance_m
            ));
        }

        if result.landing_distance_m < LANDING_WINDOW_M.0 {
            score -= LANDING_PENALTY;
            remarks.push(format!(
                "Landing at {:.2} m is too close; the trail leg comes down on top of the hurdle.",
                result.landing_distance_m
            ));
        } else if result.landing_distance_m > LANDING_WINDOW_M.1 {
            score -= LANDING_PENALTY;
            remarks.push(format!(
                "Landing at {:.2} m overreaches; the first stride off the hurdle loses balance.",
                result.landing_distance_m
            ));
        }

        let max_flight = profile.baseline_flight_time_sec * FLIGHT_TIME_TOLERANCE;
        if result.flight_time_sec > max_flight {
            score -= FLIGHT_TIME_PENALTY;
            remarks.push(format!(
                "Flight time of {:.3} s is long for this height; attack the hurdle lower.",
                result.flight_time_sec
            ));
        }

        if result.clearance_cm > profile.baseline_clearance_cm * CLEARANCE_TOLERANCE {
            score -= CLEARANCE_PENALTY;
            remarks.push(format!(
                "Clearing by {:.1} cm wastes height; keep the hips level over the bar.",
                result.clearance_cm
            ));
        }

        if result.takeoff_contact_sec > MAX_TAKEOFF_CONTACT_SEC {
            score -= CONTACT_PENALTY;
            remarks.push(format!(
                "Takeoff contact of {:.3} s is slow; drive off the ground more actively.",
                result.takeoff_contact_sec
            ));
        }

        if remarks.is_empty() {
            remarks.push("Balanced clearance: takeoff, flight and landing are all in range.".to_string());
        }

        let score = score.max(0.0);
        TechniqueAssessment {
            score,
            rating: TechniqueRating::from_score(score),
            remarks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::baseline_result;

    fn senior() -> ObstacleProfile {
        ObstacleProfile::for_height(106.7).unwrap()
    }

    #[test]
    fn baseline_clearance_is_world_class() {
        let profile = senior();
        let assessment = TechniqueScorer::new().assess(&baseline_result(&profile, 1.0), &profile);

        assert_eq!(assessment.score, 100.0);
        assert_eq!(assessment.rating, TechniqueRating::WorldClass);
        assert_eq!(assessment.remarks.len(), 1);
    }

    #[test]
    fn landing_faults_cost_more_than_takeoff_faults() {
        let profile = senior();
        let scorer = TechniqueScorer::new();

        let short_takeoff = AnalysisResult {
            takeoff_distance_m: 1.5,
            ..baseline_result(&profile, 1.0)
        };
        let short_landing = AnalysisResult {
            landing_distance_m: 0.7,
            ..baseline_result(&profile, 1.0)
        };

        let takeoff = scorer.assess(&short_takeoff, &profile);
        let landing = scorer.assess(&short_landing, &profile);
        assert_eq!(takeoff.score, 90.0);
        assert_eq!(takeoff.rating, TechniqueRating::Elite);
        assert_eq!(landing.score, 85.0);
        assert!(landing.score < takeoff.score);
    }

    #[test]
    fn stacked_faults_need_work() {
        let profile = senior();
        let sloppy = AnalysisResult {
            takeoff_distance_m: 2.6,
            landing_distance_m: 1.7,
            flight_time_sec: 0.5,
            clearance_cm: 50.0,
            takeoff_contact_sec: 0.22,
            ..baseline_result(&profile, 1.0)
        };
        let assessment = TechniqueScorer::new().assess(&sloppy, &profile);

        assert_eq!(assessment.score, 55.0);
        assert_eq!(assessment.rating, TechniqueRating::NeedsWork);
        assert_eq!(assessment.remarks.len(), 5);
        assert!(assessment.comment().contains("overreaches"));
    }

    #[test]
    fn ratings_are_ordered() {
        assert!(TechniqueRating::WorldClass < TechniqueRating::NeedsWork);
        assert_eq!(TechniqueRating::from_score(75.0), TechniqueRating::Advanced);
        assert_eq!(TechniqueRating::from_score(74.9), TechniqueRating::Intermediate);
        assert_eq!(TechniqueRating::NeedsWork.to_string(), "NEEDS WORK");
    }
}
