pub mod technique;

pub use technique::{TechniqueAssessment, TechniqueRating, TechniqueScorer};

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};
use crate::metrics::AnalysisResult;
use crate::profile::ObstacleProfile;

/// Confidence attached to synthesized results
pub const SIMULATED_CONFIDENCE: f64 = 0.5;

/// Relative spread around the bracket baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariationConfig {
    /// Flight time, distances and clearance
    #[serde(default = "default_primary")]
    pub primary: f64,
    /// Ground contact times
    #[serde(default = "default_contact")]
    pub contact: f64,
}

fn default_primary() -> f64 {
    0.2
}

fn default_contact() -> f64 {
    0.1
}

impl Default for VariationConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            contact: default_contact(),
        }
    }
}

impl VariationConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("primary", self.primary), ("contact", self.contact)] {
            if !value.is_finite() || !(0.0..1.0).contains(&value) {
                return Err(AnalysisError::Validation(format!(
                    "{name} variation must lie in [0, 1), got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Synthesizes plausible metrics from the obstacle's bracket baseline.
///
/// Each field is `baseline × (1 + u)` with `u` drawn uniformly from
/// `[-variation / 2, variation / 2]`. All randomness comes from the caller's
/// generator, so a seeded generator reproduces the output exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedMetricsGenerator {
    variation: VariationConfig,
}

impl SimulatedMetricsGenerator {
    pub fn new(variation: VariationConfig) -> Self {
        Self { variation }
    }

    pub fn variation(&self) -> VariationConfig {
        self.variation
    }

    pub fn generate<R: Rng + ?Sized>(&self, profile: &ObstacleProfile, rng: &mut R) -> AnalysisResult {
        let primary = self.variation.primary;
        let contact = self.variation.contact;

        let result = AnalysisResult {
            flight_time_sec: jitter(profile.baseline_flight_time_sec, primary, rng),
            takeoff_distance_m: jitter(profile.baseline_takeoff_distance_m, primary, rng),
            landing_distance_m: jitter(profile.baseline_landing_distance_m, primary, rng),
            takeoff_contact_sec: jitter(profile.baseline_takeoff_contact_sec, contact, rng),
            landing_contact_sec: jitter(profile.baseline_landing_contact_sec, contact, rng),
            clearance_cm: jitter(profile.baseline_clearance_cm, primary, rng),
            confidence: SIMULATED_CONFIDENCE,
            technical_score: None,
            comment: None,
        }
        .rounded();

        debug!(target: "hurdle_core::simulate",
            "Simulated {:?} metrics: flight {:.3}s, takeoff {:.2}m, landing {:.2}m",
            profile.category, result.flight_time_sec, result.takeoff_distance_m, result.landing_distance_m
        );

        result
    }
}

fn jitter<R: Rng + ?Sized>(baseline: f64, variation: f64, rng: &mut R) -> f64 {
    let half = (variation / 2.0).abs();
    let u = rng.gen_range(-half..=half);
    (baseline * (1.0 + u)).max(0.0)
}
