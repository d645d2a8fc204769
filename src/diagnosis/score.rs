//! Composite health score
//!
//! ```text
//! score = 100
//!       - min(10 * critical, 40)
//!       - min(3 * warning, 30)
//!       - min(1 * info, 10)
//!       - (1 - coverage / 100) * 15      (only when coverage < 100)
//! clamped to [0, 100]
//! ```

use crate::models::HealthLabel;

const CRITICAL_WEIGHT: f64 = 10.0;
const CRITICAL_CAP: f64 = 40.0;
const WARNING_WEIGHT: f64 = 3.0;
const WARNING_CAP: f64 = 30.0;
const INFO_WEIGHT: f64 = 1.0;
const INFO_CAP: f64 = 10.0;
const COVERAGE_WEIGHT: f64 = 15.0;

/// Unrounded health score in [0, 100]
pub fn health_score(critical: usize, warning: usize, info: usize, estimated_coverage: f64) -> f64 {
    let mut score = 100.0;
    score -= (critical as f64 * CRITICAL_WEIGHT).min(CRITICAL_CAP);
    score -= (warning as f64 * WARNING_WEIGHT).min(WARNING_CAP);
    score -= (info as f64 * INFO_WEIGHT).min(INFO_CAP);

    if estimated_coverage < 100.0 {
        score -= (1.0 - estimated_coverage / 100.0) * COVERAGE_WEIGHT;
    }

    score.clamp(0.0, 100.0)
}

pub fn health_label(score: f64) -> HealthLabel {
    HealthLabel::from_score(score)
}

/// Round to one decimal for the report
pub fn round_score(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}
