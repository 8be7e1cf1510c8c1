use thiserror::Error;

use crate::model::Beamline;

/// Smallest particle count the twiss covariance estimate is defined for.
pub const MIN_PARTICLES: u32 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreflightIssue {
    #[error("beamline is empty; add at least one segment")]
    EmptyBeamline,
    #[error("interval must be greater than zero")]
    NonPositiveInterval,
    #[error("particle count must be at least {MIN_PARTICLES} (got {0})")]
    TooFewParticles(u32),
}

/// Local gate run before a simulate request is issued. Returns every
/// violation so the user can fix them in one pass; an empty list means the
/// request may go out.
pub fn preflight(beamline: &Beamline, num_particles: u32, interval: f64) -> Vec<PreflightIssue> {
    let mut issues = Vec::new();
    if beamline.is_empty() {
        issues.push(PreflightIssue::EmptyBeamline);
    }
    if !(interval > 0.0) {
        issues.push(PreflightIssue::NonPositiveInterval);
    }
    if num_particles < MIN_PARTICLES {
        issues.push(PreflightIssue::TooFewParticles(num_particles));
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use beambench_protocol::SegmentCatalog;

    fn one_segment_beamline() -> Beamline {
        let catalog: SegmentCatalog =
            serde_json::from_str(r#"{"Drift": {"length": 1, "color": "gray"}}"#).unwrap();
        let mut beamline = Beamline::new();
        beamline.insert(&catalog, "Drift").unwrap();
        beamline
    }

    #[test]
    fn valid_inputs_pass() {
        assert!(preflight(&one_segment_beamline(), 1000, 0.05).is_empty());
    }

    #[test]
    fn all_violations_are_reported_together() {
        let issues = preflight(&Beamline::new(), 2, 0.0);
        assert_eq!(
            issues,
            [
                PreflightIssue::EmptyBeamline,
                PreflightIssue::NonPositiveInterval,
                PreflightIssue::TooFewParticles(2),
            ]
        );
    }

    #[test]
    fn nan_interval_is_rejected() {
        let issues = preflight(&one_segment_beamline(), 1000, f64::NAN);
        assert_eq!(issues, [PreflightIssue::NonPositiveInterval]);
    }
}
