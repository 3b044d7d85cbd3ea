//! Exponential decay of scores over elapsed time.
//!
//! Times are in hours. A decay constant `k` relates to the half-life by
//! `k = ln 2 / half_life`.

use crate::error::require_positive;
use crate::scoring::{score_session, SCORE_CEILING};
use crate::{Error, Result, ScoringConstants, SessionRecord};
use chrono::{DateTime, Utc};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Decay constant per hour for a half-life in hours
pub fn decay_constant(half_life_hours: f64) -> Result<f64> {
    let half_life = require_positive("half_life_hours", half_life_hours)?;
    Ok(std::f64::consts::LN_2 / half_life)
}

/// `score × exp(-ln 2 / half_life × elapsed)`
///
/// Negative elapsed time (clock skew) is clamped to zero.
pub fn apply_decay(score: f64, elapsed_hours: f64, half_life_hours: f64) -> Result<f64> {
    let k = decay_constant(half_life_hours)?;
    if !score.is_finite() {
        return Err(Error::invalid("score", format!("{} is not finite", score)));
    }
    if !elapsed_hours.is_finite() {
        return Err(Error::invalid(
            "elapsed_hours",
            format!("{} is not finite", elapsed_hours),
        ));
    }
    if elapsed_hours < 0.0 {
        tracing::debug!(
            "Negative elapsed time {:.4}h clamped to zero",
            elapsed_hours
        );
    }
    let elapsed = elapsed_hours.max(0.0);
    Ok(score * (-k * elapsed).exp())
}

fn check_decay_query(score: f64, decay_constant: f64) -> Result<()> {
    require_positive("decay_constant", decay_constant)?;
    if !score.is_finite() || score <= 0.0 {
        return Err(Error::UndefinedDecayQuery(format!(
            "score must be positive, got {}",
            score
        )));
    }
    Ok(())
}

/// Hours until `score` decays to `zero_floor`
///
/// Pure exponential decay never reaches zero, so the floor stands in for it.
/// Returns 0 when the score is already at or below the floor.
pub fn time_until_zero(score: f64, decay_constant: f64, zero_floor: f64) -> Result<f64> {
    check_decay_query(score, decay_constant)?;
    let floor = require_positive("zero_floor", zero_floor)?;
    if score <= floor {
        return Ok(0.0);
    }
    Ok(-(floor / score).ln() / decay_constant)
}

/// Hours until a score above the saturation ceiling decays back to it
///
/// Returns 0 for scores already at or below the ceiling.
pub fn time_until_saturation(score: f64, decay_constant: f64) -> Result<f64> {
    check_decay_query(score, decay_constant)?;
    if score <= SCORE_CEILING {
        return Ok(0.0);
    }
    Ok((score / SCORE_CEILING).ln() / decay_constant)
}

/// Hours between two instants; negative when `to` precedes `from`
pub fn elapsed_hours(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_HOUR
}

/// Sum of each session's score decayed by the time since it was recorded
pub fn current_level(
    sessions: &[SessionRecord],
    constants: &ScoringConstants,
    now: DateTime<Utc>,
) -> Result<f64> {
    sessions.iter().try_fold(0.0, |total, session| {
        let score = score_session(session, constants)?;
        let elapsed = elapsed_hours(session.recorded_at, now);
        let decayed = apply_decay(score, elapsed, constants.decay_half_life_hours)?;
        Ok(total + decayed)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Frequency, Strain};
    use chrono::Duration;
    use uuid::Uuid;

    const EPS: f64 = 1e-9;

    fn session_at(recorded_at: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            recorded_at,
            volume_liters: 6.0,
            thc_concentration: 0.05,
            inhalation_seconds: 5.0,
            strain: Strain::Sativa,
            frequency: Frequency::Daily,
            body_weight_kg: 70.0,
            physiology: None,
        }
    }

    #[test]
    fn test_no_elapsed_time_no_decay() {
        for half_life in [0.5, 2.0, 7.25] {
            assert_eq!(apply_decay(42.0, 0.0, half_life).unwrap(), 42.0);
        }
    }

    #[test]
    fn test_one_half_life_halves() {
        for half_life in [0.5, 2.0, 7.25] {
            let decayed = apply_decay(42.0, half_life, half_life).unwrap();
            assert!((decayed - 21.0).abs() < EPS);
        }
    }

    #[test]
    fn test_negative_elapsed_clamped() {
        assert_eq!(apply_decay(42.0, -3.0, 2.0).unwrap(), 42.0);
    }

    #[test]
    fn test_invalid_decay_arguments() {
        assert!(apply_decay(42.0, 1.0, 0.0).is_err());
        assert!(apply_decay(42.0, 1.0, -2.0).is_err());
        assert!(apply_decay(42.0, f64::NAN, 2.0).is_err());
        assert!(matches!(
            apply_decay(f64::NAN, 1.0, 2.0),
            Err(Error::InvalidInput { field: "score", .. })
        ));
        assert!(apply_decay(f64::INFINITY, 1.0, 2.0).is_err());
        assert!(apply_decay(f64::NEG_INFINITY, 1.0, 2.0).is_err());
        assert!(decay_constant(f64::INFINITY).is_err());
    }

    #[test]
    fn test_time_until_zero() {
        let k = decay_constant(2.0).unwrap();
        let hours = time_until_zero(100.0, k, 0.01).unwrap();
        assert!((hours - (10_000f64).ln() / k).abs() < EPS);

        // Decaying for that long lands on the floor
        let decayed = apply_decay(100.0, hours, 2.0).unwrap();
        assert!((decayed - 0.01).abs() < EPS);

        assert_eq!(time_until_zero(0.005, k, 0.01).unwrap(), 0.0);
    }

    #[test]
    fn test_time_until_zero_undefined_for_non_positive() {
        let k = decay_constant(2.0).unwrap();
        assert!(matches!(
            time_until_zero(0.0, k, 0.01),
            Err(Error::UndefinedDecayQuery(_))
        ));
        assert!(matches!(
            time_until_zero(-5.0, k, 0.01),
            Err(Error::UndefinedDecayQuery(_))
        ));
        assert!(matches!(
            time_until_zero(10.0, 0.0, 0.01),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_time_until_saturation() {
        let k = decay_constant(2.0).unwrap();
        // Twice the ceiling takes exactly one half-life
        let hours = time_until_saturation(200.0, k).unwrap();
        assert!((hours - 2.0).abs() < EPS);
        assert_eq!(time_until_saturation(100.0, k).unwrap(), 0.0);
        assert_eq!(time_until_saturation(40.0, k).unwrap(), 0.0);
        assert!(matches!(
            time_until_saturation(0.0, k),
            Err(Error::UndefinedDecayQuery(_))
        ));
    }

    #[test]
    fn test_elapsed_hours() {
        let now = Utc::now();
        assert!((elapsed_hours(now - Duration::minutes(90), now) - 1.5).abs() < EPS);
        assert!(elapsed_hours(now + Duration::hours(1), now) < 0.0);
    }

    #[test]
    fn test_current_level_decays_each_session() {
        let constants = ScoringConstants::default();
        let now = Utc::now();
        let sessions = vec![
            session_at(now),
            session_at(now - Duration::hours(2)),
            session_at(now - Duration::hours(4)),
        ];

        let level = current_level(&sessions, &constants, now).unwrap();
        assert!((level - (15.0 + 7.5 + 3.75)).abs() < 1e-6);
    }

    #[test]
    fn test_current_level_future_session_not_amplified() {
        let constants = ScoringConstants::default();
        let now = Utc::now();
        let sessions = vec![session_at(now + Duration::hours(3))];

        let level = current_level(&sessions, &constants, now).unwrap();
        assert!((level - 15.0).abs() < EPS);
    }
}
