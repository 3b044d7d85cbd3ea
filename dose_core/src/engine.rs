//! Scoring pipeline for a session list.
//!
//! `sessions → raw → normalized → tier`, optionally composed with a decay
//! projection at a given instant.

use crate::decay::{current_level, time_until_saturation, time_until_zero};
use crate::scoring::{aggregate_score, classify, normalize};
use crate::{DecayProjection, Result, ScoreReport, ScoringConstants, SessionRecord};
use chrono::{DateTime, Utc};

/// Score a session list and, when `now` is given, project its decayed level
pub fn evaluate(
    sessions: &[SessionRecord],
    constants: &ScoringConstants,
    now: Option<DateTime<Utc>>,
) -> Result<ScoreReport> {
    let raw_score = aggregate_score(sessions, constants)?;
    let normalized_score = normalize(raw_score);
    let tier = classify(normalized_score);

    let decay = match now {
        Some(at) => Some(project(sessions, constants, at)?),
        None => None,
    };

    tracing::info!(
        "Evaluated {} sessions: raw {:.2}, normalized {:.2}, tier {:?}",
        sessions.len(),
        raw_score,
        normalized_score,
        tier
    );

    Ok(ScoreReport {
        session_count: sessions.len(),
        raw_score,
        normalized_score,
        tier,
        decay,
    })
}

fn project(
    sessions: &[SessionRecord],
    constants: &ScoringConstants,
    at: DateTime<Utc>,
) -> Result<DecayProjection> {
    let current_raw = current_level(sessions, constants, at)?;
    let current_normalized = normalize(current_raw);
    let k = constants.decay_constant();

    // Nothing to decay for an empty list
    let (hours_until_zero, hours_until_unsaturated) = if current_raw > 0.0 {
        (
            Some(time_until_zero(current_raw, k, constants.zero_floor)?),
            time_until_saturation(current_raw, k)?,
        )
    } else {
        (None, 0.0)
    };

    Ok(DecayProjection {
        at,
        current_raw,
        current_normalized,
        current_tier: classify(current_normalized),
        hours_until_zero,
        hours_until_unsaturated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EffectTier, Error, Frequency, Strain};
    use chrono::Duration;
    use uuid::Uuid;

    fn session(hours_ago: i64, now: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            recorded_at: now - Duration::hours(hours_ago),
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
    fn test_evaluate_without_decay() {
        let now = Utc::now();
        let constants = ScoringConstants::default();
        let report = evaluate(&[session(0, now)], &constants, None).unwrap();

        assert_eq!(report.session_count, 1);
        assert!((report.raw_score - 15.0).abs() < 1e-12);
        assert_eq!(report.normalized_score, report.raw_score);
        assert_eq!(report.tier, EffectTier::ModerateHigh);
        assert!(report.decay.is_none());
    }

    #[test]
    fn test_evaluate_empty_list() {
        let constants = ScoringConstants::default();
        let report = evaluate(&[], &constants, Some(Utc::now())).unwrap();

        assert_eq!(report.raw_score, 0.0);
        assert_eq!(report.tier, EffectTier::MildModerate);
        let decay = report.decay.unwrap();
        assert_eq!(decay.hours_until_zero, None);
        assert_eq!(decay.hours_until_unsaturated, 0.0);
    }

    #[test]
    fn test_evaluate_saturates_and_projects() {
        let now = Utc::now();
        let constants = ScoringConstants::default();
        // 14 reference sessions at once: raw 210
        let sessions: Vec<_> = (0..14).map(|_| session(0, now)).collect();

        let report = evaluate(&sessions, &constants, Some(now)).unwrap();
        assert!((report.raw_score - 210.0).abs() < 1e-9);
        assert_eq!(report.normalized_score, 100.0);
        assert_eq!(report.tier, EffectTier::ExtremelyHigh);

        let decay = report.decay.unwrap();
        assert_eq!(decay.current_normalized, 100.0);
        let expected = 2.0 * (210.0f64 / 100.0).log2();
        assert!((decay.hours_until_unsaturated - expected).abs() < 1e-6);
        assert!(decay.hours_until_zero.unwrap() > decay.hours_until_unsaturated);
    }

    #[test]
    fn test_decayed_tier_drops_over_time() {
        let now = Utc::now();
        let constants = ScoringConstants::default();
        let sessions = vec![session(4, now), session(4, now)];

        let report = evaluate(&sessions, &constants, Some(now)).unwrap();
        assert_eq!(report.tier, EffectTier::ModerateHigh);

        let decay = report.decay.unwrap();
        assert!((decay.current_raw - 7.5).abs() < 1e-6);
        assert_eq!(decay.current_tier, EffectTier::MildModerate);
    }

    #[test]
    fn test_invalid_session_fails_whole_evaluation() {
        let now = Utc::now();
        let constants = ScoringConstants::default();
        let mut bad = session(0, now);
        bad.body_weight_kg = -1.0;

        let result = evaluate(&[session(0, now), bad], &constants, Some(now));
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }
}
