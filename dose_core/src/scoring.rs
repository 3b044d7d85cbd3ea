//! Dose scoring: per-session score, aggregation, normalization, classification.
//!
//! ```text
//! raw = (volume / reference_lung_capacity)
//!     × (thc_concentration / reference_thc_concentration)
//!     × inhalation_factor(inhalation_seconds)
//!     × strain_factor × frequency_factor
//!     × (reference_body_weight / body_weight)
//!     × physiology_factor
//!     × calibration_multiplier
//! ```

use crate::config::{FrequencyFactors, InhalationModel, StrainFactors};
use crate::{EffectTier, Error, Frequency, Result, ScoringConstants, SessionRecord, Strain};

/// Saturation ceiling of the normalized scale
pub const SCORE_CEILING: f64 = 100.0;

/// Upper (inclusive) bound of each band below the top one
const TIER_BOUNDS: [(f64, EffectTier); 4] = [
    (10.0, EffectTier::MildModerate),
    (30.0, EffectTier::ModerateHigh),
    (50.0, EffectTier::High),
    (70.0, EffectTier::VeryHigh),
];

/// Multiplier for a strain; unrecognized strains are neutral
pub fn strain_factor(strain: &Strain, factors: &StrainFactors) -> f64 {
    match strain {
        Strain::Sativa => factors.sativa,
        Strain::Indica => factors.indica,
        Strain::Hybrid => factors.hybrid,
        Strain::Unknown => 1.0,
        Strain::Other(name) => {
            tracing::warn!("Unrecognized strain '{}', using neutral factor 1.0", name);
            1.0
        }
    }
}

/// Multiplier for a usage frequency; unrecognized frequencies are neutral
pub fn frequency_factor(frequency: &Frequency, factors: &FrequencyFactors) -> f64 {
    match frequency {
        Frequency::Daily => factors.daily,
        Frequency::Weekly => factors.weekly,
        Frequency::Monthly => factors.monthly,
        Frequency::Unknown => 1.0,
        Frequency::Other(name) => {
            tracing::warn!("Unrecognized frequency '{}', using neutral factor 1.0", name);
            1.0
        }
    }
}

/// Inhalation factor, 1.0 at the reference time under either model
pub fn inhalation_factor(seconds: f64, constants: &ScoringConstants) -> f64 {
    match constants.inhalation {
        InhalationModel::Linear => seconds / constants.reference_time,
        InhalationModel::Saturating { absorption_rate } => {
            let absorbed = 1.0 - (-absorption_rate * seconds).exp();
            let reference = 1.0 - (-absorption_rate * constants.reference_time).exp();
            absorbed / reference
        }
    }
}

/// Raw score of a single session
pub fn score_session(session: &SessionRecord, constants: &ScoringConstants) -> Result<f64> {
    session.validate()?;

    let physiology = match session.physiology {
        Some(ref physiology) => crate::physiology::physiology_factor(
            physiology,
            session.body_weight_kg,
            &constants.physiology,
        )?,
        None => 1.0,
    };

    let score = (session.volume_liters / constants.reference_lung_capacity)
        * (session.thc_concentration / constants.reference_thc_concentration)
        * inhalation_factor(session.inhalation_seconds, constants)
        * strain_factor(&session.strain, &constants.strain_factors)
        * (constants.reference_body_weight / session.body_weight_kg)
        * frequency_factor(&session.frequency, &constants.frequency_factors)
        * physiology
        * constants.calibration_multiplier;

    if !score.is_finite() {
        return Err(Error::invalid(
            "session",
            format!("score for session {} is not finite", session.id),
        ));
    }

    tracing::debug!("Scored session {}: {:.4}", session.id, score);
    Ok(score)
}

/// Sum of session scores; fails on the first invalid session
pub fn aggregate_score(sessions: &[SessionRecord], constants: &ScoringConstants) -> Result<f64> {
    sessions
        .iter()
        .try_fold(0.0, |total, session| Ok(total + score_session(session, constants)?))
}

/// Clamp a raw score to `[0, 100]`; NaN maps to 0
pub fn normalize(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, SCORE_CEILING)
}

/// Effect tier of a score. Band upper bounds are inclusive.
pub fn classify(normalized_score: f64) -> EffectTier {
    let score = normalize(normalized_score);
    TIER_BOUNDS
        .iter()
        .find(|(upper, _)| score <= *upper)
        .map(|(_, tier)| *tier)
        .unwrap_or(EffectTier::ExtremelyHigh)
}
