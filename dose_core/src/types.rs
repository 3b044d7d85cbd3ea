//! Core domain types for the high-level estimator.
//!
//! This module defines the fundamental types used throughout the system:
//! - Categorical inputs (strain, usage frequency, sex)
//! - Session records and the input they are created from
//! - Effect tiers and score reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::require_positive;
use crate::{Error, Result};

// ============================================================================
// Categorical Inputs
// ============================================================================

/// Cannabis subtype of a session
///
/// `Unknown` is an explicit "not sure" and scores neutral. Names outside the
/// known set are kept verbatim in `Other` so a record round-trips unchanged;
/// they also score neutral but are logged as unrecognized.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum Strain {
    Sativa,
    Indica,
    Hybrid,
    Unknown,
    Other(String),
}

impl Strain {
    pub fn as_str(&self) -> &str {
        match self {
            Strain::Sativa => "sativa",
            Strain::Indica => "indica",
            Strain::Hybrid => "hybrid",
            Strain::Unknown => "unknown",
            Strain::Other(name) => name,
        }
    }
}

impl From<&str> for Strain {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "sativa" => Strain::Sativa,
            "indica" => Strain::Indica,
            "hybrid" => Strain::Hybrid,
            "unknown" => Strain::Unknown,
            _ => Strain::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for Strain {
    fn from(s: String) -> Self {
        Strain::from(s.as_str())
    }
}

impl From<Strain> for String {
    fn from(strain: Strain) -> Self {
        strain.as_str().to_string()
    }
}

impl fmt::Display for Strain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often the user consumes
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Unknown,
    Other(String),
}

impl Frequency {
    pub fn as_str(&self) -> &str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Unknown => "unknown",
            Frequency::Other(name) => name,
        }
    }
}

impl From<&str> for Frequency {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly,
            "monthly" => Frequency::Monthly,
            "unknown" => Frequency::Unknown,
            _ => Frequency::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for Frequency {
    fn from(s: String) -> Self {
        Frequency::from(s.as_str())
    }
}

impl From<Frequency> for String {
    fn from(frequency: Frequency) -> Self {
        frequency.as_str().to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sex, used for the optional physiology modifier
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum Sex {
    Female,
    Male,
    Other(String),
}

impl Sex {
    pub fn as_str(&self) -> &str {
        match self {
            Sex::Female => "female",
            Sex::Male => "male",
            Sex::Other(name) => name,
        }
    }
}

impl From<&str> for Sex {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "female" | "f" => Sex::Female,
            "male" | "m" => Sex::Male,
            _ => Sex::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for Sex {
    fn from(s: String) -> Self {
        Sex::from(s.as_str())
    }
}

impl From<Sex> for String {
    fn from(sex: Sex) -> Self {
        sex.as_str().to_string()
    }
}

/// Unit a body weight was entered in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    #[default]
    Kilograms,
    Pounds,
}

impl WeightUnit {
    /// Convert a weight in this unit to kilograms
    pub fn to_kg(self, value: f64) -> f64 {
        match self {
            WeightUnit::Kilograms => value,
            WeightUnit::Pounds => crate::physiology::pounds_to_kg(value),
        }
    }
}

impl std::str::FromStr for WeightUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "kg" | "kgs" | "kilograms" => Ok(WeightUnit::Kilograms),
            "lb" | "lbs" | "pounds" => Ok(WeightUnit::Pounds),
            other => Err(Error::invalid(
                "weight_unit",
                format!("unknown unit '{}' (expected kg or lb)", other),
            )),
        }
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// Body measurements used for the BMI and sex modifiers
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Physiology {
    pub height_cm: f64,
    pub sex: Option<Sex>,
}

/// Values collected from the user for one inhalation event
#[derive(Clone, Debug, PartialEq)]
pub struct SessionInput {
    pub volume_liters: f64,
    pub thc_concentration: f64,
    pub inhalation_seconds: f64,
    pub strain: Strain,
    pub frequency: Frequency,
    pub body_weight_kg: f64,
    pub physiology: Option<Physiology>,
}

/// One recorded inhalation event. Never mutated after creation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub volume_liters: f64,
    pub thc_concentration: f64,
    pub inhalation_seconds: f64,
    pub strain: Strain,
    pub frequency: Frequency,
    pub body_weight_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physiology: Option<Physiology>,
}

impl SessionRecord {
    /// Create a validated record from user input
    pub fn create(input: SessionInput, recorded_at: DateTime<Utc>) -> Result<Self> {
        let record = SessionRecord {
            id: Uuid::new_v4(),
            recorded_at,
            volume_liters: input.volume_liters,
            thc_concentration: input.thc_concentration,
            inhalation_seconds: input.inhalation_seconds,
            strain: input.strain,
            frequency: input.frequency,
            body_weight_kg: input.body_weight_kg,
            physiology: input.physiology,
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the numeric invariants of the record
    pub fn validate(&self) -> Result<()> {
        require_positive("volume_liters", self.volume_liters)?;
        require_positive("thc_concentration", self.thc_concentration)?;
        if self.thc_concentration > 1.0 {
            return Err(Error::invalid(
                "thc_concentration",
                format!("{} is not a fraction in (0, 1]", self.thc_concentration),
            ));
        }
        require_positive("inhalation_seconds", self.inhalation_seconds)?;
        require_positive("body_weight_kg", self.body_weight_kg)?;
        if let Some(ref physiology) = self.physiology {
            require_positive("height_cm", physiology.height_cm)?;
        }
        Ok(())
    }
}

// ============================================================================
// Classification and Reports
// ============================================================================

/// Effect tier derived from a normalized score, ordered mildest first
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EffectTier {
    MildModerate,
    ModerateHigh,
    High,
    VeryHigh,
    ExtremelyHigh,
}

impl EffectTier {
    /// 1-based band number
    pub fn band(self) -> u8 {
        match self {
            EffectTier::MildModerate => 1,
            EffectTier::ModerateHigh => 2,
            EffectTier::High => 3,
            EffectTier::VeryHigh => 4,
            EffectTier::ExtremelyHigh => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EffectTier::MildModerate => "Mild/moderate",
            EffectTier::ModerateHigh => "Moderate/moderately-high",
            EffectTier::High => "High",
            EffectTier::VeryHigh => "Very high",
            EffectTier::ExtremelyHigh => "Extremely high",
        }
    }
}

impl fmt::Display for EffectTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decayed view of a session list at a point in time
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DecayProjection {
    pub at: DateTime<Utc>,
    pub current_raw: f64,
    pub current_normalized: f64,
    pub current_tier: EffectTier,
    /// None when nothing is left to decay
    pub hours_until_zero: Option<f64>,
    pub hours_until_unsaturated: f64,
}

/// Output of the scoring pipeline, consumed by the rendering layer
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScoreReport {
    pub session_count: usize,
    pub raw_score: f64,
    pub normalized_score: f64,
    pub tier: EffectTier,
    pub decay: Option<DecayProjection>,
}
