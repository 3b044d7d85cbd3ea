//! Configuration file support for highcalc.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/highcalc/config.toml`.
//! Every key is optional; missing keys take the defaults below.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub scoring: ScoringConstants,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// How much of the session log is considered when reporting
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
        }
    }
}

/// Ten years; far past any session that still contributes to the level
pub const MAX_WINDOW_HOURS: i64 = 24 * 365 * 10;

impl HistoryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_hours <= 0 || self.window_hours > MAX_WINDOW_HOURS {
            return Err(Error::Config(format!(
                "history.window_hours must be between 1 and {}, got {}",
                MAX_WINDOW_HOURS, self.window_hours
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Scoring Constants
// ============================================================================

/// Every tunable constant of the scoring engine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScoringConstants {
    /// Liters
    #[serde(default = "default_reference_lung_capacity")]
    pub reference_lung_capacity: f64,

    /// Fraction
    #[serde(default = "default_reference_thc_concentration")]
    pub reference_thc_concentration: f64,

    /// Concentration assumed when none is entered
    #[serde(default = "default_thc_concentration")]
    pub default_thc_concentration: f64,

    /// Seconds
    #[serde(default = "default_reference_time")]
    pub reference_time: f64,

    /// Kilograms
    #[serde(default = "default_reference_body_weight")]
    pub reference_body_weight: f64,

    #[serde(default = "default_calibration_multiplier")]
    pub calibration_multiplier: f64,

    #[serde(default = "default_decay_half_life_hours")]
    pub decay_half_life_hours: f64,

    /// Score treated as zero by `time_until_zero`
    #[serde(default = "default_zero_floor")]
    pub zero_floor: f64,

    #[serde(default)]
    pub strain_factors: StrainFactors,

    #[serde(default)]
    pub frequency_factors: FrequencyFactors,

    #[serde(default)]
    pub inhalation: InhalationModel,

    #[serde(default)]
    pub physiology: PhysiologyConstants,
}

impl Default for ScoringConstants {
    fn default() -> Self {
        Self {
            reference_lung_capacity: default_reference_lung_capacity(),
            reference_thc_concentration: default_reference_thc_concentration(),
            default_thc_concentration: default_thc_concentration(),
            reference_time: default_reference_time(),
            reference_body_weight: default_reference_body_weight(),
            calibration_multiplier: default_calibration_multiplier(),
            decay_half_life_hours: default_decay_half_life_hours(),
            zero_floor: default_zero_floor(),
            strain_factors: StrainFactors::default(),
            frequency_factors: FrequencyFactors::default(),
            inhalation: InhalationModel::default(),
            physiology: PhysiologyConstants::default(),
        }
    }
}

/// Multipliers per strain; unlisted strains use 1.0
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StrainFactors {
    #[serde(default = "default_sativa")]
    pub sativa: f64,
    #[serde(default = "default_indica")]
    pub indica: f64,
    #[serde(default = "default_hybrid")]
    pub hybrid: f64,
}

impl Default for StrainFactors {
    fn default() -> Self {
        Self {
            sativa: default_sativa(),
            indica: default_indica(),
            hybrid: default_hybrid(),
        }
    }
}

/// Multipliers per usage frequency; unlisted frequencies use 1.0
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FrequencyFactors {
    #[serde(default = "default_daily")]
    pub daily: f64,
    #[serde(default = "default_weekly")]
    pub weekly: f64,
    #[serde(default = "default_monthly")]
    pub monthly: f64,
}

impl Default for FrequencyFactors {
    fn default() -> Self {
        Self {
            daily: default_daily(),
            weekly: default_weekly(),
            monthly: default_monthly(),
        }
    }
}

/// How inhalation time maps to the inhalation factor
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum InhalationModel {
    /// `inhalation_time / reference_time`
    #[default]
    Linear,
    /// Absorption curve `1 - e^(-k t)`, scaled to 1.0 at the reference time
    Saturating {
        #[serde(default = "default_absorption_rate")]
        absorption_rate: f64,
    },
}

/// BMI and sex modifiers, applied only to sessions carrying body measurements
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysiologyConstants {
    #[serde(default = "default_reference_bmi")]
    pub reference_bmi: f64,
    #[serde(default = "default_bmi_sensitivity")]
    pub bmi_sensitivity: f64,
    #[serde(default)]
    pub sex_factors: SexFactors,
}

impl Default for PhysiologyConstants {
    fn default() -> Self {
        Self {
            reference_bmi: default_reference_bmi(),
            bmi_sensitivity: default_bmi_sensitivity(),
            sex_factors: SexFactors::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SexFactors {
    #[serde(default = "default_female")]
    pub female: f64,
    #[serde(default = "default_male")]
    pub male: f64,
}

impl Default for SexFactors {
    fn default() -> Self {
        Self {
            female: default_female(),
            male: default_male(),
        }
    }
}

impl ScoringConstants {
    /// Decay constant per hour derived from the configured half-life
    pub fn decay_constant(&self) -> f64 {
        std::f64::consts::LN_2 / self.decay_half_life_hours
    }

    /// Reject constants the formula cannot divide by or multiply with
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("reference_lung_capacity", self.reference_lung_capacity),
            ("reference_thc_concentration", self.reference_thc_concentration),
            ("default_thc_concentration", self.default_thc_concentration),
            ("reference_time", self.reference_time),
            ("reference_body_weight", self.reference_body_weight),
            ("calibration_multiplier", self.calibration_multiplier),
            ("decay_half_life_hours", self.decay_half_life_hours),
            ("zero_floor", self.zero_floor),
            ("strain_factors.sativa", self.strain_factors.sativa),
            ("strain_factors.indica", self.strain_factors.indica),
            ("strain_factors.hybrid", self.strain_factors.hybrid),
            ("frequency_factors.daily", self.frequency_factors.daily),
            ("frequency_factors.weekly", self.frequency_factors.weekly),
            ("frequency_factors.monthly", self.frequency_factors.monthly),
            ("physiology.reference_bmi", self.physiology.reference_bmi),
            ("physiology.sex_factors.female", self.physiology.sex_factors.female),
            ("physiology.sex_factors.male", self.physiology.sex_factors.male),
        ];

        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!(
                    "scoring.{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if self.default_thc_concentration > 1.0 {
            return Err(Error::Config(format!(
                "scoring.default_thc_concentration must be a fraction, got {}",
                self.default_thc_concentration
            )));
        }

        if !self.physiology.bmi_sensitivity.is_finite() || self.physiology.bmi_sensitivity < 0.0 {
            return Err(Error::Config(format!(
                "scoring.physiology.bmi_sensitivity must be >= 0, got {}",
                self.physiology.bmi_sensitivity
            )));
        }

        if let InhalationModel::Saturating { absorption_rate } = self.inhalation {
            if !absorption_rate.is_finite() || absorption_rate <= 0.0 {
                return Err(Error::Config(format!(
                    "scoring.inhalation.absorption_rate must be positive, got {}",
                    absorption_rate
                )));
            }
        }

        Ok(())
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".local/share"),
        Err(_) => PathBuf::from("."),
    });
    base.join("highcalc")
}

fn default_window_hours() -> i64 {
    24
}

fn default_reference_lung_capacity() -> f64 {
    6.0
}

fn default_reference_thc_concentration() -> f64 {
    0.05
}

fn default_thc_concentration() -> f64 {
    0.15
}

fn default_reference_time() -> f64 {
    5.0
}

fn default_reference_body_weight() -> f64 {
    70.0
}

fn default_calibration_multiplier() -> f64 {
    10.0
}

fn default_decay_half_life_hours() -> f64 {
    2.0
}

fn default_zero_floor() -> f64 {
    0.01
}

fn default_sativa() -> f64 {
    1.0
}

fn default_indica() -> f64 {
    1.2
}

fn default_hybrid() -> f64 {
    1.1
}

fn default_daily() -> f64 {
    1.5
}

fn default_weekly() -> f64 {
    1.2
}

fn default_monthly() -> f64 {
    1.0
}

fn default_absorption_rate() -> f64 {
    0.3466
}

fn default_reference_bmi() -> f64 {
    22.0
}

fn default_bmi_sensitivity() -> f64 {
    0.25
}

fn default_female() -> f64 {
    1.1
}

fn default_male() -> f64 {
    1.0
}

impl Config {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.history.validate()?;
        self.scoring.validate()
    }

    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(".config"),
            Err(_) => PathBuf::from("."),
        });
        base.join("highcalc").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.history.window_hours, 24);
        assert_eq!(config.scoring.reference_lung_capacity, 6.0);
        assert_eq!(config.scoring.frequency_factors.daily, 1.5);
        assert_eq!(config.scoring.inhalation, InhalationModel::Linear);
        assert!(config.scoring.validate().is_ok());
    }

    #[test]
    fn test_decay_constant_from_half_life() {
        let scoring = ScoringConstants::default();
        assert!((scoring.decay_constant() - 0.34657359).abs() < 1e-6);
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.scoring.inhalation = InhalationModel::Saturating {
            absorption_rate: 0.5,
        };
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.scoring, parsed.scoring);
        assert_eq!(config.data.data_dir, parsed.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[scoring]
calibration_multiplier = 12.5

[scoring.strain_factors]
indica = 1.4

[scoring.inhalation]
model = "saturating"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scoring.calibration_multiplier, 12.5);
        assert_eq!(config.scoring.strain_factors.indica, 1.4);
        assert_eq!(config.scoring.strain_factors.sativa, 1.0); // default
        assert_eq!(config.scoring.reference_body_weight, 70.0); // default
        assert_eq!(
            config.scoring.inhalation,
            InhalationModel::Saturating {
                absorption_rate: 0.3466
            }
        );
    }

    #[test]
    fn test_invalid_constants_rejected() {
        let mut scoring = ScoringConstants::default();
        scoring.reference_body_weight = 0.0;
        assert!(matches!(scoring.validate(), Err(Error::Config(_))));

        let mut scoring = ScoringConstants::default();
        scoring.decay_half_life_hours = f64::NAN;
        assert!(scoring.validate().is_err());

        let mut scoring = ScoringConstants::default();
        scoring.inhalation = InhalationModel::Saturating {
            absorption_rate: -1.0,
        };
        assert!(scoring.validate().is_err());
    }

    #[test]
    fn test_load_from_rejects_invalid_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[scoring]\nreference_time = -5.0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_window_hours_bounds() {
        let mut config = Config::default();
        config.history.window_hours = MAX_WINDOW_HOURS;
        assert!(config.validate().is_ok());

        for hours in [0, -5, MAX_WINDOW_HOURS + 1, 10_000_000_000] {
            config.history.window_hours = hours;
            assert!(matches!(config.validate(), Err(Error::Config(_))), "{}", hours);
        }
    }

    #[test]
    fn test_load_from_rejects_huge_window() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[history]\nwindow_hours = 10000000000\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.history.window_hours = 48;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.history.window_hours, 48);
    }
}
