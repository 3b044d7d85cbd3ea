//! Body measurement helpers: unit conversion, BMI, and the physiology modifier.

use crate::config::PhysiologyConstants;
use crate::error::require_positive;
use crate::{Physiology, Result, Sex};

const KG_PER_POUND: f64 = 0.453_592_37;

pub fn pounds_to_kg(pounds: f64) -> f64 {
    pounds * KG_PER_POUND
}

/// Body mass index in kg/m²
pub fn body_mass_index(weight_kg: f64, height_cm: f64) -> Result<f64> {
    let weight_kg = require_positive("body_weight_kg", weight_kg)?;
    let height_m = require_positive("height_cm", height_cm)? / 100.0;
    Ok(weight_kg / (height_m * height_m))
}

/// Multiplier for the given sex; unrecognized values are neutral
pub fn sex_factor(sex: Option<&Sex>, constants: &PhysiologyConstants) -> f64 {
    match sex {
        Some(Sex::Female) => constants.sex_factors.female,
        Some(Sex::Male) => constants.sex_factors.male,
        Some(Sex::Other(name)) => {
            tracing::warn!("Unrecognized sex '{}', using neutral factor 1.0", name);
            1.0
        }
        None => 1.0,
    }
}

/// `sex_factor × (reference_bmi / bmi)^bmi_sensitivity`
///
/// A lower BMI than the reference raises the factor above 1.0.
pub fn physiology_factor(
    physiology: &Physiology,
    weight_kg: f64,
    constants: &PhysiologyConstants,
) -> Result<f64> {
    let bmi = body_mass_index(weight_kg, physiology.height_cm)?;
    let bmi_factor = (constants.reference_bmi / bmi).powf(constants.bmi_sensitivity);
    let factor = sex_factor(physiology.sex.as_ref(), constants) * bmi_factor;

    tracing::debug!(
        "Physiology factor {:.4} (bmi {:.1}, sex {:?})",
        factor,
        bmi,
        physiology.sex
    );

    Ok(factor)
}
