//! Bedside calculators.

use crate::error::ReferenceError;
use serde::{Deserialize, Serialize};

fn check(field: &'static str, value: u8, min: u8, max: u8) -> Result<u8, ReferenceError> {
    if value < min || value > max {
        return Err(ReferenceError::out_of_range(field, value as f64, min as f64, max as f64));
    }
    Ok(value)
}

/// Head injury severity band from a GCS total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GcsSeverity {
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcsScore {
    pub total: u8,
    pub severity: GcsSeverity,
}

/// Glasgow Coma Scale: eye 1-4, verbal 1-5, motor 1-6.
pub fn glasgow_coma_scale(eye: u8, verbal: u8, motor: u8) -> Result<GcsScore, ReferenceError> {
    let total = check("eye", eye, 1, 4)? + check("verbal", verbal, 1, 5)? + check("motor", motor, 1, 6)?;

    let severity = match total {
        13..=15 => GcsSeverity::Mild,
        9..=12 => GcsSeverity::Moderate,
        _ => GcsSeverity::Severe,
    };

    Ok(GcsScore { total, severity })
}

/// APGAR score; every component is 0-2.
pub fn apgar(
    appearance: u8,
    pulse: u8,
    grimace: u8,
    activity: u8,
    respiration: u8,
) -> Result<u8, ReferenceError> {
    Ok(check("appearance", appearance, 0, 2)?
        + check("pulse", pulse, 0, 2)?
        + check("grimace", grimace, 0, 2)?
        + check("activity", activity, 0, 2)?
        + check("respiration", respiration, 0, 2)?)
}

/// Estimated weight for a child aged 1-10: `2 × age + 8` kg.
pub fn pediatric_weight_kg(age_years: u8) -> Result<f64, ReferenceError> {
    let age = check("age_years", age_years, 1, 10)?;
    Ok(2.0 * age as f64 + 8.0)
}

/// Mean arterial pressure: `DBP + (SBP − DBP) / 3`.
pub fn mean_arterial_pressure(systolic: u16, diastolic: u16) -> Result<f64, ReferenceError> {
    if diastolic == 0 || diastolic >= systolic {
        return Err(ReferenceError::out_of_range(
            "diastolic",
            diastolic as f64,
            1.0,
            systolic.saturating_sub(1) as f64,
        ));
    }
    let (s, d) = (systolic as f64, diastolic as f64);
    Ok(d + (s - d) / 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gcs_bands() {
        assert_eq!(glasgow_coma_scale(4, 5, 6).unwrap(), GcsScore { total: 15, severity: GcsSeverity::Mild });
        assert_eq!(glasgow_coma_scale(3, 3, 4).unwrap().severity, GcsSeverity::Moderate);
        assert_eq!(glasgow_coma_scale(1, 1, 1).unwrap(), GcsScore { total: 3, severity: GcsSeverity::Severe });
    }

    #[test]
    fn test_gcs_out_of_range() {
        assert!(matches!(
            glasgow_coma_scale(5, 5, 6),
            Err(ReferenceError::OutOfRange { field: "eye", .. })
        ));
        assert!(glasgow_coma_scale(4, 0, 6).is_err());
    }

    #[test]
    fn test_apgar() {
        assert_eq!(apgar(2, 2, 2, 2, 2).unwrap(), 10);
        assert_eq!(apgar(1, 2, 1, 1, 2).unwrap(), 7);
        assert!(apgar(3, 0, 0, 0, 0).is_err());
    }

    #[test]
    fn test_pediatric_weight() {
        assert_relative_eq!(pediatric_weight_kg(4).unwrap(), 16.0);
        assert!(pediatric_weight_kg(0).is_err());
        assert!(pediatric_weight_kg(14).is_err());
    }

    #[test]
    fn test_map() {
        assert_relative_eq!(mean_arterial_pressure(120, 80).unwrap(), 93.333333, epsilon = 1e-4);
        assert!(mean_arterial_pressure(80, 120).is_err());
    }
}
