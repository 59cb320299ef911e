//! Validation for incident impact fields.
//!
//! The impact group (downtime, financial_impact, technical_decline_pct) is
//! mutable only by INCIDENT_MANAGER/ADMIN; the role gate lives in
//! [`crate::roles`], the range check lives here.

use crate::error::CoreError;

/// Validate a technical decline percentage, which must be within [0, 100].
pub fn validate_technical_decline_pct(pct: f64) -> Result<(), CoreError> {
    if !(0.0..=100.0).contains(&pct) || pct.is_nan() {
        return Err(CoreError::Validation(format!(
            "technical_decline_pct must be between 0 and 100, got {pct}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_values_accepted() {
        assert!(validate_technical_decline_pct(0.0).is_ok());
        assert!(validate_technical_decline_pct(100.0).is_ok());
        assert!(validate_technical_decline_pct(42.5).is_ok());
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(validate_technical_decline_pct(150.0).is_err());
        assert!(validate_technical_decline_pct(-0.1).is_err());
        assert!(validate_technical_decline_pct(f64::NAN).is_err());
    }
}
