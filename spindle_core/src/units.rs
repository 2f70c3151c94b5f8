//! RPM ⇄ relative-centrifugal-force conversion.
//!
//! RCF = RPM² × 0.00001118 × r, with r the rotor radius in centimeters.
//! Values are floating point internally; truncation to integers happens only
//! at the presentation boundary.

use crate::error::SpinError;

/// Standard gravitational factor for RCF at a radius in centimeters.
pub const RCF_FACTOR: f64 = 0.000_011_18;

/// Convert an RPM value to RCF for the given rotor radius. Pure and total;
/// negative RPM inputs simply square away their sign.
#[inline]
pub fn rpm_to_rcf(rpm: i32, radius_cm: f64) -> f64 {
    let rpm = rpm as f64;
    rpm * rpm * RCF_FACTOR * radius_cm
}

/// Convert an RCF value back to RPM (floored to a whole revolution).
///
/// RCF and radius must be non-negative finite values; anything else is a
/// programming error surfaced as `InvalidInput`, never a panic.
pub fn rcf_to_rpm(rcf: f64, radius_cm: f64) -> Result<i32, SpinError> {
    if !rcf.is_finite() || rcf < 0.0 {
        return Err(SpinError::InvalidInput("rcf must be a non-negative number"));
    }
    if !radius_cm.is_finite() || radius_cm <= 0.0 {
        return Err(SpinError::InvalidInput("rotor radius must be positive"));
    }
    let rpm = (rcf / (RCF_FACTOR * radius_cm)).sqrt().floor();
    Ok(rpm as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RADIUS: f64 = 11.0;

    #[test]
    fn rcf_of_zero_is_zero() {
        assert_eq!(rpm_to_rcf(0, RADIUS), 0.0);
        assert_eq!(rcf_to_rpm(0.0, RADIUS).unwrap(), 0);
    }

    #[test]
    fn reference_cross_check() {
        // RCF 100 at r=11 cm: sqrt(100 / 0.00012298) ≈ 901.7 → floored.
        assert_eq!(rcf_to_rpm(100.0, RADIUS).unwrap(), 901);
        // 4000 RPM at r=11 cm lands just under the RCF_MAX of 1960.
        let rcf = rpm_to_rcf(4000, RADIUS);
        assert!((rcf - 1967.68).abs() < 0.1, "got {rcf}");
    }

    #[test]
    fn negative_rcf_is_invalid_input() {
        assert!(matches!(
            rcf_to_rpm(-1.0, RADIUS),
            Err(SpinError::InvalidInput(_))
        ));
        assert!(matches!(
            rcf_to_rpm(f64::NAN, RADIUS),
            Err(SpinError::InvalidInput(_))
        ));
        assert!(matches!(
            rcf_to_rpm(100.0, 0.0),
            Err(SpinError::InvalidInput(_))
        ));
    }
}
