//! Currency rounding shared by every monetary and score output.

/// Rounds to two decimals, half away from zero.
///
/// `f64::EPSILON` is added to the magnitude first so values such as `1.005`,
/// which are stored slightly below their decimal spelling, still round up to
/// `1.01`.
pub fn round2(value: f64) -> f64 {
    let magnitude = ((value.abs() + f64::EPSILON) * 100.0).round() / 100.0;
    magnitude.copysign(value)
}

/// Clamps into `[0, 1]`. NaN collapses to `0`.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_corrects_binary_representation_error() {
        assert_eq!(round2(1.005), 1.01);
        assert_eq!(round2(80.75), 80.75);
        assert_eq!(round2(0.8230769230769231), 0.82);
        assert_eq!(round2(32.0), 32.0);
    }

    #[test]
    fn round2_rounds_halves_away_from_zero() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(-1.005), -1.01);
        assert_eq!(round2(10.0 / 3.0), 3.33);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn clamp_unit_bounds() {
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(-0.3), 0.0);
        assert_eq!(clamp_unit(0.42), 0.42);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }
}
