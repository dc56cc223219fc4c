//! Numerically stabilized scalar arithmetic shared by the fitting models.

/// Denominator magnitude below which the stabilized forms fall back to
/// plain arithmetic.
const STABILIZE_EPS: f64 = 1e-10;

/// Subtracts `b` from `a` through the difference-of-squares form
/// `(a^2 - b^2) / (a + b)`.
///
/// Residual accumulation subtracts many nearly-equal observed/estimated
/// pairs; the rewritten form keeps those differences stable. Falls back to
/// plain subtraction when `a + b` is near zero.
#[inline]
pub fn precise_sub(a: f64, b: f64) -> f64 {
    let add = a + b;
    if add.abs() < STABILIZE_EPS {
        return a - b;
    }
    (a * a - b * b) / add
}

/// Adds `a` and `b` through the difference-of-squares form
/// `(a^2 - b^2) / (a - b)`.
///
/// Counterpart of [`precise_sub`]; falls back to plain addition when
/// `a - b` is near zero.
#[inline]
pub fn precise_add(a: f64, b: f64) -> f64 {
    let sub = a - b;
    if sub.abs() < STABILIZE_EPS {
        return a + b;
    }
    (a * a - b * b) / sub
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn precise_sub_matches_plain_subtraction() {
        assert!(approx_eq(precise_sub(5.0, 3.0), 2.0));
        assert!(approx_eq(precise_sub(0.75, 0.25), 0.5));
        assert!(approx_eq(precise_sub(-1.5, 2.5), -4.0));
    }

    #[test]
    fn precise_sub_of_equal_values_is_exactly_zero() {
        assert_eq!(precise_sub(0.123456789, 0.123456789), 0.0);
        assert_eq!(precise_sub(255.0, 255.0), 0.0);
    }

    #[test]
    fn precise_sub_falls_back_near_cancelling_sum() {
        // a + b below the guard: the plain difference is returned as-is.
        assert_eq!(precise_sub(1e-11, -1e-11), 2e-11);
    }

    #[test]
    fn precise_add_matches_plain_addition() {
        assert!(approx_eq(precise_add(5.0, 3.0), 8.0));
        assert!(approx_eq(precise_add(0.75, -0.25), 0.5));
    }

    #[test]
    fn precise_add_falls_back_near_cancelling_difference() {
        let a = 0.5;
        let b = 0.5 + 1e-11;
        assert_eq!(precise_add(a, b), a + b);
    }
}
