//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

/// Wrap an angle into the range (-pi, pi].
///
/// `-pi` itself maps onto `+pi`, so the result is unique for every input angle.
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float + FloatConst,
{
    let pi = T::PI();

    let wrapped = pi - rem_euclid(pi - angle, pi + pi);

    // Round-off in rem_euclid can return exactly tau, which would give -pi
    if wrapped <= -pi {
        pi
    } else {
        wrapped
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_wrap_pi_range() {
        let mut angle = -50.0;
        while angle < 50.0 {
            let w = wrap_pi(angle);
            assert!(w > -PI && w <= PI, "wrap_pi({}) = {} out of range", angle, w);
            angle += 0.173;
        }
    }

    #[test]
    fn test_wrap_pi_bounds() {
        assert_eq!(wrap_pi(PI), PI);
        assert_eq!(wrap_pi(-PI), PI);
        assert_eq!(wrap_pi(0f64), 0f64);
        assert_abs_diff_eq!(wrap_pi(3.0 * PI), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_pi(-PI / 2.0), -PI / 2.0, epsilon = 1e-15);
        assert_abs_diff_eq!(wrap_pi(PI + 0.1), -PI + 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_wrap_pi_periodic() {
        for &theta in [-3.0, -1.2, 0.0, 0.4, 2.9].iter() {
            for k in -5..=5 {
                assert_abs_diff_eq!(
                    wrap_pi(theta + TAU * k as f64),
                    wrap_pi(theta),
                    epsilon = 1e-9
                );
            }
        }
    }
}
