/// Default tolerance used by [`assert_approx_eq`].
pub const DEFAULT_EPSILON: f64 = 1e-9;

pub fn approx_eq(lhs: f64, rhs: f64, eps: f64) -> bool {
    (lhs - rhs).abs() <= eps
}

/// Asserts that two floating point values are equal within a tolerance.
///
/// example: `assert_approx_eq!(power, -0.54)` or `assert_approx_eq!(power, -0.54, 1e-6)`
#[macro_export]
macro_rules! assert_approx_eq {
    ($lhs:expr, $rhs:expr) => {
        $crate::assert_approx_eq!($lhs, $rhs, $crate::assert::DEFAULT_EPSILON)
    };
    ($lhs:expr, $rhs:expr, $eps:expr) => {{
        let (lhs, rhs, eps): (f64, f64, f64) = ($lhs, $rhs, $eps);
        assert!(
            $crate::assert::approx_eq(lhs, rhs, eps),
            "assertion failed: `(left ≈ right)`\n  left: `{}`,\n right: `{}`,\n   eps: `{}`",
            lhs,
            rhs,
            eps
        );
    }};
}

#[cfg(test)]
mod approx_eq_tests {
    use rstest::rstest;

    use super::approx_eq;

    #[rstest]
    #[case(-0.54, -0.54000000000000004, 1e-9, true)]
    #[case(1.0, 1.1, 1e-9, false)]
    #[case(1.0, 1.1, 0.2, true)]
    fn test_approx_eq(#[case] lhs: f64, #[case] rhs: f64, #[case] eps: f64, #[case] expected: bool) {
        assert_eq!(approx_eq(lhs, rhs, eps), expected);
    }

    #[test]
    fn test_assert_approx_eq_macro() {
        assert_approx_eq!((3.0 - 3.6) * 0.9, -0.54);
    }
}
