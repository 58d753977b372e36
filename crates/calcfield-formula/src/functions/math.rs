//! Math functions
//!
//! Each function receives arguments already checked against its arity.

use std::f64::consts;

pub fn fn_abs(args: &[f64]) -> f64 {
    args[0].abs()
}

pub fn fn_sqrt(args: &[f64]) -> f64 {
    args[0].sqrt()
}

pub fn fn_pow(args: &[f64]) -> f64 {
    args[0].powf(args[1])
}

pub fn fn_exp(args: &[f64]) -> f64 {
    args[0].exp()
}

/// Natural logarithm
pub fn fn_log(args: &[f64]) -> f64 {
    args[0].ln()
}

pub fn fn_log10(args: &[f64]) -> f64 {
    args[0].log10()
}

pub fn fn_sin(args: &[f64]) -> f64 {
    args[0].sin()
}

pub fn fn_cos(args: &[f64]) -> f64 {
    args[0].cos()
}

pub fn fn_tan(args: &[f64]) -> f64 {
    args[0].tan()
}

pub fn fn_asin(args: &[f64]) -> f64 {
    args[0].asin()
}

pub fn fn_acos(args: &[f64]) -> f64 {
    args[0].acos()
}

pub fn fn_atan(args: &[f64]) -> f64 {
    args[0].atan()
}

/// ATAN2(y, x)
pub fn fn_atan2(args: &[f64]) -> f64 {
    args[0].atan2(args[1])
}

/// Rounds half away from zero
pub fn fn_round(args: &[f64]) -> f64 {
    args[0].round()
}

pub fn fn_ceil(args: &[f64]) -> f64 {
    args[0].ceil()
}

pub fn fn_floor(args: &[f64]) -> f64 {
    args[0].floor()
}

pub fn fn_trunc(args: &[f64]) -> f64 {
    args[0].trunc()
}

/// MIN over any number of arguments; `+inf` with none, NaN if any argument is NaN
pub fn fn_min(args: &[f64]) -> f64 {
    let mut min = f64::INFINITY;
    for &n in args {
        if n.is_nan() {
            return f64::NAN;
        }
        min = min.min(n);
    }
    min
}

/// MAX over any number of arguments; `-inf` with none, NaN if any argument is NaN
pub fn fn_max(args: &[f64]) -> f64 {
    let mut max = f64::NEG_INFINITY;
    for &n in args {
        if n.is_nan() {
            return f64::NAN;
        }
        max = max.max(n);
    }
    max
}

pub fn fn_pi(_args: &[f64]) -> f64 {
    consts::PI
}

pub fn fn_e(_args: &[f64]) -> f64 {
    consts::E
}

/// Uniform value in `[0, 1)`
pub fn fn_random(_args: &[f64]) -> f64 {
    rand::random::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(fn_round(&[2.5]), 3.0);
        assert_eq!(fn_round(&[-2.5]), -3.0);
        assert_eq!(fn_round(&[2.4]), 2.0);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(fn_min(&[3.0, 1.0, 2.0]), 1.0);
        assert_eq!(fn_max(&[3.0, 1.0, 2.0]), 3.0);
        assert_eq!(fn_min(&[]), f64::INFINITY);
        assert_eq!(fn_max(&[]), f64::NEG_INFINITY);
        assert!(fn_max(&[1.0, f64::NAN]).is_nan());
    }

    #[test]
    fn test_trig_and_logs() {
        assert!((fn_sin(&[consts::FRAC_PI_2]) - 1.0).abs() < 1e-12);
        assert!((fn_atan2(&[1.0, 1.0]) - consts::FRAC_PI_4).abs() < 1e-12);
        assert_eq!(fn_log10(&[1000.0]), 3.0);
        assert_eq!(fn_log(&[1.0]), 0.0);
        assert!(fn_sqrt(&[-1.0]).is_nan());
        assert_eq!(fn_trunc(&[-4.7]), -4.0);
    }

    #[test]
    fn test_random_range() {
        for _ in 0..100 {
            let r = fn_random(&[]);
            assert!((0.0..1.0).contains(&r));
        }
    }
}
