//! Easing functions and interpolation.

use std::fmt;
use std::rc::Rc;

/// Maps normalized time `[0, 1]` to normalized progress.
#[derive(Clone)]
pub struct Easing(Rc<dyn Fn(f64) -> f64>);

impl Easing {
    pub fn custom(f: impl Fn(f64) -> f64 + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn linear() -> Self {
        Self::custom(|t| t)
    }

    /// Smoothstep: `3t² - 2t³`.
    pub fn cubic_in_out() -> Self {
        Self::custom(|t| {
            let t2 = t * t;
            3.0 * t2 - 2.0 * t2 * t
        })
    }

    pub fn transform_time(&self, t: f64) -> f64 {
        (self.0)(t)
    }
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Easing(..)")
    }
}

/// Blends two values at normalized time `t`.
pub trait Interpolation<T> {
    fn interpolate(&self, t: f64, start: &T, end: &T) -> T;
}

/// Linear interpolation of `f64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleInterpolation;

impl Interpolation<f64> for DoubleInterpolation {
    fn interpolate(&self, t: f64, start: &f64, end: &f64) -> f64 {
        start + t * (end - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cubic_in_out_endpoints() {
        let e = Easing::cubic_in_out();
        assert_eq!(e.transform_time(0.0), 0.0);
        assert_eq!(e.transform_time(1.0), 1.0);
        assert_eq!(e.transform_time(0.5), 0.5);
        assert!(e.transform_time(0.25) < 0.25);
    }

    #[test]
    fn test_double_interpolation() {
        assert_eq!(DoubleInterpolation.interpolate(0.25, &0.0, &100.0), 25.0);
        assert_eq!(Easing::linear().transform_time(0.3), 0.3);
    }
}
