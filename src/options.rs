//! Tolerances and model options

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing two floating values
///
/// Two values are equal when their difference is below `absolute`, or below
/// `relative` times the larger magnitude of the two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Relative band, scaled by the larger magnitude
    pub relative: f64,
    /// Absolute floor, used near zero
    pub absolute: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            relative: 1e-9,
            absolute: 1e-12,
        }
    }
}

impl Tolerance {
    /// Create a tolerance from its relative and absolute parts
    pub fn new(relative: f64, absolute: f64) -> Self {
        Self { relative, absolute }
    }

    /// Check whether two values are equal within the tolerance
    pub fn eq(&self, a: f64, b: f64) -> bool {
        let diff = (a - b).abs();
        diff <= self.absolute || diff <= self.relative * a.abs().max(b.abs())
    }

    /// Check whether `a` is strictly less than `b` beyond the tolerance
    pub fn lt(&self, a: f64, b: f64) -> bool {
        a < b && !self.eq(a, b)
    }

    /// Check whether a value is zero within the absolute floor
    pub fn is_zero(&self, value: f64) -> bool {
        value.abs() <= self.absolute
    }
}

/// Options carried by a model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelOptions {
    /// Tolerance for scalar comparisons (relative positions, coordinates)
    pub tolerance: Tolerance,
    /// Two nodes closer than this distance are coincident
    pub coincidence_distance: f64,
    /// A bar shorter than this is treated as zero-length
    pub min_bar_length: f64,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            coincidence_distance: 1e-6,
            min_bar_length: 1e-6,
        }
    }
}

impl ModelOptions {
    /// Create the default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scalar tolerance
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the coincident node distance
    pub fn with_coincidence_distance(mut self, distance: f64) -> Self {
        self.coincidence_distance = distance;
        self
    }

    /// Set the minimum bar length
    pub fn with_min_bar_length(mut self, length: f64) -> Self {
        self.min_bar_length = length;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_relative_and_absolute() {
        let tol = Tolerance::default();
        assert!(tol.eq(0.0, 1e-13));
        assert!(tol.eq(1e6, 1e6 + 1e-4));
        assert!(!tol.eq(1.0, 1.0 + 1e-6));
        assert!(tol.lt(1.0, 2.0));
        assert!(!tol.lt(1.0, 1.0 + 1e-12));
    }

    #[test]
    fn test_options_builder() {
        let options = ModelOptions::new()
            .with_coincidence_distance(1e-3)
            .with_min_bar_length(1e-2);
        assert_eq!(options.coincidence_distance, 1e-3);
        assert_eq!(options.min_bar_length, 1e-2);
    }
}
