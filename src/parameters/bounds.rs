//! Parameter bounds implementation
//!
//! Box constraints for model parameters (`thetaS >= 0`, `3 <= f <= genome_length`, ...)
//! and the Minuit-style transformation that lets an unconstrained optimizer work on
//! bounded parameters.

use serde::{Deserialize, Serialize};
use std::f64::{INFINITY, NEG_INFINITY};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must be less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Infinite parameter value is not allowed")]
    InfiniteValue,
}

/// Represents the bounds constraints on a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum allowed value for the parameter
    pub min: f64,

    /// Maximum allowed value for the parameter
    pub max: f64,
}

impl Serialize for Bounds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Bounds", 2)?;

        // JSON has no infinities; an open side is written as null
        if self.min.is_infinite() && self.min.is_sign_negative() {
            state.serialize_field("min", &Option::<f64>::None)?;
        } else {
            state.serialize_field("min", &self.min)?;
        }

        if self.max.is_infinite() && self.max.is_sign_positive() {
            state.serialize_field("max", &Option::<f64>::None)?;
        } else {
            state.serialize_field("max", &self.max)?;
        }

        state.end()
    }
}

impl<'de> Deserialize<'de> for Bounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct BoundsHelper {
            #[serde(default)]
            min: Option<f64>,

            #[serde(default)]
            max: Option<f64>,
        }

        let helper = BoundsHelper::deserialize(deserializer)?;

        Ok(Bounds {
            min: helper.min.unwrap_or(NEG_INFINITY),
            max: helper.max.unwrap_or(INFINITY),
        })
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }
}

impl Bounds {
    /// Create a new bounds constraint with min and max values
    ///
    /// # Examples
    ///
    /// ```
    /// use mcorr_fit::parameters::bounds::Bounds;
    ///
    /// let bounds = Bounds::new(3.0, 30000.0).unwrap();
    /// assert_eq!(bounds.min, 3.0);
    /// assert_eq!(bounds.max, 30000.0);
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        Ok(Self { min, max })
    }

    /// Create an unbounded constraint (negative infinity to positive infinity)
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Create a bounds constraint with only a minimum value
    pub fn min_only(min: f64) -> Self {
        Self { min, max: INFINITY }
    }

    /// Check if a value is within the bounds
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check if the parameter is bounded from below
    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    /// Check if the parameter is bounded from above
    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Clamp a value to be within the bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Project a value into the interior of the bounds.
    ///
    /// A value on or past a finite bound is moved inside it by
    /// [`FEASIBILITY_STEP`] relative to the bound, so that the bounded solver
    /// never evaluates the model exactly on a bound (`thetaS = 0` would make
    /// `phiP` infinite). When the box is too narrow for that margin the
    /// midpoint is used.
    pub fn make_strictly_feasible(&self, value: f64) -> f64 {
        let value = if self.has_lower_bound() && value <= self.min {
            self.min + feasibility_margin(self.min)
        } else if self.has_upper_bound() && value >= self.max {
            self.max - feasibility_margin(self.max)
        } else {
            value
        };

        if value > self.min && value < self.max {
            value
        } else {
            0.5 * (self.min + self.max)
        }
    }

    /// Whether `value` sits on the lower bound or within its feasibility margin.
    pub fn at_lower(&self, value: f64) -> bool {
        self.has_lower_bound() && value <= self.min + feasibility_margin(self.min)
    }

    /// Whether `value` sits on the upper bound or within its feasibility margin.
    pub fn at_upper(&self, value: f64) -> bool {
        self.has_upper_bound() && value >= self.max - feasibility_margin(self.max)
    }
}

/// Relative distance kept from an active bound by [`Bounds::make_strictly_feasible`].
pub const FEASIBILITY_STEP: f64 = 1e-10;

fn feasibility_margin(bound: f64) -> f64 {
    FEASIBILITY_STEP * bound.abs().max(1.0)
}

/// Minuit-style parameter transformation for bounds constraints.
///
/// The optimizer works with unbounded internal values while the external
/// values always stay inside the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// Transform an internal parameter value to an external value
    pub fn to_external(&self, internal_value: f64) -> f64 {
        match (self.bounds.has_lower_bound(), self.bounds.has_upper_bound()) {
            (false, false) => internal_value,
            (true, false) => self.bounds.min - 1.0 + (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => self.bounds.max + 1.0 - (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => {
                let bound_range = self.bounds.max - self.bounds.min;
                self.bounds.min + (internal_value.sin() + 1.0) * bound_range / 2.0
            }
        }
    }

    /// Transform an external parameter value to an internal value
    pub fn to_internal(&self, external_value: f64) -> Result<f64, BoundsError> {
        if !external_value.is_finite() {
            return Err(BoundsError::InfiniteValue);
        }

        if !self.bounds.is_within_bounds(external_value) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external_value,
                min: self.bounds.min,
                max: self.bounds.max,
            });
        }

        let internal = match (self.bounds.has_lower_bound(), self.bounds.has_upper_bound()) {
            (false, false) => external_value,
            (true, false) => ((external_value - self.bounds.min + 1.0).powi(2) - 1.0).sqrt(),
            (false, true) => ((self.bounds.max - external_value + 1.0).powi(2) - 1.0).sqrt(),
            (true, true) => {
                let bound_range = self.bounds.max - self.bounds.min;
                if bound_range == 0.0 {
                    return Ok(0.0);
                }
                let scaled = 2.0 * (external_value - self.bounds.min) / bound_range - 1.0;
                scaled.clamp(-1.0, 1.0).asin()
            }
        };

        Ok(internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_creation() {
        let bounds = Bounds::new(3.0, 30000.0).unwrap();
        assert_eq!(bounds.min, 3.0);
        assert_eq!(bounds.max, 30000.0);

        assert!(Bounds::new(10.0, 0.0).is_err());

        let bounds = Bounds::min_only(0.0);
        assert_eq!(bounds.min, 0.0);
        assert_eq!(bounds.max, INFINITY);
        assert!(bounds.has_lower_bound());
        assert!(!bounds.has_upper_bound());

        let bounds = Bounds::unbounded();
        assert!(!bounds.has_lower_bound());
        assert!(!bounds.has_upper_bound());
    }

    #[test]
    fn test_clamp_projects_onto_box() {
        let bounds = Bounds::new(3.0, 30000.0).unwrap();

        assert_eq!(bounds.clamp(-5.0), 3.0);
        assert_eq!(bounds.clamp(1000.0), 1000.0);
        assert_eq!(bounds.clamp(45000.0), 30000.0);
    }

    #[test]
    fn test_strictly_feasible_stays_off_bounds() {
        let theta = Bounds::min_only(0.0);
        assert_eq!(theta.make_strictly_feasible(-3.0), FEASIBILITY_STEP);
        assert_eq!(theta.make_strictly_feasible(0.0), FEASIBILITY_STEP);
        assert_eq!(theta.make_strictly_feasible(0.25), 0.25);
        assert!(theta.at_lower(FEASIBILITY_STEP));
        assert!(!theta.at_lower(1e-6));
        assert!(!theta.at_upper(1e300));

        let fragment = Bounds::new(3.0, 30000.0).unwrap();
        let below = fragment.make_strictly_feasible(1.0);
        let above = fragment.make_strictly_feasible(45000.0);
        assert!(below > 3.0 && below < 3.0 + 1e-8);
        assert!(above < 30000.0 && above > 30000.0 - 1e-5);
        assert!(fragment.at_lower(below));
        assert!(fragment.at_upper(above));

        let unbounded = Bounds::unbounded();
        assert_eq!(unbounded.make_strictly_feasible(-7.5), -7.5);

        let point = Bounds::new(2.0, 2.0).unwrap();
        assert_eq!(point.make_strictly_feasible(5.0), 2.0);
    }

    #[test]
    fn test_transform_lower_bound_round_trip() {
        let transform = BoundsTransform::new(Bounds::min_only(0.0));

        for &internal in &[0.001, 0.5, 3.0] {
            let external = transform.to_external(internal);
            assert!(external >= 0.0);
            let back = transform.to_internal(external).unwrap();
            assert!((internal - back).abs() < 1e-8, "round trip drift {}", (internal - back).abs());
        }
    }

    #[test]
    fn test_transform_both_bounds_stays_inside() {
        let bounds = Bounds::new(3.0, 30000.0).unwrap();
        let transform = BoundsTransform::new(bounds);

        for &internal in &[-20.0, -1.0, 0.0, 0.7, 11.0] {
            let external = transform.to_external(internal);
            assert!(bounds.is_within_bounds(external));
        }

        let internal = transform.to_internal(1000.0).unwrap();
        assert!((transform.to_external(internal) - 1000.0).abs() < 1e-8);
    }

    #[test]
    fn test_transform_errors() {
        let transform = BoundsTransform::new(Bounds::new(0.0, 10.0).unwrap());

        assert!(transform.to_internal(-1.0).is_err());
        assert!(transform.to_internal(11.0).is_err());
        assert_eq!(transform.to_internal(INFINITY), Err(BoundsError::InfiniteValue));
    }

    #[test]
    fn test_serialize_open_bounds_as_null() {
        let json = serde_json::to_string(&Bounds::min_only(0.0)).unwrap();
        assert_eq!(json, r#"{"min":0.0,"max":null}"#);

        let bounds: Bounds = serde_json::from_str(&json).unwrap();
        assert_eq!(bounds, Bounds::min_only(0.0));
    }
}
