// SPDX-License-Identifier: MIT OR Apache-2.0
//! Loose parameter bags and per-kind parameter metadata.
//!
//! Editors hand us a string-keyed bag. Compiling a model reads it through a
//! [`ParamReader`], which clamps numbers into the metadata range, fills in
//! defaults for anything missing and ignores names it does not know.

use crate::error::{MotionError, Result};
use crate::interpolation::Easing;
use crate::model::ModelKind;
use crate::position::{Plane, Position};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Scalar
    Number(f64),
    /// 3D vector
    Vector(Position),
    /// Enumerated option (plane, easing, wave shape, ...)
    Text(String),
    /// Ordered control points
    Points(Vec<Position>),
}

/// String-keyed parameter bag as authored in the editor
pub type ParameterBag = IndexMap<String, ParamValue>;

/// Metadata for a numeric parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Parameter name (snake case)
    pub name: &'static str,
    /// Lowest accepted value
    pub min: f64,
    /// Highest accepted value
    pub max: f64,
    /// Value used when the parameter is absent
    pub default: f64,
}

impl ParamSpec {
    /// Create a parameter spec
    pub const fn new(name: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name,
            min,
            max,
            default,
        }
    }

    /// Clamp a value into range; NaN falls back to the default
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// Normalizes `startAngle`, `start-angle` and `start_angle` to one key
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Typed view over a [`ParameterBag`] for one model kind
pub struct ParamReader<'a> {
    kind: ModelKind,
    values: IndexMap<String, &'a ParamValue>,
}

impl<'a> ParamReader<'a> {
    /// Create a reader for `kind`
    pub fn new(kind: ModelKind, bag: &'a ParameterBag) -> Self {
        let values = bag
            .iter()
            .map(|(key, value)| (normalize_key(key), value))
            .collect();
        Self { kind, values }
    }

    fn get(&self, name: &str) -> Option<&'a ParamValue> {
        self.values.get(&normalize_key(name)).copied()
    }

    /// Numeric parameter, clamped by the kind's metadata
    pub fn number(&self, name: &'static str) -> Result<f64> {
        let spec = self
            .kind
            .numeric_params()
            .iter()
            .find(|spec| spec.name == name)
            .copied()
            .unwrap_or(ParamSpec::new(name, f64::MIN, f64::MAX, 0.0));

        match self.get(name) {
            None => Ok(spec.default),
            Some(ParamValue::Number(v)) => Ok(spec.clamp(*v)),
            Some(_) => Err(self.invalid(name, "a number")),
        }
    }

    /// Numeric parameter rounded to a whole count
    pub fn count(&self, name: &'static str) -> Result<u32> {
        Ok(self.number(name)?.round().max(0.0) as u32)
    }

    /// Vector parameter
    pub fn vector(&self, name: &'static str, default: Position) -> Result<Position> {
        match self.get(name) {
            None => Ok(default),
            Some(ParamValue::Vector(v)) if v.is_finite() => Ok(*v),
            Some(_) => Err(self.invalid(name, "a finite vector")),
        }
    }

    /// Text option parsed with `parse`
    pub fn option<T>(&self, name: &'static str, default: T, parse: impl Fn(&str) -> Option<T>) -> Result<T> {
        match self.get(name) {
            None => Ok(default),
            Some(ParamValue::Text(text)) => parse(text).ok_or_else(|| self.invalid(name, "a known option")),
            Some(_) => Err(self.invalid(name, "text")),
        }
    }

    /// Plane option, defaulting to XY
    pub fn plane(&self) -> Result<Plane> {
        self.option("plane", Plane::Xy, Plane::from_name)
    }

    /// Easing option, defaulting to linear
    pub fn easing(&self) -> Result<Easing> {
        self.option("easing", Easing::Linear, Easing::from_name)
    }

    /// Boolean flag given as a number (non-zero is true)
    pub fn flag(&self, name: &'static str) -> Result<bool> {
        Ok(self.number(name)? != 0.0)
    }

    /// Required control points, at least `min_len` of them
    pub fn points(&self, name: &'static str, min_len: usize) -> Result<Vec<Position>> {
        match self.get(name) {
            Some(ParamValue::Points(points)) if points.len() >= min_len => {
                if points.iter().all(|p| p.is_finite()) {
                    Ok(points.clone())
                } else {
                    Err(self.invalid(name, "finite points"))
                }
            }
            Some(ParamValue::Points(_)) | None => Err(MotionError::MissingParameter {
                kind: self.kind,
                name,
            }),
            Some(_) => Err(self.invalid(name, "a list of points")),
        }
    }

    fn invalid(&self, name: &'static str, expected: &'static str) -> MotionError {
        MotionError::InvalidParameter {
            kind: self.kind,
            name,
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(entries: &[(&str, ParamValue)]) -> ParameterBag {
        entries.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_numbers_are_clamped_and_defaulted() {
        let bag = bag(&[("radius", ParamValue::Number(1.0e9))]);
        let reader = ParamReader::new(ModelKind::Circular, &bag);
        assert_eq!(reader.number("radius").unwrap(), 1000.0);
        assert_eq!(reader.number("end_angle").unwrap(), 360.0);
    }

    #[test]
    fn test_keys_match_across_casing() {
        let bag = bag(&[("startAngle", ParamValue::Number(45.0))]);
        let reader = ParamReader::new(ModelKind::Circular, &bag);
        assert_eq!(reader.number("start_angle").unwrap(), 45.0);
    }

    #[test]
    fn test_nan_falls_back_to_default() {
        let bag = bag(&[("radius", ParamValue::Number(f64::NAN))]);
        let reader = ParamReader::new(ModelKind::Circular, &bag);
        assert_eq!(reader.number("radius").unwrap(), 5.0);
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let bag = bag(&[("radius", ParamValue::Text("big".into()))]);
        let reader = ParamReader::new(ModelKind::Circular, &bag);
        assert!(matches!(
            reader.number("radius"),
            Err(MotionError::InvalidParameter { name: "radius", .. })
        ));
    }

    #[test]
    fn test_empty_points_are_missing() {
        let bag = bag(&[("points", ParamValue::Points(Vec::new()))]);
        let reader = ParamReader::new(ModelKind::CatmullRom, &bag);
        assert!(matches!(
            reader.points("points", 2),
            Err(MotionError::MissingParameter { name: "points", .. })
        ));
    }
}
