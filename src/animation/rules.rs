//! Declarative option validation
//!
//! Each primitive kind declares which options it needs, their JSON types,
//! numeric ranges, minimum list lengths and allowed values. Options coming
//! from an animation config are checked against these rules before any
//! primitive is built, so errors name the offending field.

use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::MAX_BRIGHTNESS;

/// JSON type expected for an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Number,
    /// Whole number, as accepted by the typed option structs
    Integer,
    Array,
    String,
    Boolean,
}

impl FieldType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Array => "array",
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Array => value.is_array(),
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// Name of the JSON type of a value, for error messages
pub const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Inclusive numeric bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn check(self, field: &'static str, value: f64) -> Result<()> {
        if let Some(min) = self.min {
            if value < min {
                return Err(ConfigError::BelowMinimum { field, min });
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return Err(ConfigError::AboveMaximum { field, max });
            }
        }
        Ok(())
    }
}

/// Valid brightness values
pub const BRIGHTNESS_RANGE: Range = Range::between(0.0, MAX_BRIGHTNESS as f64);

/// Longest accepted duration or offset, one day in milliseconds
pub const MAX_DURATION_MS: u64 = 86_400_000;

/// Most shifts a single Shifting primitive may plan
pub const MAX_SHIFTS: u32 = 10_000;

/// Valid durations and offsets, in milliseconds
#[allow(clippy::cast_precision_loss)]
pub const DURATION_RANGE: Range = Range::between(0.0, MAX_DURATION_MS as f64);

/// Valid shift counts
#[allow(clippy::cast_lossless)]
pub const SHIFTS_RANGE: Range = Range::between(1.0, MAX_SHIFTS as f64);

/// Rule set for one primitive kind
#[derive(Debug, Clone, Copy)]
pub struct ValidationRules {
    pub required: &'static [&'static str],
    pub types: &'static [(&'static str, FieldType)],
    pub ranges: &'static [(&'static str, Range)],
    pub min_lengths: &'static [(&'static str, usize)],
    pub enums: &'static [(&'static str, &'static [&'static str])],
}

/// Baseline rules every primitive shares
pub const BASE_RULES: ValidationRules = ValidationRules {
    required: &["duration", "leds"],
    types: &[("duration", FieldType::Integer), ("leds", FieldType::Array)],
    ranges: &[("duration", DURATION_RANGE), ("brightness", BRIGHTNESS_RANGE)],
    min_lengths: &[],
    enums: &[],
};

impl ValidationRules {
    /// Check raw options for the given primitive kind.
    pub fn check(&self, kind: &'static str, options: &Map<String, Value>) -> Result<()> {
        for &field in self.required {
            if options.get(field).is_none_or(Value::is_null) {
                return Err(ConfigError::MissingField { kind, field });
            }
        }

        for &(field, expected) in self.types {
            if let Some(value) = options.get(field) {
                if !expected.matches(value) {
                    return Err(ConfigError::InvalidType {
                        field,
                        expected: expected.as_str(),
                        actual: type_name(value),
                    });
                }
            }
        }

        for &(field, range) in self.ranges {
            if let Some(value) = options.get(field).and_then(Value::as_f64) {
                range.check(field, value)?;
            }
        }

        for &(field, min) in self.min_lengths {
            if let Some(items) = options.get(field).and_then(Value::as_array) {
                ensure_min_len(field, items.len(), min)?;
            }
        }

        for &(field, allowed) in self.enums {
            if let Some(value) = options.get(field) {
                let known = value.as_str().is_some_and(|v| allowed.contains(&v));
                if !known {
                    return Err(ConfigError::NotAllowed {
                        field,
                        allowed: allowed.join(", "),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Reject lists shorter than `min`
pub fn ensure_min_len(field: &'static str, len: usize, min: usize) -> Result<()> {
    if len < min {
        return Err(ConfigError::TooFewElements { field, min });
    }
    Ok(())
}

/// Reject durations and offsets beyond [`MAX_DURATION_MS`]
#[allow(clippy::cast_precision_loss)]
pub fn ensure_duration(field: &'static str, millis: u64) -> Result<()> {
    if millis > MAX_DURATION_MS {
        return Err(ConfigError::AboveMaximum {
            field,
            max: MAX_DURATION_MS as f64,
        });
    }
    Ok(())
}

/// Reject brightness values above the PWM range
pub fn ensure_brightness(field: &'static str, value: u16) -> Result<()> {
    BRIGHTNESS_RANGE.check(field, f64::from(value))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn options(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn reports_first_missing_field() {
        let err = BASE_RULES
            .check("FadeIn", &options(json!({ "leds": [1] })))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                kind: "FadeIn",
                field: "duration"
            }
        ));
    }

    #[test]
    fn reports_type_mismatch() {
        let err = BASE_RULES
            .check("FadeIn", &options(json!({ "duration": 10, "leds": "1,2" })))
            .unwrap_err();
        assert_eq!(err.to_string(), "'leds' must be of type array, got string");
    }

    #[test]
    fn reports_range_violation() {
        let err = BASE_RULES
            .check(
                "FadeTo",
                &options(json!({ "duration": 10, "leds": [], "brightness": 5000 })),
            )
            .unwrap_err();
        assert_eq!(err.field(), Some("brightness"));
    }

    #[test]
    fn fractional_integer_field_names_the_field() {
        let rules = ValidationRules {
            types: &[("start", FieldType::Integer)],
            ..BASE_RULES
        };
        let err = rules
            .check(
                "FadeIn",
                &options(json!({ "duration": 10, "leds": [], "start": 100.5 })),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "'start' must be of type integer, got number");
        assert!(rules
            .check("FadeIn", &options(json!({ "duration": 10, "leds": [], "start": 100 })))
            .is_ok());
    }

    #[test]
    fn durations_have_an_upper_bound() {
        assert!(ensure_duration("duration", MAX_DURATION_MS).is_ok());
        let err = ensure_duration("duration", u64::MAX).unwrap_err();
        assert!(matches!(err, ConfigError::AboveMaximum { field: "duration", .. }));
    }
}
