//! Configuration value validators
//!
//! Validators run during configuration validation against the configured
//! value of a single attribute. Null and unknown values are skipped by every
//! built-in validator: required-ness is checked separately and unknown values
//! are validated again once they become known.

use crate::diagnostics::Diagnostics;
use crate::path::Path;
use crate::types::Value;

/// Request passed to a [`Validator`]
#[derive(Debug, Clone)]
pub struct ValidatorRequest<'a> {
    pub path: Path,
    /// Whole configuration
    pub config: &'a Value,
    pub config_value: Value,
}

pub trait Validator: Send + Sync {
    fn description(&self) -> String;

    fn markdown_description(&self) -> String {
        self.description()
    }

    fn validate(&self, request: &ValidatorRequest<'_>, diagnostics: &mut Diagnostics);
}

fn describe_bounds<T: std::fmt::Display>(min: Option<T>, max: Option<T>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("between {} and {}", min, max),
        (Some(min), None) => format!("at least {}", min),
        (None, Some(max)) => format!("at most {}", max),
        (None, None) => "unbounded".to_string(),
    }
}

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for StringLengthValidator {
    fn description(&self) -> String {
        format!("string length must be {}", describe_bounds(self.min, self.max))
    }

    fn validate(&self, request: &ValidatorRequest<'_>, diagnostics: &mut Diagnostics) {
        let Some(s) = request.config_value.as_str() else {
            return;
        };
        let len = s.chars().count();
        if self.min.is_some_and(|min| len < min) || self.max.is_some_and(|max| len > max) {
            diagnostics.add_attribute_error(
                request.path.clone(),
                "Invalid Attribute Value Length",
                format!(
                    "Attribute {} {}, got: {}",
                    request.path,
                    self.description(),
                    len
                ),
            );
        }
    }
}

pub struct StringPatternValidator {
    pub pattern: regex::Regex,
    pub description: String,
}

impl StringPatternValidator {
    pub fn new(pattern: regex::Regex, description: impl Into<String>) -> Self {
        Self {
            pattern,
            description: description.into(),
        }
    }
}

impl Validator for StringPatternValidator {
    fn description(&self) -> String {
        if self.description.is_empty() {
            format!("value must match regular expression '{}'", self.pattern)
        } else {
            self.description.clone()
        }
    }

    fn validate(&self, request: &ValidatorRequest<'_>, diagnostics: &mut Diagnostics) {
        let Some(s) = request.config_value.as_str() else {
            return;
        };
        if !self.pattern.is_match(s) {
            diagnostics.add_attribute_error(
                request.path.clone(),
                "Invalid Attribute Value Match",
                format!(
                    "Attribute {} {}, got: {}",
                    request.path,
                    self.description(),
                    s
                ),
            );
        }
    }
}

/// Bounds any numeric kind. Integer kinds are compared as f64.
pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Validator for NumberRangeValidator {
    fn description(&self) -> String {
        format!("value must be {}", describe_bounds(self.min, self.max))
    }

    fn validate(&self, request: &ValidatorRequest<'_>, diagnostics: &mut Diagnostics) {
        let Some(n) = request.config_value.as_f64() else {
            return;
        };
        if self.min.is_some_and(|min| n < min) || self.max.is_some_and(|max| n > max) {
            diagnostics.add_attribute_error(
                request.path.clone(),
                "Invalid Attribute Value",
                format!(
                    "Attribute {} {}, got: {}",
                    request.path,
                    self.description(),
                    request.config_value
                ),
            );
        }
    }
}

/// Bounds the element count of a list, set or map.
pub struct SizeValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for SizeValidator {
    fn description(&self) -> String {
        format!(
            "collection must contain {} elements",
            describe_bounds(self.min, self.max)
        )
    }

    fn validate(&self, request: &ValidatorRequest<'_>, diagnostics: &mut Diagnostics) {
        let size = match (
            request.config_value.elements(),
            request.config_value.attributes(),
        ) {
            (Some(elems), _) => elems.len(),
            (None, Some(entries)) => entries.len(),
            (None, None) => return,
        };
        if self.min.is_some_and(|min| size < min) || self.max.is_some_and(|max| size > max) {
            diagnostics.add_attribute_error(
                request.path.clone(),
                "Invalid Attribute Value",
                format!(
                    "Attribute {} {}, got: {}",
                    request.path,
                    self.description(),
                    size
                ),
            );
        }
    }
}

/// Accepts only values from a fixed set.
pub struct OneOfValidator {
    pub values: Vec<Value>,
}

impl OneOfValidator {
    pub fn new(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Convenience constructor for string attributes.
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(values.into_iter().map(Value::string))
    }
}

impl Validator for OneOfValidator {
    fn description(&self) -> String {
        let allowed: Vec<String> = self.values.iter().map(Value::to_string).collect();
        format!("value must be one of: [{}]", allowed.join(" "))
    }

    fn validate(&self, request: &ValidatorRequest<'_>, diagnostics: &mut Diagnostics) {
        if !request.config_value.is_known() {
            return;
        }
        if !self.values.contains(&request.config_value) {
            diagnostics.add_attribute_error(
                request.path.clone(),
                "Invalid Attribute Value Match",
                format!(
                    "Attribute {} {}, got: {}",
                    request.path,
                    self.description(),
                    request.config_value
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute_type::AttributeType;

    fn check(validator: &dyn Validator, value: Value) -> Diagnostics {
        let config = Value::object_from([("test_field", value.clone())]);
        let mut diags = Diagnostics::new();
        validator.validate(
            &ValidatorRequest {
                path: Path::root("test_field"),
                config: &config,
                config_value: value,
            },
            &mut diags,
        );
        diags
    }

    #[test]
    fn string_length_validator_accepts_valid_length() {
        let validator = StringLengthValidator {
            min: Some(3),
            max: Some(10),
        };
        assert!(check(&validator, Value::string("hello")).is_empty());
    }

    #[test]
    fn string_length_validator_rejects_too_short() {
        let validator = StringLengthValidator {
            min: Some(5),
            max: None,
        };
        let diags = check(&validator, Value::string("hi"));
        assert_eq!(diags.len(), 1);
        let diag = &diags.as_slice()[0];
        assert_eq!(diag.path, Some(Path::root("test_field")));
        assert_eq!(
            diag.detail,
            "Attribute test_field string length must be at least 5, got: 2"
        );
    }

    #[test]
    fn validators_skip_null_and_unknown() {
        let validator = StringLengthValidator {
            min: Some(5),
            max: None,
        };
        assert!(check(&validator, Value::null(AttributeType::String)).is_empty());
        assert!(check(&validator, Value::unknown(AttributeType::String)).is_empty());
        let one_of = OneOfValidator::strings(["a"]);
        assert!(check(&one_of, Value::unknown(AttributeType::String)).is_empty());
    }

    #[test]
    fn string_pattern_validator() {
        let validator = StringPatternValidator::new(
            regex::Regex::new("^[a-z]+$").unwrap(),
            "value must be lowercase letters",
        );
        assert!(check(&validator, Value::string("abc")).is_empty());
        let diags = check(&validator, Value::string("ABC"));
        assert!(diags.has_error());
    }

    #[test]
    fn number_range_validator_handles_integers() {
        let validator = NumberRangeValidator {
            min: Some(1.0),
            max: Some(65535.0),
        };
        assert!(check(&validator, Value::int64(443)).is_empty());
        assert!(check(&validator, Value::int64(0)).has_error());
        assert!(check(&validator, Value::float64(70000.5)).has_error());
    }

    #[test]
    fn size_validator_counts_elements() {
        let validator = SizeValidator {
            min: Some(1),
            max: Some(2),
        };
        let list = |n: usize| {
            Value::list(
                AttributeType::String,
                (0..n).map(|i| Value::string(i.to_string())).collect(),
            )
            .unwrap()
        };
        assert!(check(&validator, list(0)).has_error());
        assert!(check(&validator, list(2)).is_empty());
        assert!(check(&validator, list(3)).has_error());
    }

    #[test]
    fn one_of_validator() {
        let validator = OneOfValidator::strings(["small", "large"]);
        assert!(check(&validator, Value::string("small")).is_empty());
        let diags = check(&validator, Value::string("medium"));
        assert_eq!(
            diags.as_slice()[0].detail,
            "Attribute test_field value must be one of: [\"small\" \"large\"], got: \"medium\""
        );
    }
}
