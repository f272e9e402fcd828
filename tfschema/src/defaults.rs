//! Default value providers for attributes
//!
//! Defaults populate the planned value of a computed attribute that the
//! configuration leaves null, before any plan modifier runs. A default is
//! only legal on a computed attribute; `validate_implementation` reports any
//! other use.
//!
//! # Examples
//!
//! ```no_run
//! use tfschema::attribute::Attribute;
//! use tfschema::defaults::{static_int64, static_string};
//!
//! let timeout = Attribute::int64()
//!     .optional()
//!     .computed()
//!     .default(static_int64(30));
//!
//! let region = Attribute::string()
//!     .optional()
//!     .computed()
//!     .default(static_string("us-east-1"));
//! ```

use crate::diagnostics::Diagnostics;
use crate::path::Path;
use crate::types::Value;

/// Request passed to a [`Default`]
#[derive(Debug, Clone)]
pub struct DefaultRequest {
    pub path: Path,
}

/// Response from a [`Default`]. `plan_value` is seeded with a null value of
/// the attribute's type.
#[derive(Debug, Clone)]
pub struct DefaultResponse {
    pub plan_value: Value,
    pub diagnostics: Diagnostics,
}

/// Default provides default values for computed attributes
pub trait Default: Send + Sync {
    /// Human-readable description
    fn description(&self) -> String;

    fn markdown_description(&self) -> String {
        self.description()
    }

    /// Provide default value
    fn default_value(&self, request: &DefaultRequest, response: &mut DefaultResponse);
}

/// StaticValue always sets the same value
#[derive(Debug, Clone, PartialEq)]
pub struct StaticValue {
    value: Value,
}

impl StaticValue {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Default for StaticValue {
    fn description(&self) -> String {
        format!("value defaults to {}", self.value)
    }

    fn markdown_description(&self) -> String {
        format!("value defaults to `{}`", self.value)
    }

    fn default_value(&self, _request: &DefaultRequest, response: &mut DefaultResponse) {
        response.plan_value = self.value.clone();
    }
}

pub fn static_bool(value: bool) -> StaticValue {
    StaticValue::new(Value::bool(value))
}

pub fn static_string(value: impl Into<String>) -> StaticValue {
    StaticValue::new(Value::string(value))
}

pub fn static_int32(value: i32) -> StaticValue {
    StaticValue::new(Value::int32(value))
}

pub fn static_int64(value: i64) -> StaticValue {
    StaticValue::new(Value::int64(value))
}

pub fn static_float32(value: f32) -> StaticValue {
    StaticValue::new(Value::float32(value))
}

pub fn static_float64(value: f64) -> StaticValue {
    StaticValue::new(Value::float64(value))
}

pub fn static_number(value: f64) -> StaticValue {
    StaticValue::new(Value::number(value))
}

/// Static default for collection, object and dynamic attributes. The value
/// must have the attribute's type.
pub fn static_value(value: Value) -> StaticValue {
    StaticValue::new(value)
}

/// FuncDefault computes the default from the request
pub struct FuncDefault<F>
where
    F: Fn(&DefaultRequest) -> Value + Send + Sync,
{
    description: String,
    func: F,
}

impl<F> FuncDefault<F>
where
    F: Fn(&DefaultRequest) -> Value + Send + Sync,
{
    pub fn new(description: impl Into<String>, func: F) -> Self {
        Self {
            description: description.into(),
            func,
        }
    }
}

impl<F> Default for FuncDefault<F>
where
    F: Fn(&DefaultRequest) -> Value + Send + Sync,
{
    fn description(&self) -> String {
        self.description.clone()
    }

    fn default_value(&self, request: &DefaultRequest, response: &mut DefaultResponse) {
        response.plan_value = (self.func)(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute_type::AttributeType;
    use std::collections::BTreeMap;

    fn run(default: &dyn Default, ty: AttributeType) -> DefaultResponse {
        let mut response = DefaultResponse {
            plan_value: Value::null(ty),
            diagnostics: Diagnostics::new(),
        };
        default.default_value(
            &DefaultRequest {
                path: Path::root("test"),
            },
            &mut response,
        );
        response
    }

    #[test]
    fn static_default_string() {
        let response = run(&static_string("us-east-1"), AttributeType::String);
        assert_eq!(response.plan_value, Value::string("us-east-1"));
        assert!(response.diagnostics.is_empty());
    }

    #[test]
    fn static_default_keeps_numeric_kind() {
        assert_eq!(
            run(&static_int32(8), AttributeType::Int32).plan_value.ty(),
            &AttributeType::Int32
        );
        assert_eq!(
            run(&static_float32(1.5), AttributeType::Float32).plan_value,
            Value::float32(1.5)
        );
        assert_eq!(
            run(&static_number(30.0), AttributeType::Number).plan_value,
            Value::number(30.0)
        );
    }

    #[test]
    fn static_default_map() {
        let value = Value::map(
            AttributeType::String,
            BTreeMap::from([("env".to_string(), Value::string("prod"))]),
        )
        .unwrap();
        let response = run(
            &static_value(value.clone()),
            AttributeType::map(AttributeType::String),
        );
        assert_eq!(response.plan_value, value);
    }

    #[test]
    fn static_default_descriptions() {
        let default = static_bool(true);
        assert_eq!(default.description(), "value defaults to true");
        assert_eq!(default.markdown_description(), "value defaults to `true`");
        assert_eq!(
            static_string("a").description(),
            "value defaults to \"a\""
        );
    }

    #[test]
    fn func_default_sees_request_path() {
        let default = FuncDefault::new("name derived from path", |request: &DefaultRequest| {
            Value::string(format!("{}-default", request.path))
        });
        let response = run(&default, AttributeType::String);
        assert_eq!(response.plan_value, Value::string("test-default"));
        assert_eq!(default.description(), "name derived from path");
    }
}
