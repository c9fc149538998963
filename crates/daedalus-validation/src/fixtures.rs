//! A small JSON-shape schema provider.
//!
//! [`ShapeValidator`] is the reference [`Validator`]: it checks value kinds,
//! required and unknown object fields, array items and string lengths, and
//! coerces string inputs (params, queries, headers) into numbers and
//! booleans where the schema asks for them.
//!
//! # Example
//!
//! ```
//! use daedalus_validation::fixtures::ShapeSchema;
//!
//! let user = ShapeSchema::object()
//!     .field("name", ShapeSchema::string().min_length(1))
//!     .optional("age", ShapeSchema::integer());
//!
//! assert!(user.check(&serde_json::json!({ "name": "Ada" })).is_ok());
//! assert!(user.check(&serde_json::json!({ "name": "" })).is_err());
//! assert!(user.check(&serde_json::json!({ "age": 3 })).is_err());
//! ```

use std::future::Future;

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::error::{Issue, Rejection};
use crate::provider::{Provider, ProviderId};
use crate::validator::Validator;

/// Provider of [`ShapeSchema`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeProvider;

impl Provider for ShapeProvider {
    type Schema = ShapeSchema;
    const ID: ProviderId = ProviderId::new("shape");
}

/// An object field.
#[derive(Debug, Clone)]
pub struct Field {
    schema: ShapeSchema,
    required: bool,
}

/// The expected shape of a JSON value.
#[derive(Debug, Clone)]
pub enum ShapeSchema {
    /// Any value.
    Any,
    /// A string.
    String {
        /// Minimum length in characters.
        min_length: Option<usize>,
    },
    /// An integer.
    Integer,
    /// Any number.
    Number,
    /// A boolean.
    Boolean,
    /// An array whose items all match.
    Array(Box<ShapeSchema>),
    /// An object.
    Object {
        /// Declared fields.
        fields: IndexMap<String, Field>,
        /// Whether undeclared fields are accepted.
        additional: bool,
    },
}

impl ShapeSchema {
    /// Accepts anything.
    pub fn any() -> Self {
        Self::Any
    }

    /// A string schema.
    pub fn string() -> Self {
        Self::String { min_length: None }
    }

    /// An integer schema.
    pub fn integer() -> Self {
        Self::Integer
    }

    /// A number schema.
    pub fn number() -> Self {
        Self::Number
    }

    /// A boolean schema.
    pub fn boolean() -> Self {
        Self::Boolean
    }

    /// An array schema.
    pub fn array(items: Self) -> Self {
        Self::Array(Box::new(items))
    }

    /// An object schema that accepts undeclared fields.
    pub fn object() -> Self {
        Self::Object {
            fields: IndexMap::new(),
            additional: true,
        }
    }

    /// Sets the minimum length of a string schema.
    #[must_use]
    pub fn min_length(self, len: usize) -> Self {
        match self {
            Self::String { .. } => Self::String {
                min_length: Some(len),
            },
            other => other,
        }
    }

    /// Adds a required field to an object schema.
    #[must_use]
    pub fn field(self, name: &str, schema: Self) -> Self {
        self.with_field(name, schema, true)
    }

    /// Adds an optional field to an object schema.
    #[must_use]
    pub fn optional(self, name: &str, schema: Self) -> Self {
        self.with_field(name, schema, false)
    }

    /// Rejects undeclared fields of an object schema.
    #[must_use]
    pub fn strict(self) -> Self {
        match self {
            Self::Object { fields, .. } => Self::Object {
                fields,
                additional: false,
            },
            other => other,
        }
    }

    fn with_field(self, name: &str, schema: Self, required: bool) -> Self {
        match self {
            Self::Object {
                mut fields,
                additional,
            } => {
                fields.insert(name.to_string(), Field { schema, required });
                Self::Object { fields, additional }
            }
            other => other,
        }
    }

    /// Checks `value` without coercion.
    pub fn check(&self, value: &Value) -> Result<Value, Rejection> {
        self.run(value, false)
    }

    /// Checks `value`, coercing strings where a number or boolean is expected.
    pub fn check_coercing(&self, value: &Value) -> Result<Value, Rejection> {
        self.run(value, true)
    }

    fn run(&self, value: &Value, coerce: bool) -> Result<Value, Rejection> {
        let mut issues = Vec::new();
        let out = self.visit(value, "$", coerce, &mut issues);
        if issues.is_empty() {
            Ok(out)
        } else {
            Err(Rejection::from_issues(issues))
        }
    }

    fn visit(&self, value: &Value, path: &str, coerce: bool, issues: &mut Vec<Issue>) -> Value {
        let mismatch = |issues: &mut Vec<Issue>, expected: &str| {
            issues.push(
                Issue::new(path, format!("expected {expected}, got {}", kind(value)))
                    .with_code("invalid_type"),
            );
            value.clone()
        };

        match (self, value) {
            (Self::Any, _) => value.clone(),

            (Self::String { min_length }, Value::String(s)) => {
                if let Some(min) = min_length {
                    if s.chars().count() < *min {
                        issues.push(
                            Issue::new(path, format!("must be at least {min} characters"))
                                .with_code("too_short"),
                        );
                    }
                }
                value.clone()
            }
            (Self::String { .. }, _) => mismatch(issues, "string"),

            (Self::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => value.clone(),
            (Self::Integer, Value::String(s)) if coerce => match s.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => mismatch(issues, "integer"),
            },
            (Self::Integer, _) => mismatch(issues, "integer"),

            (Self::Number, Value::Number(_)) => value.clone(),
            (Self::Number, Value::String(s)) if coerce => {
                match s.trim().parse::<f64>().ok().and_then(Number::from_f64) {
                    Some(n) => Value::Number(n),
                    None => mismatch(issues, "number"),
                }
            }
            (Self::Number, _) => mismatch(issues, "number"),

            (Self::Boolean, Value::Bool(_)) => value.clone(),
            (Self::Boolean, Value::String(s)) if coerce => match s.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => mismatch(issues, "boolean"),
            },
            (Self::Boolean, _) => mismatch(issues, "boolean"),

            (Self::Array(items), Value::Array(values)) => Value::Array(
                values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| items.visit(v, &format!("{path}[{i}]"), coerce, issues))
                    .collect(),
            ),
            (Self::Array(items), other) if coerce && !other.is_null() => {
                Value::Array(vec![items.visit(other, &format!("{path}[0]"), coerce, issues)])
            }
            (Self::Array(_), _) => mismatch(issues, "array"),

            (Self::Object { fields, additional }, Value::Object(object)) => {
                let mut out = Map::new();
                for (name, field) in fields {
                    let field_path = format!("{path}.{name}");
                    match object.get(name) {
                        Some(v) => {
                            out.insert(name.clone(), field.schema.visit(v, &field_path, coerce, issues));
                        }
                        None if field.required => issues.push(
                            Issue::new(field_path, "is required").with_code("required"),
                        ),
                        None => {}
                    }
                }
                for (name, v) in object {
                    if fields.contains_key(name) {
                        continue;
                    }
                    if *additional {
                        out.insert(name.clone(), v.clone());
                    } else {
                        issues.push(
                            Issue::new(format!("{path}.{name}"), "is not allowed")
                                .with_code("unrecognized_key"),
                        );
                    }
                }
                Value::Object(out)
            }
            (Self::Object { .. }, _) => mismatch(issues, "object"),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The [`Validator`] for [`ShapeSchema`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeValidator;

impl Validator for ShapeValidator {
    type Provider = ShapeProvider;

    fn validate_params(
        &self,
        schema: &ShapeSchema,
        value: Value,
    ) -> impl Future<Output = Result<Value, Rejection>> + Send {
        std::future::ready(schema.check_coercing(&value))
    }

    fn validate_queries(
        &self,
        schema: &ShapeSchema,
        value: Value,
    ) -> impl Future<Output = Result<Value, Rejection>> + Send {
        std::future::ready(schema.check_coercing(&value))
    }

    fn validate_headers(
        &self,
        schema: &ShapeSchema,
        value: Value,
    ) -> impl Future<Output = Result<Value, Rejection>> + Send {
        std::future::ready(schema.check_coercing(&value))
    }

    fn validate_body(
        &self,
        schema: &ShapeSchema,
        value: Value,
    ) -> impl Future<Output = Result<Value, Rejection>> + Send {
        std::future::ready(schema.check(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coercion_only_when_requested() {
        let schema = ShapeSchema::object()
            .field("page", ShapeSchema::integer())
            .optional("debug", ShapeSchema::boolean());
        let input = json!({ "page": "2", "debug": "true" });

        assert_eq!(
            schema.check_coercing(&input).unwrap(),
            json!({ "page": 2, "debug": true })
        );
        let err = schema.check(&input).unwrap_err();
        assert_eq!(err.issues.len(), 2);
        assert_eq!(err.issues[0].path, "$.page");
    }

    #[test]
    fn test_strict_objects_reject_unknown_fields() {
        let schema = ShapeSchema::object().field("id", ShapeSchema::integer()).strict();
        let err = schema.check(&json!({ "id": 1, "extra": true })).unwrap_err();
        assert_eq!(err.issues[0].code.as_deref(), Some("unrecognized_key"));
    }

    #[test]
    fn test_nested_paths() {
        let schema = ShapeSchema::object().field(
            "items",
            ShapeSchema::array(ShapeSchema::object().field("qty", ShapeSchema::integer())),
        );
        let err = schema
            .check(&json!({ "items": [{ "qty": 1 }, { "qty": "x" }] }))
            .unwrap_err();
        assert_eq!(err.message, "$.items[1].qty: expected integer, got string");
    }

    #[test]
    fn test_single_query_value_coerces_into_array() {
        let schema = ShapeSchema::object().field("tag", ShapeSchema::array(ShapeSchema::string()));
        assert_eq!(
            schema.check_coercing(&json!({ "tag": "a" })).unwrap(),
            json!({ "tag": ["a"] })
        );
    }
}
