//! # sqon-filter
//!
//! Field filter leaves for the SQON mixer.
//!
//! A leaf is one `(op, fieldName, value)` condition, serialized in the SQON
//! shape query engines expect:
//!
//! ```json
//! {"op": "in", "content": {"fieldName": "donors.sex", "value": ["F"]}}
//! ```
//!
//! The mixer treats these as opaque; this crate only builds and validates
//! them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqon_mixer::Operand;

/// Errors raised while building a filter leaf.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("field name must not be empty")]
    EmptyField,

    #[error("operator `{op}` on `{field}` expects a list of values")]
    ExpectedList { op: FieldOp, field: String },

    #[error("operator `{op}` on `{field}` expects a single scalar value")]
    ExpectedScalar { op: FieldOp, field: String },
}

/// Field-level operator of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldOp {
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not-in")]
    NotIn,
    #[serde(rename = "all")]
    All,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
}

impl FieldOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldOp::In => "in",
            FieldOp::NotIn => "not-in",
            FieldOp::All => "all",
            FieldOp::Gt => ">",
            FieldOp::Gte => ">=",
            FieldOp::Lt => "<",
            FieldOp::Lte => "<=",
        }
    }

    /// Set operators take a list; comparisons take one scalar.
    pub fn takes_list(&self) -> bool {
        matches!(self, FieldOp::In | FieldOp::NotIn | FieldOp::All)
    }
}

impl std::fmt::Display for FieldOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldContent {
    pub field_name: String,
    pub value: Value,
}

/// One atomic filter condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub op: FieldOp,
    pub content: FieldContent,
}

impl FieldFilter {
    /// Build a validated leaf.
    ///
    /// A scalar given to a set operator is wrapped into a one-element list.
    pub fn new(op: FieldOp, field: impl Into<String>, value: Value) -> Result<Self, FilterError> {
        let field = field.into();
        if field.trim().is_empty() {
            return Err(FilterError::EmptyField);
        }

        let value = match (op.takes_list(), value) {
            (true, Value::Array(items)) => Value::Array(items),
            (true, Value::Object(_)) | (true, Value::Null) => {
                return Err(FilterError::ExpectedList { op, field });
            }
            (true, scalar) => Value::Array(vec![scalar]),
            (false, Value::Array(_)) | (false, Value::Object(_)) | (false, Value::Null) => {
                return Err(FilterError::ExpectedScalar { op, field });
            }
            (false, scalar) => scalar,
        };

        Ok(Self {
            op,
            content: FieldContent {
                field_name: field,
                value,
            },
        })
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        Self::new(FieldOp::In, field, Value::Array(values))
    }

    pub fn not_in<I, V>(field: impl Into<String>, values: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        Self::new(FieldOp::NotIn, field, Value::Array(values))
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Result<Self, FilterError> {
        Self::new(FieldOp::Gte, field, value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Result<Self, FilterError> {
        Self::new(FieldOp::Lte, field, value.into())
    }

    pub fn field_name(&self) -> &str {
        &self.content.field_name
    }
}

impl From<FieldFilter> for Operand<FieldFilter> {
    fn from(filter: FieldFilter) -> Self {
        Operand::Leaf(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_in_sqon_shape() {
        let leaf = FieldFilter::is_in("donors.sex", ["F"]).expect("valid leaf");
        assert_eq!(
            serde_json::to_value(&leaf).expect("serialize"),
            json!({"op": "in", "content": {"fieldName": "donors.sex", "value": ["F"]}})
        );
    }

    #[test]
    fn parses_sqon_shape() {
        let raw = r#"{"op": ">=", "content": {"fieldName": "age", "value": 18}}"#;
        let leaf: FieldFilter = serde_json::from_str(raw).expect("must parse leaf");
        assert_eq!(leaf, FieldFilter::gte("age", 18).expect("valid leaf"));
    }

    #[test]
    fn scalar_is_wrapped_for_set_operator() {
        let leaf = FieldFilter::new(FieldOp::NotIn, "status", json!("closed")).expect("valid");
        assert_eq!(leaf.content.value, json!(["closed"]));
    }

    #[test]
    fn comparison_rejects_list() {
        let err = FieldFilter::new(FieldOp::Lt, "age", json!([1, 2])).expect_err("must reject");
        assert_eq!(
            err,
            FilterError::ExpectedScalar {
                op: FieldOp::Lt,
                field: "age".to_string()
            }
        );
    }

    #[test]
    fn set_operator_rejects_null() {
        let err = FieldFilter::new(FieldOp::All, "tags", Value::Null).expect_err("must reject");
        assert!(matches!(err, FilterError::ExpectedList { .. }));
    }

    #[test]
    fn empty_field_is_rejected() {
        assert_eq!(FieldFilter::lte("  ", 3), Err(FilterError::EmptyField));
    }
}
