//! Tuple Module
//!
//! Data model shared by the store, the wire protocol and the CLI.
//!
//! ## Types
//! - [`Value`]: closed scalar set (text, i64, f64)
//! - [`Tuple`]: non-empty, immutable sequence of values (what the space stores)
//! - [`PatternField`]: a concrete value or a wildcard
//! - [`Pattern`]: non-empty sequence of pattern fields (what callers query with)
//!
//! A wildcard can only appear in a [`Pattern`]. `Tuple` holds [`Value`]s, so
//! a resident tuple can never contain one.

mod matcher;
pub mod text;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpaceError};

pub use matcher::matches;

/// A scalar tuple element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// UTF-8 text
    Text(String),

    /// Signed 64-bit integer
    Int(i64),

    /// 64-bit float (IEEE equality, so NaN never equals itself)
    Float(f64),
}

impl Value {
    /// Name of the scalar type, as used by the text literal layer
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "STRING",
            Value::Int(_) => "INT64",
            Value::Float(_) => "FLOAT64",
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
        }
    }
}

// =============================================================================
// Tuple
// =============================================================================

/// An ordered, fixed-arity, immutable sequence of values
///
/// Construction validates arity >= 1. There is no way to mutate a tuple
/// after it is built; callers receive clones of resident tuples.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    fields: Vec<Value>,
}

impl Tuple {
    /// Create a tuple, rejecting an empty field list
    pub fn new(fields: Vec<Value>) -> Result<Self> {
        if fields.is_empty() {
            return Err(SpaceError::Validation("tuple cannot be empty".to_string()));
        }
        Ok(Self { fields })
    }

    /// The tuple's values in order
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// Number of fields
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Field at `index`, if present
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }

    /// Give back the owned values
    pub fn into_fields(self) -> Vec<Value> {
        self.fields
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", field)?;
        }
        write!(f, ")")
    }
}

/// Build a tuple from literals: `tuple!["foo", 42i64, 3.14]`
///
/// Panics on an empty list, so only use it with at least one element.
#[macro_export]
macro_rules! tuple {
    ($($field:expr),+ $(,)?) => {
        $crate::tuple::Tuple::new(vec![$($crate::tuple::Value::from($field)),+])
            .expect("tuple! requires at least one field")
    };
}

// =============================================================================
// Pattern
// =============================================================================

/// One position of a pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatternField {
    /// Must equal the tuple's value (same type, same value)
    Exact(Value),

    /// Matches any value
    Wildcard,
}

impl PatternField {
    /// Whether this position accepts `value`
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            PatternField::Exact(expected) => expected == value,
            PatternField::Wildcard => true,
        }
    }
}

impl From<Value> for PatternField {
    fn from(value: Value) -> Self {
        PatternField::Exact(value)
    }
}

impl From<&str> for PatternField {
    fn from(value: &str) -> Self {
        PatternField::Exact(value.into())
    }
}

impl From<String> for PatternField {
    fn from(value: String) -> Self {
        PatternField::Exact(value.into())
    }
}

impl From<i64> for PatternField {
    fn from(value: i64) -> Self {
        PatternField::Exact(value.into())
    }
}

impl From<f64> for PatternField {
    fn from(value: f64) -> Self {
        PatternField::Exact(value.into())
    }
}

impl fmt::Display for PatternField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternField::Exact(value) => write!(f, "{}", value),
            PatternField::Wildcard => write!(f, "?"),
        }
    }
}

/// A query over the space: same arity rule as [`Tuple`]
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    fields: Vec<PatternField>,
}

impl Pattern {
    /// Create a pattern, rejecting an empty field list
    pub fn new(fields: Vec<PatternField>) -> Result<Self> {
        if fields.is_empty() {
            return Err(SpaceError::Validation(
                "pattern cannot be empty".to_string(),
            ));
        }
        Ok(Self { fields })
    }

    /// Pattern that matches `tuple` exactly
    pub fn exact(tuple: &Tuple) -> Self {
        Self {
            fields: tuple
                .fields()
                .iter()
                .cloned()
                .map(PatternField::Exact)
                .collect(),
        }
    }

    /// All-wildcard pattern of the given arity
    pub fn any(arity: usize) -> Result<Self> {
        Self::new(vec![PatternField::Wildcard; arity])
    }

    pub fn fields(&self) -> &[PatternField] {
        &self.fields
    }

    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    pub fn into_fields(self) -> Vec<PatternField> {
        self.fields
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", field)?;
        }
        write!(f, ")")
    }
}

/// Build a pattern; `_` is a wildcard: `pattern!["foo", _, -1i64]`
///
/// Panics on an empty list, so only use it with at least one element.
#[macro_export]
macro_rules! pattern {
    (@acc [$($out:expr),*]) => {
        $crate::tuple::Pattern::new(vec![$($out),*])
            .expect("pattern! requires at least one field")
    };
    (@acc [$($out:expr),*] _ $(, $($rest:tt)*)?) => {
        $crate::pattern!(@acc [$($out,)* $crate::tuple::PatternField::Wildcard] $($($rest)*)?)
    };
    (@acc [$($out:expr),*] $field:expr $(, $($rest:tt)*)?) => {
        $crate::pattern!(@acc [$($out,)* $crate::tuple::PatternField::from($field)] $($($rest)*)?)
    };
    ($($input:tt)+) => {
        $crate::pattern!(@acc [] $($input)+)
    };
}
