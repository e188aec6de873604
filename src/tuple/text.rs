//! Text literal layer
//!
//! Parses the typed literals typed at the CLI into tuples and patterns.
//!
//! ## Literal Format
//! ```text
//! STRING:<text>     text value (everything after the first ':')
//! INT64:<integer>   signed 64-bit integer
//! FLOAT64:<float>   64-bit float
//! ?                 wildcard (patterns only)
//! ```
//!
//! Example: `out STRING:Hello INT64:35`, `rd STRING:Hello ?`

use crate::error::{Result, SpaceError};

use super::{Pattern, PatternField, Tuple, Value};

/// Token standing for a wildcard position
pub const WILDCARD_TOKEN: &str = "?";

/// Parse one typed literal into a value
pub fn parse_value(literal: &str) -> Result<Value> {
    let (tag, raw) = literal.split_once(':').ok_or_else(|| {
        SpaceError::Validation(format!(
            "literal '{}' is missing a type tag (STRING:, INT64:, FLOAT64:)",
            literal
        ))
    })?;

    match tag {
        "STRING" => Ok(Value::Text(raw.to_string())),
        "INT64" => raw.parse::<i64>().map(Value::Int).map_err(|e| {
            SpaceError::Validation(format!("invalid INT64 literal '{}': {}", raw, e))
        }),
        "FLOAT64" => raw.parse::<f64>().map(Value::Float).map_err(|e| {
            SpaceError::Validation(format!("invalid FLOAT64 literal '{}': {}", raw, e))
        }),
        other => Err(SpaceError::Validation(format!(
            "unsupported element type '{}'",
            other
        ))),
    }
}

/// Parse one pattern position (a literal or the wildcard token)
pub fn parse_pattern_field(literal: &str) -> Result<PatternField> {
    if literal == WILDCARD_TOKEN {
        return Ok(PatternField::Wildcard);
    }
    parse_value(literal).map(PatternField::Exact)
}

/// Parse a whole tuple; the wildcard token is rejected here
pub fn parse_tuple<S: AsRef<str>>(literals: &[S]) -> Result<Tuple> {
    let fields = literals
        .iter()
        .map(|lit| {
            let lit = lit.as_ref();
            if lit == WILDCARD_TOKEN {
                Err(SpaceError::Validation(
                    "wildcard is not allowed in a tuple".to_string(),
                ))
            } else {
                parse_value(lit)
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Tuple::new(fields)
}

/// Parse a whole pattern
pub fn parse_pattern<S: AsRef<str>>(literals: &[S]) -> Result<Pattern> {
    let fields = literals
        .iter()
        .map(|lit| parse_pattern_field(lit.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    Pattern::new(fields)
}

/// Render a value back into its typed literal form
pub fn format_literal(value: &Value) -> String {
    match value {
        Value::Text(s) => format!("STRING:{}", s),
        Value::Int(i) => format!("INT64:{}", i),
        Value::Float(x) => format!("FLOAT64:{}", x),
    }
}
