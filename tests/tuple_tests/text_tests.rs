//! Text Literal Tests
//!
//! Tests for parsing CLI literals into tuples and patterns.

use lindaspace::tuple::text::{
    format_literal, parse_pattern, parse_pattern_field, parse_tuple, parse_value,
};
use lindaspace::{pattern, tuple, PatternField, SpaceError, Value};

#[test]
fn test_parse_each_type() {
    assert_eq!(parse_value("STRING:Hello").unwrap(), Value::Text("Hello".to_string()));
    assert_eq!(parse_value("INT64:35").unwrap(), Value::Int(35));
    assert_eq!(parse_value("INT64:-7").unwrap(), Value::Int(-7));
    assert_eq!(parse_value("FLOAT64:3.14").unwrap(), Value::Float(3.14));
}

#[test]
fn test_string_keeps_everything_after_first_colon() {
    assert_eq!(
        parse_value("STRING:a:b:c").unwrap(),
        Value::Text("a:b:c".to_string())
    );
    assert_eq!(parse_value("STRING:").unwrap(), Value::Text(String::new()));
}

#[test]
fn test_unknown_type_rejected() {
    let err = parse_value("BOOL:true").unwrap_err();
    assert!(matches!(err, SpaceError::Validation(_)));
}

#[test]
fn test_missing_tag_rejected() {
    assert!(matches!(parse_value("Hello"), Err(SpaceError::Validation(_))));
}

#[test]
fn test_bad_numbers_rejected() {
    assert!(matches!(parse_value("INT64:abc"), Err(SpaceError::Validation(_))));
    assert!(matches!(parse_value("INT64:1.5"), Err(SpaceError::Validation(_))));
    assert!(matches!(parse_value("FLOAT64:x"), Err(SpaceError::Validation(_))));
}

#[test]
fn test_wildcard_only_in_patterns() {
    assert_eq!(parse_pattern_field("?").unwrap(), PatternField::Wildcard);
    assert!(matches!(
        parse_tuple(&["STRING:a", "?"]),
        Err(SpaceError::Validation(_))
    ));
}

#[test]
fn test_parse_tuple_and_pattern() {
    assert_eq!(
        parse_tuple(&["STRING:Hello", "INT64:35"]).unwrap(),
        tuple!["Hello", 35i64]
    );
    assert_eq!(
        parse_pattern(&["?", "INT64:35"]).unwrap(),
        pattern![_, 35i64]
    );
}

#[test]
fn test_empty_input_rejected() {
    let none: [&str; 0] = [];
    assert!(matches!(parse_tuple(&none), Err(SpaceError::Validation(_))));
    assert!(matches!(parse_pattern(&none), Err(SpaceError::Validation(_))));
}

#[test]
fn test_format_literal_parses_back() {
    for value in [
        Value::Text("x y".to_string()),
        Value::Int(i64::MIN),
        Value::Float(2.5),
    ] {
        assert_eq!(parse_value(&format_literal(&value)).unwrap(), value);
    }
}
