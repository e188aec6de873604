//! Pattern matching
//!
//! The single matching rule used by every scan of the store.

use super::{Pattern, Tuple};

/// Check whether `tuple` is matched by `pattern`
///
/// - Arity must be equal
/// - A wildcard position matches anything
/// - An exact position needs the same scalar type and the same value;
///   there is no coercion between `Int` and `Float`
///
/// Pure and O(arity); called under the store lock.
pub fn matches(tuple: &Tuple, pattern: &Pattern) -> bool {
    if tuple.arity() != pattern.arity() {
        return false;
    }

    tuple
        .fields()
        .iter()
        .zip(pattern.fields())
        .all(|(value, field)| field.accepts(value))
}
