// Equality joiners.

use std::sync::Arc;

use super::Joiner;
use crate::fact::{Fact, FactValue};
use crate::tuple::Tuple;

/// Creates an indexing joiner matching when both extracted keys are equal.
///
/// Returning a [`Fact`] from an extractor keys on that fact's identity.
///
/// # Example
///
/// ```
/// use streamforge_scoring::stream::joiner::equal;
/// use streamforge_scoring::Tuple;
///
/// #[derive(Debug, PartialEq, Eq, Hash)]
/// struct Shift { employee_id: u32 }
/// #[derive(Debug, PartialEq, Eq, Hash)]
/// struct Employee { id: u32 }
///
/// let by_employee = equal(
///     |l: &Tuple| l.a::<Shift>().employee_id,
///     |r: &Tuple| r.a::<Employee>().id,
/// );
/// assert!(by_employee.is_indexing());
/// ```
pub fn equal<K, L, R>(left: L, right: R) -> Joiner
where
    K: FactValue,
    L: Fn(&Tuple) -> K + Send + Sync + 'static,
    R: Fn(&Tuple) -> K + Send + Sync + 'static,
{
    Joiner::Equal {
        left: Box::new(move |t| Fact::new(left(t))),
        right: Box::new(move |t| Fact::new(right(t))),
    }
}

/// Creates an indexing joiner using the same extractor on both sides.
///
/// Useful for self-joins of a uni stream.
pub fn equal_by<K, F>(key: F) -> Joiner
where
    K: FactValue,
    F: Fn(&Tuple) -> K + Send + Sync + 'static,
{
    let key = Arc::new(key);
    let right_key = Arc::clone(&key);
    Joiner::Equal {
        left: Box::new(move |t| Fact::new(key(t))),
        right: Box::new(move |t| Fact::new(right_key(t))),
    }
}
