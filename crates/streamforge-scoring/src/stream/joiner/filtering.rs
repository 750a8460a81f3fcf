// Filtering and cartesian joiners.

use super::Joiner;
use crate::tuple::Tuple;

/// Creates a filtering joiner from a predicate over (left, right).
///
/// # Example
///
/// ```
/// use streamforge_scoring::stream::joiner::filtering;
/// use streamforge_scoring::Tuple;
///
/// let later = filtering(|l: &Tuple, r: &Tuple| l.a::<i64>() < r.a::<i64>());
/// assert!(!later.is_indexing());
/// ```
pub fn filtering<F>(predicate: F) -> Joiner
where
    F: Fn(&Tuple, &Tuple) -> bool + Send + Sync + 'static,
{
    Joiner::Filtering(Box::new(predicate))
}

/// The cartesian pseudo-joiner: every left tuple matches every right tuple.
pub fn none() -> Joiner {
    Joiner::None
}
