// Mapping functions for group keys and map streams.

use crate::graph::DynMapper;
use crate::fact::{Fact, FactValue};
use crate::tuple::Tuple;

/// A tuple-to-fact function, used as a group key or a map output position.
pub struct Mapper(pub(crate) DynMapper);

/// Wraps a tuple-to-value function as a [`Mapper`].
///
/// Returning a [`Fact`] keeps that fact's identity.
///
/// # Example
///
/// ```
/// use streamforge_scoring::stream::mapping;
/// use streamforge_scoring::Tuple;
///
/// let by_first = mapping(|t: &Tuple| t.fact(0).clone());
/// let doubled = mapping(|t: &Tuple| t.a::<i64>() * 2);
/// # let _ = (by_first, doubled);
/// ```
pub fn mapping<V, F>(f: F) -> Mapper
where
    V: FactValue,
    F: Fn(&Tuple) -> V + Send + Sync + 'static,
{
    Mapper(Box::new(move |t| Fact::new(f(t))))
}
