//! Conditional collector wrapper.

use super::{Accumulator, Collector};
use crate::tuple::Tuple;

/// Wraps a collector so that only tuples passing `predicate` reach it.
///
/// # Example
///
/// ```
/// use streamforge_scoring::stream::collector::{conditionally, count, Accumulator, Collector};
/// use streamforge_scoring::{Fact, Tuple};
///
/// let collector = conditionally(|t: &Tuple| *t.a::<i64>() > 0, count());
/// let mut acc = collector.create_accumulator();
/// acc.accumulate(&collector.extract(&Tuple::from_facts([Fact::new(5i64)])));
/// acc.accumulate(&collector.extract(&Tuple::from_facts([Fact::new(-5i64)])));
/// assert_eq!(acc.finish(), 1);
/// ```
pub fn conditionally<P, C>(predicate: P, inner: C) -> ConditionalCollector<P, C>
where
    P: Fn(&Tuple) -> bool + Send + Sync + 'static,
    C: Collector,
{
    ConditionalCollector { predicate, inner }
}

/// Collector created by [`conditionally()`].
pub struct ConditionalCollector<P, C> {
    predicate: P,
    inner: C,
}

impl<P, C> Collector for ConditionalCollector<P, C>
where
    P: Fn(&Tuple) -> bool + Send + Sync + 'static,
    C: Collector,
{
    type Value = Option<C::Value>;
    type Result = C::Result;
    type Accumulator = ConditionalAccumulator<C::Accumulator>;

    fn extract(&self, tuple: &Tuple) -> Option<C::Value> {
        if (self.predicate)(tuple) {
            Some(self.inner.extract(tuple))
        } else {
            None
        }
    }

    fn create_accumulator(&self) -> Self::Accumulator {
        ConditionalAccumulator {
            inner: self.inner.create_accumulator(),
        }
    }
}

/// Forwards present values to the wrapped accumulator.
pub struct ConditionalAccumulator<A> {
    inner: A,
}

impl<V, R, A> Accumulator<Option<V>, R> for ConditionalAccumulator<A>
where
    A: Accumulator<V, R>,
{
    #[inline]
    fn accumulate(&mut self, value: &Option<V>) {
        if let Some(value) = value {
            self.inner.accumulate(value);
        }
    }

    #[inline]
    fn retract(&mut self, value: &Option<V>) {
        if let Some(value) = value {
            self.inner.retract(value);
        }
    }

    #[inline]
    fn finish(&self) -> R {
        self.inner.finish()
    }
}
