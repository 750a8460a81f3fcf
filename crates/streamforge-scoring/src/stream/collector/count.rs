//! Counting collectors.

use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;

use super::{Accumulator, Collector};
use crate::tuple::Tuple;

/// Creates a collector that counts the tuples of a group.
///
/// # Example
///
/// ```
/// use streamforge_scoring::stream::collector::{count, Accumulator, Collector};
/// use streamforge_scoring::{Fact, Tuple};
///
/// let collector = count();
/// let mut acc = collector.create_accumulator();
/// let t = Tuple::from_facts([Fact::new(1)]);
///
/// acc.accumulate(&collector.extract(&t));
/// acc.accumulate(&collector.extract(&t));
/// assert_eq!(acc.finish(), 2);
///
/// acc.retract(&collector.extract(&t));
/// assert_eq!(acc.finish(), 1);
/// ```
pub fn count() -> CountCollector {
    CountCollector
}

/// A collector that counts tuples.
///
/// Created by the [`count()`] function.
pub struct CountCollector;

impl Collector for CountCollector {
    type Value = ();
    type Result = usize;
    type Accumulator = CountAccumulator;

    #[inline]
    fn extract(&self, _tuple: &Tuple) {}

    fn create_accumulator(&self) -> Self::Accumulator {
        CountAccumulator { count: 0 }
    }
}

/// Accumulator for counting tuples.
pub struct CountAccumulator {
    count: usize,
}

impl Accumulator<(), usize> for CountAccumulator {
    #[inline]
    fn accumulate(&mut self, _: &()) {
        self.count += 1;
    }

    #[inline]
    fn retract(&mut self, _: &()) {
        self.count = self.count.saturating_sub(1);
    }

    #[inline]
    fn finish(&self) -> usize {
        self.count
    }
}

/// Creates a collector that counts distinct extracted values.
pub fn count_distinct<K, F>(mapper: F) -> CountDistinctCollector<K, F>
where
    K: Eq + Hash + Clone + Send + 'static,
    F: Fn(&Tuple) -> K + Send + Sync + 'static,
{
    CountDistinctCollector {
        mapper,
        _phantom: PhantomData,
    }
}

/// A collector that counts distinct values.
pub struct CountDistinctCollector<K, F> {
    mapper: F,
    _phantom: PhantomData<fn() -> K>,
}

impl<K, F> Collector for CountDistinctCollector<K, F>
where
    K: Eq + Hash + Clone + Send + 'static,
    F: Fn(&Tuple) -> K + Send + Sync + 'static,
{
    type Value = K;
    type Result = usize;
    type Accumulator = CountDistinctAccumulator<K>;

    #[inline]
    fn extract(&self, tuple: &Tuple) -> K {
        (self.mapper)(tuple)
    }

    fn create_accumulator(&self) -> Self::Accumulator {
        CountDistinctAccumulator {
            counts: HashMap::new(),
        }
    }
}

/// Multiset of values; the result is the number of distinct keys.
pub struct CountDistinctAccumulator<K> {
    counts: HashMap<K, usize>,
}

impl<K> Accumulator<K, usize> for CountDistinctAccumulator<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    fn accumulate(&mut self, value: &K) {
        *self.counts.entry(value.clone()).or_insert(0) += 1;
    }

    fn retract(&mut self, value: &K) {
        if let Some(count) = self.counts.get_mut(value) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(value);
            }
        }
    }

    fn finish(&self) -> usize {
        self.counts.len()
    }
}
