//! Minimum and maximum collectors.
//!
//! Both keep a multiset of the extracted values, so retracting the current
//! extremum exposes the next one without rescanning the group.

use std::collections::BTreeMap;
use std::hash::Hash;
use std::marker::PhantomData;

use super::{Accumulator, Collector};
use crate::fact::FactValue;
use crate::tuple::Tuple;

#[derive(Clone, Copy)]
enum Extremum {
    Min,
    Max,
}

/// Creates a collector yielding the smallest extracted value, or `None`.
pub fn min<T, F>(mapper: F) -> ExtremumCollector<T, F>
where
    T: FactValue + Eq + Hash + Ord + Clone,
    F: Fn(&Tuple) -> T + Send + Sync + 'static,
{
    ExtremumCollector {
        mapper,
        which: Extremum::Min,
        _phantom: PhantomData,
    }
}

/// Creates a collector yielding the largest extracted value, or `None`.
pub fn max<T, F>(mapper: F) -> ExtremumCollector<T, F>
where
    T: FactValue + Eq + Hash + Ord + Clone,
    F: Fn(&Tuple) -> T + Send + Sync + 'static,
{
    ExtremumCollector {
        mapper,
        which: Extremum::Max,
        _phantom: PhantomData,
    }
}

/// Collector created by [`min()`] or [`max()`].
pub struct ExtremumCollector<T, F> {
    mapper: F,
    which: Extremum,
    _phantom: PhantomData<fn() -> T>,
}

impl<T, F> Collector for ExtremumCollector<T, F>
where
    T: FactValue + Eq + Hash + Ord + Clone,
    F: Fn(&Tuple) -> T + Send + Sync + 'static,
{
    type Value = T;
    type Result = Option<T>;
    type Accumulator = ExtremumAccumulator<T>;

    #[inline]
    fn extract(&self, tuple: &Tuple) -> T {
        (self.mapper)(tuple)
    }

    fn create_accumulator(&self) -> Self::Accumulator {
        ExtremumAccumulator {
            values: BTreeMap::new(),
            which: self.which,
        }
    }
}

/// Ordered multiset of extracted values.
pub struct ExtremumAccumulator<T> {
    values: BTreeMap<T, usize>,
    which: Extremum,
}

impl<T> Accumulator<T, Option<T>> for ExtremumAccumulator<T>
where
    T: FactValue + Eq + Hash + Ord + Clone,
{
    fn accumulate(&mut self, value: &T) {
        *self.values.entry(value.clone()).or_insert(0) += 1;
    }

    fn retract(&mut self, value: &T) {
        if let Some(count) = self.values.get_mut(value) {
            *count -= 1;
            if *count == 0 {
                self.values.remove(value);
            }
        }
    }

    fn finish(&self) -> Option<T> {
        let entry = match self.which {
            Extremum::Min => self.values.keys().next(),
            Extremum::Max => self.values.keys().next_back(),
        };
        entry.cloned()
    }
}
