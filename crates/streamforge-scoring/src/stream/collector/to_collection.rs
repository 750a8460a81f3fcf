//! Collectors gathering extracted values into a list or a set.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hash;
use std::marker::PhantomData;

use super::{Accumulator, Collector};
use crate::fact::FactValue;
use crate::tuple::Tuple;

/// Creates a collector gathering every extracted value, duplicates included.
///
/// The list is in accumulation order; a retraction removes the most recently
/// accumulated equal value.
pub fn to_list<T, F>(mapper: F) -> ToListCollector<T, F>
where
    T: FactValue + Eq + Hash + Clone,
    F: Fn(&Tuple) -> T + Send + Sync + 'static,
{
    ToListCollector {
        mapper,
        _phantom: PhantomData,
    }
}

/// Collector created by [`to_list()`].
pub struct ToListCollector<T, F> {
    mapper: F,
    _phantom: PhantomData<fn() -> T>,
}

impl<T, F> Collector for ToListCollector<T, F>
where
    T: FactValue + Eq + Hash + Clone,
    F: Fn(&Tuple) -> T + Send + Sync + 'static,
{
    type Value = T;
    type Result = Vec<T>;
    type Accumulator = ToListAccumulator<T>;

    #[inline]
    fn extract(&self, tuple: &Tuple) -> T {
        (self.mapper)(tuple)
    }

    fn create_accumulator(&self) -> Self::Accumulator {
        ToListAccumulator { items: Vec::new() }
    }
}

pub struct ToListAccumulator<T> {
    items: Vec<T>,
}

impl<T> Accumulator<T, Vec<T>> for ToListAccumulator<T>
where
    T: FactValue + Eq + Hash + Clone,
{
    fn accumulate(&mut self, value: &T) {
        self.items.push(value.clone());
    }

    fn retract(&mut self, value: &T) {
        if let Some(pos) = self.items.iter().rposition(|v| v == value) {
            self.items.remove(pos);
        }
    }

    fn finish(&self) -> Vec<T> {
        self.items.clone()
    }
}

/// Creates a collector gathering the distinct extracted values in order.
pub fn to_set<T, F>(mapper: F) -> ToSetCollector<T, F>
where
    T: FactValue + Eq + Hash + Ord + Clone,
    F: Fn(&Tuple) -> T + Send + Sync + 'static,
{
    ToSetCollector {
        mapper,
        _phantom: PhantomData,
    }
}

/// Collector created by [`to_set()`].
pub struct ToSetCollector<T, F> {
    mapper: F,
    _phantom: PhantomData<fn() -> T>,
}

impl<T, F> Collector for ToSetCollector<T, F>
where
    T: FactValue + Eq + Hash + Ord + Clone,
    F: Fn(&Tuple) -> T + Send + Sync + 'static,
{
    type Value = T;
    type Result = BTreeSet<T>;
    type Accumulator = ToSetAccumulator<T>;

    #[inline]
    fn extract(&self, tuple: &Tuple) -> T {
        (self.mapper)(tuple)
    }

    fn create_accumulator(&self) -> Self::Accumulator {
        ToSetAccumulator {
            counts: BTreeMap::new(),
        }
    }
}

/// Multiset backing [`to_set()`]; a value leaves the set with its last copy.
pub struct ToSetAccumulator<T> {
    counts: BTreeMap<T, usize>,
}

impl<T> Accumulator<T, BTreeSet<T>> for ToSetAccumulator<T>
where
    T: FactValue + Eq + Hash + Ord + Clone,
{
    fn accumulate(&mut self, value: &T) {
        *self.counts.entry(value.clone()).or_insert(0) += 1;
    }

    fn retract(&mut self, value: &T) {
        if let Some(count) = self.counts.get_mut(value) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(value);
            }
        }
    }

    fn finish(&self) -> BTreeSet<T> {
        self.counts.keys().cloned().collect()
    }
}
