//! LoadBalance collector for measuring how unevenly load is spread.
//!
//! Unfairness is the square root of the sum of squared deviations of each
//! key's load from the mean load. Zero means perfectly balanced.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::{Accumulator, Collector};
use crate::fact::FactValue;
use crate::tuple::Tuple;

/// Result of load balancing: load per key plus the unfairness measure.
#[derive(Debug, Clone)]
pub struct LoadBalance<K> {
    loads: HashMap<K, i64>,
    unfairness: i64,
}

impl<K> LoadBalance<K> {
    /// Returns the total load of every key with a non-zero load.
    pub fn loads(&self) -> &HashMap<K, i64> {
        &self.loads
    }

    /// Returns unfairness rounded to the nearest integer.
    #[inline]
    pub fn unfairness(&self) -> i64 {
        self.unfairness
    }
}

impl<K: Eq + Hash> PartialEq for LoadBalance<K> {
    fn eq(&self, other: &Self) -> bool {
        self.unfairness == other.unfairness && self.loads == other.loads
    }
}

impl<K: Eq + Hash> Eq for LoadBalance<K> {}

impl<K: Eq + Hash> Hash for LoadBalance<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.unfairness.hash(state);
        self.loads.len().hash(state);
    }
}

/// Creates a load balance collector.
///
/// # Example
///
/// ```
/// use streamforge_scoring::stream::collector::{load_balance, Accumulator, Collector};
/// use streamforge_scoring::{Fact, Tuple};
///
/// let collector = load_balance(|t: &Tuple| *t.a::<u32>(), |_: &Tuple| 1);
/// let mut acc = collector.create_accumulator();
///
/// for employee in [0u32, 0, 1] {
///     acc.accumulate(&collector.extract(&Tuple::from_facts([Fact::new(employee)])));
/// }
/// // Loads 2 and 1 around a mean of 1.5: sqrt(0.5) rounds to 1.
/// assert_eq!(acc.finish().unfairness(), 1);
/// ```
pub fn load_balance<K, F, M>(key_fn: F, metric_fn: M) -> LoadBalanceCollector<K, F, M>
where
    K: FactValue + Eq + Hash + Clone,
    F: Fn(&Tuple) -> K + Send + Sync + 'static,
    M: Fn(&Tuple) -> i64 + Send + Sync + 'static,
{
    LoadBalanceCollector {
        key_fn,
        metric_fn,
        _phantom: PhantomData,
    }
}

/// Collector for computing load balance unfairness.
pub struct LoadBalanceCollector<K, F, M> {
    key_fn: F,
    metric_fn: M,
    _phantom: PhantomData<fn() -> K>,
}

impl<K, F, M> Collector for LoadBalanceCollector<K, F, M>
where
    K: FactValue + Eq + Hash + Clone,
    F: Fn(&Tuple) -> K + Send + Sync + 'static,
    M: Fn(&Tuple) -> i64 + Send + Sync + 'static,
{
    type Value = (K, i64);
    type Result = LoadBalance<K>;
    type Accumulator = LoadBalanceAccumulator<K>;

    #[inline]
    fn extract(&self, tuple: &Tuple) -> Self::Value {
        ((self.key_fn)(tuple), (self.metric_fn)(tuple))
    }

    fn create_accumulator(&self) -> Self::Accumulator {
        LoadBalanceAccumulator {
            loads: HashMap::new(),
            sum: 0,
            sum_of_squares: 0,
        }
    }
}

/// Keeps Σx and Σx² over per-key loads so each update is O(1).
///
/// The squared deviation is `Σx² - (Σx)² / n`, evaluated exactly in `i128`
/// as `(n·Σx² - (Σx)²) / n` before the final square root.
pub struct LoadBalanceAccumulator<K> {
    /// (contributing items, load) per key.
    loads: HashMap<K, (usize, i64)>,
    sum: i128,
    sum_of_squares: i128,
}

impl<K: Eq + Hash + Clone> LoadBalanceAccumulator<K> {
    fn apply(&mut self, key: &K, items: isize, diff: i64) {
        let entry = self.loads.entry(key.clone()).or_insert((0, 0));
        let old = i128::from(entry.1);
        entry.0 = entry.0.saturating_add_signed(items);
        entry.1 += diff;
        let new = i128::from(entry.1);
        if entry.0 == 0 {
            self.loads.remove(key);
        }
        self.sum += new - old;
        self.sum_of_squares += new * new - old * old;
    }

    fn compute_unfairness(&self) -> i64 {
        let n = self.loads.len() as i128;
        if n == 0 {
            return 0;
        }
        let numerator = n * self.sum_of_squares - self.sum * self.sum;
        let variance_sum = numerator as f64 / n as f64;
        variance_sum.max(0.0).sqrt().round() as i64
    }
}

impl<K> Accumulator<(K, i64), LoadBalance<K>> for LoadBalanceAccumulator<K>
where
    K: FactValue + Eq + Hash + Clone,
{
    #[inline]
    fn accumulate(&mut self, value: &(K, i64)) {
        self.apply(&value.0, 1, value.1);
    }

    #[inline]
    fn retract(&mut self, value: &(K, i64)) {
        self.apply(&value.0, -1, -value.1);
    }

    fn finish(&self) -> LoadBalance<K> {
        LoadBalance {
            loads: self
                .loads
                .iter()
                .filter(|(_, (_, load))| *load != 0)
                .map(|(k, (_, load))| (k.clone(), *load))
                .collect(),
            unfairness: self.compute_unfairness(),
        }
    }
}
