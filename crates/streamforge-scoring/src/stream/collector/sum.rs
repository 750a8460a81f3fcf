// Sum collector.

use std::marker::PhantomData;
use std::ops::{AddAssign, SubAssign};

use super::{Accumulator, Collector};
use crate::fact::FactValue;
use crate::tuple::Tuple;

// Creates a collector that sums values extracted from tuples.
//
// Works for any `Copy + Default + AddAssign + SubAssign` value, which covers
// the integer types and `Decimal`.
//
// # Example
//
// ```
// use streamforge_scoring::stream::collector::{sum, Accumulator, Collector};
// use streamforge_scoring::{Fact, Tuple};
//
// let collector = sum(|t: &Tuple| *t.a::<i64>());
// let mut acc = collector.create_accumulator();
//
// acc.accumulate(&collector.extract(&Tuple::from_facts([Fact::new(5i64)])));
// acc.accumulate(&collector.extract(&Tuple::from_facts([Fact::new(7i64)])));
// assert_eq!(acc.finish(), 12);
// ```
pub fn sum<T, F>(mapper: F) -> SumCollector<T, F>
where
    T: FactValue + Default + Copy + AddAssign + SubAssign,
    F: Fn(&Tuple) -> T + Send + Sync + 'static,
{
    SumCollector {
        mapper,
        _phantom: PhantomData,
    }
}

// Collector that sums values extracted from tuples.
//
// Created by the [`sum()`] function.
pub struct SumCollector<T, F> {
    mapper: F,
    _phantom: PhantomData<fn() -> T>,
}

impl<T, F> Collector for SumCollector<T, F>
where
    T: FactValue + Default + Copy + AddAssign + SubAssign,
    F: Fn(&Tuple) -> T + Send + Sync + 'static,
{
    type Value = T;
    type Result = T;
    type Accumulator = SumAccumulator<T>;

    #[inline]
    fn extract(&self, tuple: &Tuple) -> T {
        (self.mapper)(tuple)
    }

    fn create_accumulator(&self) -> Self::Accumulator {
        SumAccumulator { sum: T::default() }
    }
}

// Accumulator for summing values.
pub struct SumAccumulator<T> {
    sum: T,
}

impl<T> Accumulator<T, T> for SumAccumulator<T>
where
    T: FactValue + Default + Copy + AddAssign + SubAssign,
{
    #[inline]
    fn accumulate(&mut self, value: &T) {
        self.sum += *value;
    }

    #[inline]
    fn retract(&mut self, value: &T) {
        self.sum -= *value;
    }

    #[inline]
    fn finish(&self) -> T {
        self.sum
    }
}
