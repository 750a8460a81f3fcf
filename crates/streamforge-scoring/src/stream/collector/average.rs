//! Average collector.

use rust_decimal::Decimal;

use super::{Accumulator, Collector};
use crate::tuple::Tuple;

/// Creates a collector averaging an integer value; `None` for an empty group.
///
/// The average is exact where a decimal can represent it and rounded to
/// 28 significant digits otherwise.
pub fn average<F>(mapper: F) -> AverageCollector<F>
where
    F: Fn(&Tuple) -> i64 + Send + Sync + 'static,
{
    AverageCollector { mapper }
}

/// Collector averaging integer values.
pub struct AverageCollector<F> {
    mapper: F,
}

impl<F> Collector for AverageCollector<F>
where
    F: Fn(&Tuple) -> i64 + Send + Sync + 'static,
{
    type Value = i64;
    type Result = Option<Decimal>;
    type Accumulator = AverageAccumulator;

    #[inline]
    fn extract(&self, tuple: &Tuple) -> i64 {
        (self.mapper)(tuple)
    }

    fn create_accumulator(&self) -> Self::Accumulator {
        AverageAccumulator { sum: 0, count: 0 }
    }
}

/// Running sum and count.
pub struct AverageAccumulator {
    sum: i128,
    count: i64,
}

impl Accumulator<i64, Option<Decimal>> for AverageAccumulator {
    #[inline]
    fn accumulate(&mut self, value: &i64) {
        self.sum += i128::from(*value);
        self.count += 1;
    }

    #[inline]
    fn retract(&mut self, value: &i64) {
        self.sum -= i128::from(*value);
        self.count -= 1;
    }

    fn finish(&self) -> Option<Decimal> {
        if self.count <= 0 {
            return None;
        }
        let sum = Decimal::try_from_i128_with_scale(self.sum, 0).ok()?;
        sum.checked_div(Decimal::from(self.count))
    }
}
