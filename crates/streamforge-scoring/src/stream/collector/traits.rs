// Typed collector traits.

use crate::fact::FactValue;
use crate::tuple::Tuple;

/// A typed aggregation over the tuples of one group.
///
/// `extract` runs user code against a tuple and must not mutate anything;
/// the engine calls it for every collector of a group-by before touching any
/// accumulator, so a panicking extractor leaves every group intact.
pub trait Collector: Send + Sync + 'static {
    /// Value extracted from each tuple.
    type Value: Send + 'static;
    /// Finished aggregate, placed in the result tuple.
    type Result: FactValue;
    /// Mutable per-group state.
    type Accumulator: Accumulator<Self::Value, Self::Result>;

    fn extract(&self, tuple: &Tuple) -> Self::Value;

    fn create_accumulator(&self) -> Self::Accumulator;
}

/// Mutable, retractable aggregation state for one group.
pub trait Accumulator<V, R>: Send + 'static {
    fn accumulate(&mut self, value: &V);

    /// Reverses one earlier `accumulate` of an equal value.
    fn retract(&mut self, value: &V);

    fn finish(&self) -> R;
}
