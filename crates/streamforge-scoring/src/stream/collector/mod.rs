// Collectors for group-by aggregation.
//
// Every collector is retractable: whatever `accumulate` adds, `retract` with
// the same extracted value takes away again, in any order.

mod average;
mod conditionally;
mod count;
mod erased;
mod load_balance;
mod min_max;
mod sum;
mod to_collection;
mod traits;


pub use average::{average, AverageAccumulator, AverageCollector};
pub use conditionally::{conditionally, ConditionalAccumulator, ConditionalCollector};
pub use count::{
    count, count_distinct, CountAccumulator, CountCollector, CountDistinctAccumulator,
    CountDistinctCollector,
};
pub(crate) use erased::{Container, Undo};
pub use erased::GroupCollector;
pub use load_balance::{load_balance, LoadBalance, LoadBalanceAccumulator, LoadBalanceCollector};
pub use min_max::{max, min, ExtremumAccumulator, ExtremumCollector};
pub use sum::{sum, SumAccumulator, SumCollector};
pub use to_collection::{
    to_list, to_set, ToListAccumulator, ToListCollector, ToSetAccumulator, ToSetCollector,
};
pub use traits::{Accumulator, Collector};
