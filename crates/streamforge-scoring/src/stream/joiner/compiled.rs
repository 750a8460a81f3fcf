// Validated, merged joiners of one join or exists call.

use smallvec::SmallVec;

use super::{DynKeyFn, DynPairPredicate, Joiner};
use crate::fact::Fact;
use crate::tuple::Tuple;
use streamforge_core::{Result, StreamForgeError};

/// Composite index key. Empty for cartesian matching.
pub(crate) type JoinKey = SmallVec<[Fact; 2]>;

/// Consecutive indexing joiners merged into one composite key extractor per
/// side, followed by consecutive filtering joiners merged into one conjunction.
pub(crate) struct CompiledJoiners {
    left_keys: Vec<DynKeyFn>,
    right_keys: Vec<DynKeyFn>,
    filters: Vec<DynPairPredicate>,
}

impl CompiledJoiners {
    pub(crate) fn compile(joiners: impl IntoIterator<Item = Joiner>) -> Result<Self> {
        let joiners: Vec<Joiner> = joiners.into_iter().collect();
        let mut compiled = CompiledJoiners::cartesian();

        let count = joiners.len();
        let mut first_filter: Option<usize> = None;
        for (position, joiner) in joiners.into_iter().enumerate() {
            match joiner {
                Joiner::Equal { left, right } => {
                    if let Some(filter_position) = first_filter {
                        return Err(StreamForgeError::InvalidJoiner(format!(
                            "indexing joiner at position {} follows filtering joiner at position {}",
                            position, filter_position
                        )));
                    }
                    compiled.left_keys.push(left);
                    compiled.right_keys.push(right);
                }
                Joiner::Filtering(predicate) => {
                    first_filter.get_or_insert(position);
                    compiled.filters.push(predicate);
                }
                Joiner::None if count == 1 => {}
                Joiner::None => {
                    return Err(StreamForgeError::InvalidJoiner(format!(
                        "none() cannot be combined with other joiners ({} given)",
                        count
                    )));
                }
            }
        }
        Ok(compiled)
    }

    /// Matches every pair; used in place of joiners that failed validation.
    pub(crate) fn cartesian() -> Self {
        CompiledJoiners {
            left_keys: Vec::new(),
            right_keys: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Appends a predicate after every user joiner.
    pub(crate) fn and_filter(mut self, predicate: DynPairPredicate) -> Self {
        self.filters.push(predicate);
        self
    }

    #[inline]
    pub(crate) fn left_key(&self, left: &Tuple) -> JoinKey {
        self.left_keys.iter().map(|k| k(left)).collect()
    }

    #[inline]
    pub(crate) fn right_key(&self, right: &Tuple) -> JoinKey {
        self.right_keys.iter().map(|k| k(right)).collect()
    }

    #[inline]
    pub(crate) fn accepts(&self, left: &Tuple, right: &Tuple) -> bool {
        self.filters.iter().all(|f| f(left, right))
    }

    pub(crate) fn is_indexed(&self) -> bool {
        !self.left_keys.is_empty()
    }

    pub(crate) fn describe(&self) -> String {
        format!(
            "{} key(s), {} filter(s)",
            self.left_keys.len(),
            self.filters.len()
        )
    }
}
