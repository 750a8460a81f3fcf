//! Fixed-arity fact tuples, the unit of propagation.

use std::fmt;

use smallvec::SmallVec;

use crate::fact::Fact;

/// Largest tuple arity a pipeline may produce.
pub const MAX_ARITY: usize = 4;

/// Session-unique identity of one emitted tuple.
///
/// Downstream bookkeeping (undo tokens, match maps, contributions) is keyed
/// by this id rather than by tuple contents, so two structurally equal tuples
/// from different upstream combinations stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TupleId(u64);

impl fmt::Display for TupleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Allocates tuple ids for one session.
#[derive(Debug, Default)]
pub(crate) struct TupleIds {
    next: u64,
}

impl TupleIds {
    pub(crate) fn next(&mut self) -> TupleId {
        let id = TupleId(self.next);
        self.next += 1;
        id
    }
}

/// An ordered, fixed-length sequence of 1 to 4 facts.
///
/// Equality is positional: two tuples are equal when their facts are equal
/// position by position.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Tuple {
    facts: SmallVec<[Fact; MAX_ARITY]>,
}

impl Tuple {
    pub(crate) fn of(facts: SmallVec<[Fact; MAX_ARITY]>) -> Self {
        debug_assert!(!facts.is_empty() && facts.len() <= MAX_ARITY);
        Self { facts }
    }

    pub(crate) fn single(fact: Fact) -> Self {
        let mut facts = SmallVec::new();
        facts.push(fact);
        Self { facts }
    }

    /// Builds a tuple from derived values; intended for tests and tooling.
    ///
    /// # Panics
    ///
    /// Panics if `facts` is empty or holds more than four facts.
    pub fn from_facts(facts: impl IntoIterator<Item = Fact>) -> Self {
        let facts: SmallVec<[Fact; MAX_ARITY]> = facts.into_iter().collect();
        assert!(
            !facts.is_empty() && facts.len() <= MAX_ARITY,
            "tuple arity must be 1..={}, got {}",
            MAX_ARITY,
            facts.len()
        );
        Self { facts }
    }

    /// Returns a new tuple with `fact` appended.
    pub(crate) fn extended(&self, fact: &Fact) -> Self {
        let mut facts = self.facts.clone();
        facts.push(fact.clone());
        Self::of(facts)
    }

    /// Returns the leading facts plus `last`, replacing the final position.
    pub(crate) fn with_last(&self, last: Fact) -> Self {
        let mut facts = self.facts.clone();
        facts.pop();
        facts.push(last);
        Self::of(facts)
    }

    /// Number of facts in this tuple.
    pub fn arity(&self) -> usize {
        self.facts.len()
    }

    /// All facts, in position order.
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// The fact at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= arity()`.
    pub fn fact(&self, index: usize) -> &Fact {
        &self.facts[index]
    }

    /// The last fact.
    pub fn last(&self) -> &Fact {
        &self.facts[self.facts.len() - 1]
    }

    /// The value at `index` if it is a `T`.
    pub fn try_get<T: 'static>(&self, index: usize) -> Option<&T> {
        self.facts.get(index).and_then(|f| f.downcast_ref::<T>())
    }

    /// The value at `index` as a `T`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or the value is not a `T`.
    pub fn get<T: 'static>(&self, index: usize) -> &T {
        self.fact(index).value::<T>()
    }

    /// First value as a `T`.
    pub fn a<T: 'static>(&self) -> &T {
        self.get(0)
    }

    /// Second value as a `T`.
    pub fn b<T: 'static>(&self) -> &T {
        self.get(1)
    }

    /// Third value as a `T`.
    pub fn c<T: 'static>(&self) -> &T {
        self.get(2)
    }

    /// Fourth value as a `T`.
    pub fn d<T: 'static>(&self) -> &T {
        self.get(3)
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut t = f.debug_tuple("");
        for fact in &self.facts {
            t.field(fact);
        }
        t.finish()
    }
}

/// A change flowing along one edge of the node graph.
#[derive(Debug, Clone)]
pub(crate) enum Delta {
    Insert(TupleId, Tuple),
    Retract(TupleId),
}
