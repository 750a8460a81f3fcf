// Type-erased collectors as stored in a group-by node.

use std::any::Any;
use std::marker::PhantomData;

use super::{Accumulator, Collector};
use crate::fact::Fact;
use crate::tuple::Tuple;
use streamforge_core::{Result, StreamForgeError};

pub(crate) type Extracted = Box<dyn Any + Send>;

/// Reverse operation for one accumulate call.
///
/// Owns the extracted value so the retraction never re-runs user code against
/// a fact that may have changed since. Consumed by [`Container::undo`].
pub(crate) struct Undo(Extracted);

pub(crate) trait ErasedCollector: Send + Sync {
    fn extract(&self, tuple: &Tuple) -> Extracted;

    fn supply(&self) -> Box<dyn Container>;

    /// False for the no-op collector of a pure regrouping.
    fn produces_result(&self) -> bool {
        true
    }
}

pub(crate) trait Container: Send {
    fn accumulate(&mut self, value: Extracted) -> Result<Undo>;

    fn undo(&mut self, undo: Undo) -> Result<()>;

    fn finish(&self) -> Option<Fact>;
}

/// A collector ready to be handed to `group_by`.
///
/// Any [`Collector`] converts into one with `.into()`.
pub struct GroupCollector(pub(crate) Box<dyn ErasedCollector>);

impl GroupCollector {
    pub(crate) fn noop() -> Self {
        GroupCollector(Box::new(NoopCollector))
    }

    pub(crate) fn produces_result(&self) -> bool {
        self.0.produces_result()
    }
}

impl<C: Collector> From<C> for GroupCollector {
    fn from(collector: C) -> Self {
        GroupCollector(Box::new(Erased(collector)))
    }
}

struct Erased<C>(C);

impl<C: Collector> ErasedCollector for Erased<C> {
    fn extract(&self, tuple: &Tuple) -> Extracted {
        Box::new(self.0.extract(tuple))
    }

    fn supply(&self) -> Box<dyn Container> {
        Box::new(AccumulatorContainer::<C> {
            accumulator: self.0.create_accumulator(),
            _phantom: PhantomData,
        })
    }
}

struct AccumulatorContainer<C: Collector> {
    accumulator: C::Accumulator,
    _phantom: PhantomData<fn() -> C>,
}

impl<C: Collector> AccumulatorContainer<C> {
    fn downcast(value: Extracted) -> Result<Box<C::Value>> {
        value.downcast::<C::Value>().map_err(|_| {
            StreamForgeError::Internal(format!(
                "collector received a value that is not a {}",
                std::any::type_name::<C::Value>()
            ))
        })
    }
}

impl<C: Collector> Container for AccumulatorContainer<C> {
    fn accumulate(&mut self, value: Extracted) -> Result<Undo> {
        let value = Self::downcast(value)?;
        self.accumulator.accumulate(&value);
        Ok(Undo(value))
    }

    fn undo(&mut self, undo: Undo) -> Result<()> {
        let value = Self::downcast(undo.0)?;
        self.accumulator.retract(&value);
        Ok(())
    }

    fn finish(&self) -> Option<Fact> {
        Some(Fact::new(self.accumulator.finish()))
    }
}

struct NoopCollector;

impl ErasedCollector for NoopCollector {
    fn extract(&self, _tuple: &Tuple) -> Extracted {
        Box::new(())
    }

    fn supply(&self) -> Box<dyn Container> {
        Box::new(NoopContainer)
    }

    fn produces_result(&self) -> bool {
        false
    }
}

struct NoopContainer;

impl Container for NoopContainer {
    fn accumulate(&mut self, value: Extracted) -> Result<Undo> {
        Ok(Undo(value))
    }

    fn undo(&mut self, _undo: Undo) -> Result<()> {
        Ok(())
    }

    fn finish(&self) -> Option<Fact> {
        None
    }
}
