//! Type-erased facts.
//!
//! A [`Fact`] wraps any `Debug + Eq + Hash + Send + Sync + 'static` value
//! behind an `Arc`, so tuples can hold facts of different domain types and
//! still be cloned, hashed and compared.
//!
//! Facts inserted through a session carry a [`FactId`] and compare by that
//! identity. Facts produced inside the pipeline (group keys, collector
//! results, mapped values) compare structurally.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a fact inserted into a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactId(pub(crate) u64);

impl FactId {
    /// Returns the raw identifier.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Object-safe view of a value that can live inside a [`Fact`].
///
/// Implemented for every `T: Debug + Eq + Hash + Send + Sync + 'static`.
pub trait FactValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn FactValue) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
    fn type_name(&self) -> &'static str;
}

impl<T> FactValue for T
where
    T: fmt::Debug + Eq + Hash + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn FactValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A cheap-to-clone, type-erased domain value.
///
/// # Example
///
/// ```
/// use streamforge_scoring::Fact;
///
/// let a = Fact::new(7i64);
/// let b = Fact::new(7i64);
/// assert_eq!(a, b);
/// assert_eq!(a.downcast_ref::<i64>(), Some(&7));
/// assert!(a.downcast_ref::<i32>().is_none());
///
/// // Wrapping a fact again yields the same fact.
/// assert_eq!(Fact::new(a.clone()), a);
/// ```
#[derive(Clone)]
pub struct Fact {
    id: Option<FactId>,
    value: Arc<dyn FactValue>,
}

impl Fact {
    /// Wraps a derived value. Values that already are a `Fact` are returned as is.
    pub fn new<T: FactValue>(value: T) -> Self {
        if let Some(fact) = (&value as &dyn Any).downcast_ref::<Fact>() {
            return fact.clone();
        }
        Self {
            id: None,
            value: Arc::new(value),
        }
    }

    pub(crate) fn with_id<T: FactValue>(id: FactId, value: T) -> Self {
        Self {
            id: Some(id),
            value: Arc::new(value),
        }
    }

    /// Returns the session identity, or `None` for derived facts.
    pub fn id(&self) -> Option<FactId> {
        self.id
    }

    /// Returns the wrapped value if it is a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.as_any().downcast_ref::<T>()
    }

    /// Returns true if the wrapped value is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.value.as_any().is::<T>()
    }

    /// Returns the wrapped value as a `T`.
    ///
    /// # Panics
    ///
    /// Panics if the wrapped value is not a `T`. Inside pipeline closures the
    /// panic poisons the session instead of unwinding past it.
    pub fn value<T: 'static>(&self) -> &T {
        match self.downcast_ref::<T>() {
            Some(value) => value,
            None => panic!(
                "fact {:?} is a {}, not a {}",
                self,
                self.value.type_name(),
                std::any::type_name::<T>()
            ),
        }
    }

    /// Returns the Rust type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.value.type_name()
    }

    /// Returns the [`TypeId`] of the wrapped value.
    pub fn value_type_id(&self) -> TypeId {
        self.value.as_any().type_id()
    }
}

impl PartialEq for Fact {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.value.dyn_eq(other.value.as_ref()),
            _ => false,
        }
    }
}

impl Eq for Fact {}

impl Hash for Fact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.id {
            Some(id) => {
                0u8.hash(state);
                id.hash(state);
            }
            None => {
                1u8.hash(state);
                self.value.dyn_hash(state);
            }
        }
    }
}

impl fmt::Debug for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.value.as_ref(), f)
    }
}
