//! The single capability shared by every pipeline building block.
//!
//! Transformers, mutables, verifiers, chains, and selectors all implement
//! [`Step`], so any of them can appear anywhere in a chain's ordered step
//! list, including nested chains and embedded selectors.

use tagflow_model::{DataKind, Element};

use crate::error::EngineError;

/// One verified transformation step applied to an element in place.
pub trait Step<V: DataKind, M>: Send + Sync {
    /// Human-readable name, used in notices and logs.
    fn name(&self) -> &str;

    /// Apply this step to the element. The element is mutated in place; an
    /// `Err` leaves whatever partial mutation the step performed visible to
    /// the caller, which decides whether the failure is fatal.
    fn apply(&self, element: &mut Element<V>, meta: &M) -> Result<(), EngineError>;
}

/// A step carrying a routing tag, registrable with a selector.
pub trait RoutedStep<V: DataKind, M>: Step<V, M> {
    /// Tag under which the step is registered; `None` means the default
    /// chain.
    fn route_tag(&self) -> Option<&str>;
}
