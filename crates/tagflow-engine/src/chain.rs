//! Ordered composition of steps with two failure semantics.
//!
//! An [`AllChain`] requires every step to succeed, in order; the first
//! failure propagates and skips the rest. An [`AnyChain`] requires only one:
//! steps are tried in order, the first success wins, and only a total failure
//! is reported, as one ERROR notice per failed attempt.

use std::sync::Arc;

use tagflow_model::{DataKind, Element, Notice};

use crate::error::EngineError;
use crate::step::{RoutedStep, Step};

/// A chain where all steps must succeed.
pub struct AllChain<V: DataKind, M> {
    id: Option<String>,
    tag: Option<String>,
    steps: Vec<Arc<dyn Step<V, M>>>,
}

impl<V: DataKind, M> AllChain<V, M> {
    pub fn new() -> Self {
        Self {
            id: None,
            tag: None,
            steps: Vec::new(),
        }
    }

    /// A chain registered under the given routing tag.
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            id: None,
            tag: Some(tag.into()),
            steps: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn step(mut self, step: impl Step<V, M> + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }
}

impl<V: DataKind, M> Default for AllChain<V, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: DataKind, M> Step<V, M> for AllChain<V, M> {
    fn name(&self) -> &str {
        self.id.as_deref().unwrap_or("all-chain")
    }

    fn apply(&self, element: &mut Element<V>, meta: &M) -> Result<(), EngineError> {
        for step in &self.steps {
            step.apply(element, meta)?;
        }
        Ok(())
    }
}

impl<V: DataKind, M> RoutedStep<V, M> for AllChain<V, M> {
    fn route_tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

/// A chain where the first succeeding step wins.
pub struct AnyChain<V: DataKind, M> {
    id: Option<String>,
    tag: Option<String>,
    steps: Vec<Arc<dyn Step<V, M>>>,
}

impl<V: DataKind, M> AnyChain<V, M> {
    pub fn new() -> Self {
        Self {
            id: None,
            tag: None,
            steps: Vec::new(),
        }
    }

    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            id: None,
            tag: Some(tag.into()),
            steps: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn step(mut self, step: impl Step<V, M> + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }
}

impl<V: DataKind, M> Default for AnyChain<V, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, M> Step<V, M> for AnyChain<V, M>
where
    V: DataKind + Clone,
{
    fn name(&self) -> &str {
        self.id.as_deref().unwrap_or("any-chain")
    }

    /// Try each step on an isolated clone of the element; commit the first
    /// success. A failed attempt leaves no trace on the live element, so a
    /// total failure returns the element exactly as it entered, carrying one
    /// ERROR notice per attempt. An empty chain succeeds without notices.
    fn apply(&self, element: &mut Element<V>, meta: &M) -> Result<(), EngineError> {
        let mut failures = Vec::new();
        for step in &self.steps {
            let mut attempt = element.clone();
            match step.apply(&mut attempt, meta) {
                Ok(()) => {
                    *element = attempt;
                    return Ok(());
                }
                Err(err) => failures.push(err),
            }
        }
        for (index, err) in failures.iter().enumerate() {
            element.push_notice(Notice::error(format!(
                "chain '{}' step {index} failed: {err}",
                self.name()
            )));
        }
        Ok(())
    }
}

impl<V, M> RoutedStep<V, M> for AnyChain<V, M>
where
    V: DataKind + Clone,
{
    fn route_tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}
