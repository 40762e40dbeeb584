//! Post-condition wrapper around a transformation step.

use tagflow_model::{DataKind, Element, Notice};

use crate::error::{EngineError, VerificationFailure};
use crate::step::Step;

/// Verifier function contract: inspect the element after the wrapped step and
/// return a [`VerificationFailure`] to flag a soft failure.
pub type VerifyFn<V, M> = dyn Fn(&Element<V>, &M) -> anyhow::Result<()> + Send + Sync;

/// Wraps a step with a post-condition check.
///
/// The wrapped step runs first with its normal contract and failure rules. A
/// [`VerificationFailure`] from the verifier function is converted to an
/// ERROR notice on the element; any other verifier error propagates
/// unmodified.
pub struct Verifier<V: DataKind, M> {
    name: String,
    inner: Box<dyn Step<V, M>>,
    check: Box<VerifyFn<V, M>>,
}

impl<V: DataKind, M> Verifier<V, M> {
    pub fn new<S, F>(inner: S, check: F) -> Self
    where
        S: Step<V, M> + 'static,
        F: Fn(&Element<V>, &M) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: format!("verify:{}", inner.name()),
            inner: Box::new(inner),
            check: Box::new(check),
        }
    }
}

impl<V: DataKind, M> Step<V, M> for Verifier<V, M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, element: &mut Element<V>, meta: &M) -> Result<(), EngineError> {
        self.inner.apply(element, meta)?;

        if let Err(err) = (self.check)(element, meta) {
            if err.downcast_ref::<VerificationFailure>().is_some() {
                element.push_notice(Notice::error(format!("verifier rejected element: {err}")));
            } else {
                return Err(EngineError::Step {
                    step: self.name.clone(),
                    source: err,
                });
            }
        }
        Ok(())
    }
}
