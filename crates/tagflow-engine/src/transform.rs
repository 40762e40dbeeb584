//! The two step contracts: structure-changing and data-preserving.
//!
//! A [`Transformer`] changes the structure, not the data in place: it reads
//! `input` and the current `output` and produces a new `output`, checked
//! against a declared [`OutputContract`]. A [`Mutable`] changes the data, not
//! the structure: it rewrites the element in place and must leave the kind of
//! both `input` and `output` untouched.

use std::fmt;

use tagflow_model::{DataKind, Element};

use crate::error::EngineError;
use crate::step::Step;

/// Declared output shape of a transformer, checked after every call.
///
/// This replaces runtime reflection on return annotations: the contract is
/// stated once at registration and enforced structurally per produced value.
/// `Any` is the supertype admitting every kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputContract<K> {
    Any,
    Exactly(K),
}

impl<K: PartialEq + fmt::Display> OutputContract<K> {
    pub fn admits(&self, kind: &K) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(expected) => expected == kind,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Any => "any kind".to_string(),
            Self::Exactly(expected) => expected.to_string(),
        }
    }
}

/// Function contract of a transformer: `(input, previous output, meta)` to a
/// new output value.
pub type TransformFn<V, M> =
    dyn Fn(&V, Option<&V>, &M) -> anyhow::Result<V> + Send + Sync;

/// A step that replaces `element.output` and leaves `element.input` alone.
pub struct Transformer<V: DataKind, M> {
    name: String,
    contract: OutputContract<V::Kind>,
    run: Box<TransformFn<V, M>>,
}

impl<V: DataKind, M> Transformer<V, M> {
    pub fn new<F>(name: impl Into<String>, contract: OutputContract<V::Kind>, run: F) -> Self
    where
        F: Fn(&V, Option<&V>, &M) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            contract,
            run: Box::new(run),
        }
    }
}

impl<V: DataKind, M> Step<V, M> for Transformer<V, M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, element: &mut Element<V>, meta: &M) -> Result<(), EngineError> {
        let produced = (self.run)(&element.input, element.output.as_ref(), meta).map_err(
            |source| EngineError::Step {
                step: self.name.clone(),
                source,
            },
        )?;
        let kind = produced.kind();
        // The produced value is assigned before the contract check, so a
        // violation leaves it observable to the error handler.
        element.output = Some(produced);
        if !self.contract.admits(&kind) {
            return Err(EngineError::OutputContract {
                step: self.name.clone(),
                expected: self.contract.describe(),
                actual: kind.to_string(),
            });
        }
        Ok(())
    }
}

/// Function contract of a mutable: rewrites the element in place.
pub type MutateFn<V, M> = dyn Fn(&mut Element<V>, &M) -> anyhow::Result<()> + Send + Sync;

/// A step that may rewrite `input` and `output` but must preserve the kind of
/// both.
pub struct Mutable<V: DataKind, M> {
    name: String,
    run: Box<MutateFn<V, M>>,
}

impl<V: DataKind, M> Mutable<V, M> {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut Element<V>, &M) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(run),
        }
    }
}

impl<V: DataKind, M> Step<V, M> for Mutable<V, M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, element: &mut Element<V>, meta: &M) -> Result<(), EngineError> {
        // Pre-call baseline. Contracts compare kinds, not values, so the
        // snapshot is the shape fingerprint rather than a deep copy.
        let input_before = element.input.kind();
        let output_before = element.output.as_ref().map(DataKind::kind);

        (self.run)(element, meta).map_err(|source| EngineError::Step {
            step: self.name.clone(),
            source,
        })?;

        let input_after = element.input.kind();
        if input_before != input_after {
            return Err(EngineError::InputKindChanged {
                step: self.name.clone(),
                before: input_before.to_string(),
                after: input_after.to_string(),
            });
        }
        let output_after = element.output.as_ref().map(DataKind::kind);
        if output_before != output_after {
            return Err(EngineError::OutputKindChanged {
                step: self.name.clone(),
                before: kind_label(output_before.as_ref()),
                after: kind_label(output_after.as_ref()),
            });
        }
        Ok(())
    }
}

fn kind_label<K: fmt::Display>(kind: Option<&K>) -> String {
    match kind {
        Some(kind) => kind.to_string(),
        None => "absent".to_string(),
    }
}
