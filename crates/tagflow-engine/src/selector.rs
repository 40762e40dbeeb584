//! Tag-based routing from elements to chains.

use std::collections::BTreeMap;
use std::sync::Arc;

use tagflow_model::{DataKind, Element, Notice};

use crate::error::EngineError;
use crate::step::{RoutedStep, Step};

/// Routes an element to exactly one registered chain by its tag.
///
/// The registry maps tag values to chains; the `None` key is the reserved
/// default standing for "no tag". Registering twice under the same tag replaces
/// the earlier chain.
pub struct Selector<V: DataKind, M> {
    id: Option<String>,
    chains: BTreeMap<Option<String>, Arc<dyn Step<V, M>>>,
}

impl<V: DataKind, M> Selector<V, M> {
    pub fn new() -> Self {
        Self {
            id: None,
            chains: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Register a chain under its own routing tag.
    pub fn with_chain(mut self, chain: impl RoutedStep<V, M> + 'static) -> Self {
        let tag = chain.route_tag().map(str::to_string);
        self.register(tag, chain);
        self
    }

    /// Register a chain under an explicit tag (`None` = default chain).
    ///
    /// Returns whether a previously registered chain was replaced.
    pub fn register(&mut self, tag: Option<String>, chain: impl Step<V, M> + 'static) -> bool {
        let replaced = self.chains.insert(tag.clone(), Arc::new(chain)).is_some();
        if replaced {
            tracing::warn!(
                selector = self.name_str(),
                ?tag,
                "selector has a one-to-one relation to chain tags; replacing previously registered chain"
            );
        }
        replaced
    }

    /// Resolve the chain for a tag.
    ///
    /// Decision table:
    /// - no tag, no default: `NoDefaultChain`
    /// - no tag, default registered: default chain
    /// - tag, no default: the tag's chain, or `ChainNotFound`
    /// - tag, default registered: the tag's chain, falling back to the default
    pub fn select(&self, tag: Option<&str>) -> Result<&Arc<dyn Step<V, M>>, EngineError> {
        let default = self.chains.get(&None);
        match (tag, default) {
            (None, None) => Err(EngineError::NoDefaultChain),
            (None, Some(chain)) => Ok(chain),
            (Some(tag), None) => {
                self.chains
                    .get(&Some(tag.to_string()))
                    .ok_or_else(|| EngineError::ChainNotFound {
                        tag: tag.to_string(),
                    })
            }
            (Some(tag), Some(default)) => {
                Ok(self.chains.get(&Some(tag.to_string())).unwrap_or(default))
            }
        }
    }

    fn name_str(&self) -> &str {
        self.id.as_deref().unwrap_or("selector")
    }
}

impl<V: DataKind, M> Default for Selector<V, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: DataKind, M> Clone for Selector<V, M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            chains: self.chains.clone(),
        }
    }
}

impl<V: DataKind, M> Step<V, M> for Selector<V, M> {
    fn name(&self) -> &str {
        self.name_str()
    }

    /// Route the element and run its chain. Routing failures and chain
    /// failures are downgraded to ERROR notices; a tag-resolution failure is
    /// suppressed entirely (the element already recorded its own notice) and
    /// only logged.
    fn apply(&self, element: &mut Element<V>, meta: &M) -> Result<(), EngineError> {
        let tag = match element.tag() {
            Ok(tag) => tag,
            Err(err) => {
                tracing::warn!(
                    selector = self.name_str(),
                    element = ?element.id,
                    error = %err,
                    "tag resolution failed; element left unrouted"
                );
                return Ok(());
            }
        };

        let chain = match self.select(tag.as_deref()) {
            Ok(chain) => chain,
            Err(err) if err.is_routing() => {
                element.push_notice(Notice::error(err.to_string()));
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        if let Err(err) = chain.apply(element, meta) {
            element.push_notice(Notice::error(format!(
                "chain '{}' failed: {err}",
                chain.name()
            )));
        }
        Ok(())
    }
}
