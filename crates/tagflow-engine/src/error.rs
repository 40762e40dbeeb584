use std::time::Duration;

use thiserror::Error;

/// Unified error model of the engine.
///
/// Contract and routing errors are raised by the engine itself; business
/// failures from user-supplied functions surface as [`EngineError::Step`]
/// with the original error as source. Which layer absorbs an error (verifier,
/// any-chain, selector) is decided by the enclosing composition, never here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A transformer produced a value outside its declared output contract.
    #[error("step '{step}' produced output of kind {actual}, but its contract declares {expected}")]
    OutputContract {
        step: String,
        expected: String,
        actual: String,
    },

    /// A mutable step changed the kind of the element input.
    #[error("mutable step '{step}' changed the input kind: had {before}, got {after}")]
    InputKindChanged {
        step: String,
        before: String,
        after: String,
    },

    /// A mutable step changed the kind of the element output.
    #[error("mutable step '{step}' changed the output kind: had {before}, got {after}")]
    OutputKindChanged {
        step: String,
        before: String,
        after: String,
    },

    /// An untagged element reached a selector with no default chain.
    #[error("no default chain registered")]
    NoDefaultChain,

    /// A tagged element reached a selector that knows neither its tag nor a
    /// default.
    #[error("chain not registered for tag '{tag}'")]
    ChainNotFound { tag: String },

    /// A user-supplied function failed.
    #[error("step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: anyhow::Error,
    },

    /// The parallel join deadline elapsed before every worker reported back.
    #[error("parallel run timed out after {timeout:?} with {outstanding} worker(s) outstanding")]
    Timeout {
        timeout: Duration,
        outstanding: usize,
    },

    /// A worker could not be spawned or died before producing a result.
    #[error("worker {index} failed: {message}")]
    Worker { index: usize, message: String },

    /// The result channel closed while results were still outstanding.
    #[error("parallel run aborted: worker channel closed with {outstanding} result(s) outstanding")]
    ChannelClosed { outstanding: usize },
}

impl EngineError {
    /// Whether this is a routing error, the only kind a selector downgrades
    /// to a notice by name.
    pub fn is_routing(&self) -> bool {
        matches!(self, Self::NoDefaultChain | Self::ChainNotFound { .. })
    }
}

/// The dedicated soft-failure kind for verifier functions.
///
/// A verifier function returning this error (wrapped in `anyhow::Error`)
/// signals a verification failure that is downgraded to an ERROR notice on
/// the element; any other error kind from a verifier propagates unmodified.
#[derive(Debug, Error)]
#[error("verification failed: {0}")]
pub struct VerificationFailure(pub String);

impl VerificationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
