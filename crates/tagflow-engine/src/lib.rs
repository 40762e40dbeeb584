pub mod chain;
pub mod error;
pub mod parallel;
pub mod process;
pub mod selector;
pub mod step;
pub mod transform;
pub mod verify;

pub use chain::{AllChain, AnyChain};
pub use error::{EngineError, VerificationFailure};
pub use parallel::distribute;
pub use process::Process;
pub use selector::Selector;
pub use step::{RoutedStep, Step};
pub use transform::{Mutable, MutateFn, OutputContract, TransformFn, Transformer};
pub use verify::{Verifier, VerifyFn};
