//! Runtime shape fingerprints for values flowing through the pipeline.
//!
//! Step contracts never compare concrete values, only their kind: a
//! transformer declares the kind it produces, and a mutable step must leave
//! the kind of input and output untouched. Implementing [`DataKind`] for a
//! value type is all that is needed to run it through the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value type with an inspectable runtime shape.
pub trait DataKind {
    /// The shape fingerprint compared by step contracts. Its `Display` form
    /// appears in contract-error messages.
    type Kind: Clone + PartialEq + Eq + fmt::Debug + fmt::Display + Send + Sync;

    fn kind(&self) -> Self::Kind;
}

/// Shape of a [`serde_json::Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        };
        write!(f, "{name}")
    }
}

impl DataKind for serde_json::Value {
    type Kind = ValueKind;

    fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Array(_) => ValueKind::Array,
            Self::Object(_) => ValueKind::Object,
        }
    }
}
