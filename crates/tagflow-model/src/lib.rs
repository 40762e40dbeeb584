pub mod element;
pub mod kind;
pub mod notice;
pub mod result;

pub use element::{Element, Tag, TagError, TagResolver};
pub use kind::{DataKind, ValueKind};
pub use notice::{Level, Notice};
pub use result::RunResult;
