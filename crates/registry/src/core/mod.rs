//! Rule storage, lifecycle and dispatch.

pub mod collision;
pub mod error;
pub mod format;
pub mod registry;
pub mod rule;
pub mod value;

pub use collision::RuleConflict;
pub use error::{BoxError, ConvertError, RegistryState};
pub use format::{AnchoredRegex, FormatPattern};
pub use registry::ConversionRegistry;
pub use rule::{ConversionRule, SourceMismatch, SourceType};
pub use value::{TypeKey, Value};

#[cfg(test)]
mod tests;
