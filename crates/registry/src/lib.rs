//! Pluggable type-conversion registry.
//!
//! Decodes loosely typed values (strings, numbers) into strongly typed ones by
//! looking up a converter for the requested destination type, the runtime type
//! of the input and an optional format discriminator.
//!
//! # Modules
//!
//! - [`core`] - rule storage, sealing lifecycle and dispatch
//! - [`builtins`] - the default rule set and the shared [`DEFAULTS`] registry
//!
//! # Example
//!
//! ```
//! use coerce_registry::{ConversionRegistry, FormatPattern, Value};
//!
//! let mut registry = ConversionRegistry::new();
//! registry
//! 	.register(Some(FormatPattern::exact("len")), |s: &String| {
//! 		Ok::<_, std::convert::Infallible>(s.len())
//! 	})
//! 	.unwrap();
//! registry.seal();
//!
//! let len: usize = registry.convert(Value::new("four".to_string()), Some("len")).unwrap();
//! assert_eq!(len, 4);
//! ```

pub mod core;

#[cfg(feature = "builtins")]
pub mod builtins;

#[cfg(feature = "builtins")]
pub use builtins::{BuiltinConfig, DEFAULTS, register_builtins};
pub use crate::core::{
	BoxError, ConversionRegistry, ConversionRule, ConvertError, FormatPattern, RegistryState,
	RuleConflict, SourceType, TypeKey, Value,
};
