use std::fmt;

use super::value::{TypeKey, Value};

/// Error raised by a converter callable. Opaque to the registry.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Lifecycle state of a [`crate::ConversionRegistry`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RegistryState {
	/// Accepting registrations; conversions are rejected.
	#[default]
	Open,
	/// Frozen; conversions are allowed, registrations are rejected.
	Sealed,
}

impl fmt::Display for RegistryState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Open => write!(f, "open"),
			Self::Sealed => write!(f, "sealed"),
		}
	}
}

/// Errors returned by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
	/// The operation is not legal in the registry's current lifecycle state.
	#[error("cannot {operation} on a {state} conversion registry")]
	InvalidState {
		operation: &'static str,
		state: RegistryState,
	},

	/// No registered rule accepts the value and format. The value is handed back.
	#[error(
		"no converter from {} to {destination}{}",
		.value.type_name(),
		DisplayFormat(.format.as_deref())
	)]
	NoApplicableConverter {
		value: Value,
		destination: TypeKey,
		format: Option<String>,
	},

	/// The selected converter failed. The converter's error is carried as-is.
	#[error(transparent)]
	Conversion(BoxError),

	/// A rule for `destination` produced a value of another type.
	#[error("converter for {destination} produced a {produced}")]
	UnexpectedOutput {
		destination: TypeKey,
		produced: &'static str,
	},
}

impl ConvertError {
	pub fn is_invalid_state(&self) -> bool {
		matches!(self, Self::InvalidState { .. })
	}

	/// The converter's own error, when the failure came from a converter.
	pub fn conversion_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
		match self {
			Self::Conversion(err) => Some(err.as_ref()),
			_ => None,
		}
	}
}

struct DisplayFormat<'a>(Option<&'a str>);

impl fmt::Display for DisplayFormat<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0 {
			Some(format) => write!(f, " with format {format:?}"),
			None => Ok(()),
		}
	}
}
