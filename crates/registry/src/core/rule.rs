//! Conversion rules.
//!
//! # Role
//!
//! A [`ConversionRule`] pairs a runtime source check with a destination type, an
//! optional [`FormatPattern`] and an erased conversion callable. Typed
//! constructors capture the concrete source and destination types at
//! registration time, so lookup never needs generic reflection.
//!
//! # Invariants
//!
//! - A rule is immutable once constructed; registries share rules by `Arc`.
//! - The erased callable only ever receives values its [`SourceType`] accepted,
//!   and only ever produces values of its destination type.

use std::any::Any;
use std::fmt;

use super::error::BoxError;
use super::format::FormatPattern;
use super::value::{TypeKey, Value};

type ErasedConvert = dyn Fn(&Value, Option<&str>) -> Result<Value, BoxError> + Send + Sync;

/// Runtime capability answering "is this value an `S`?".
#[derive(Clone, Copy)]
pub struct SourceType {
	key: TypeKey,
	accepts: fn(&Value) -> bool,
}

impl SourceType {
	pub fn of<S: Any>() -> Self {
		Self {
			key: TypeKey::of::<S>(),
			accepts: Value::is::<S>,
		}
	}

	#[inline]
	pub fn accepts(&self, value: &Value) -> bool {
		(self.accepts)(value)
	}

	pub fn key(&self) -> TypeKey {
		self.key
	}
}

impl PartialEq for SourceType {
	fn eq(&self, other: &Self) -> bool {
		self.key == other.key
	}
}

impl Eq for SourceType {}

impl fmt::Debug for SourceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SourceType({})", self.key.name())
	}
}

/// A registered (source check, destination, format pattern, converter) tuple.
pub struct ConversionRule {
	source: SourceType,
	destination: TypeKey,
	format: Option<FormatPattern>,
	convert: Box<ErasedConvert>,
}

impl ConversionRule {
	/// Builds a rule whose converter ignores the requested format.
	pub fn simple<S, T, E, F>(format: Option<FormatPattern>, convert: F) -> Self
	where
		S: Any + Send + Sync,
		T: Any + Send + Sync,
		E: Into<BoxError>,
		F: Fn(&S) -> Result<T, E> + Send + Sync + 'static,
	{
		Self::formatted::<S, T, E, _>(format, move |source: &S, _format: Option<&str>| {
			convert(source)
		})
	}

	/// Builds a rule whose converter also receives the requested format string.
	pub fn formatted<S, T, E, F>(format: Option<FormatPattern>, convert: F) -> Self
	where
		S: Any + Send + Sync,
		T: Any + Send + Sync,
		E: Into<BoxError>,
		F: Fn(&S, Option<&str>) -> Result<T, E> + Send + Sync + 'static,
	{
		let erased: Box<ErasedConvert> =
			Box::new(move |value: &Value, format: Option<&str>| -> Result<Value, BoxError> {
				let source = value.downcast_ref::<S>().ok_or_else(|| SourceMismatch {
					expected: std::any::type_name::<S>(),
					actual: value.type_name(),
				})?;
				convert(source, format).map(Value::new).map_err(Into::into)
			});
		Self {
			source: SourceType::of::<S>(),
			destination: TypeKey::of::<T>(),
			format,
			convert: erased,
		}
	}

	pub fn source(&self) -> SourceType {
		self.source
	}

	pub fn destination(&self) -> TypeKey {
		self.destination
	}

	pub fn format(&self) -> Option<&FormatPattern> {
		self.format.as_ref()
	}

	/// Format policy: an absent pattern only matches an absent format, a present
	/// pattern only matches a present format it spans completely.
	pub fn matches_format(&self, format: Option<&str>) -> bool {
		match (&self.format, format) {
			(None, None) => true,
			(Some(pattern), Some(format)) => pattern.matches_fully(format),
			_ => false,
		}
	}

	/// Source check first, then format.
	pub fn matches(&self, value: &Value, format: Option<&str>) -> bool {
		self.source.accepts(value) && self.matches_format(format)
	}

	/// Runs the converter. Callers check [`Self::matches`] first.
	pub fn apply(&self, value: &Value, format: Option<&str>) -> Result<Value, BoxError> {
		(self.convert)(value, format)
	}

	/// Same destination, same source type and an equivalent (or equally absent)
	/// format pattern.
	pub(crate) fn shadows(&self, other: &Self) -> bool {
		self.destination == other.destination
			&& self.source == other.source
			&& match (&self.format, &other.format) {
				(None, None) => true,
				(Some(a), Some(b)) => a.is_equivalent(b),
				_ => false,
			}
	}
}

impl fmt::Debug for ConversionRule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConversionRule")
			.field("source", &self.source)
			.field("destination", &self.destination)
			.field("format", &self.format)
			.finish_non_exhaustive()
	}
}

/// Raised if an erased converter is handed a value its source check rejects.
#[derive(Debug, thiserror::Error)]
#[error("converter expects {expected}, got {actual}")]
pub struct SourceMismatch {
	pub expected: &'static str,
	pub actual: &'static str,
}
