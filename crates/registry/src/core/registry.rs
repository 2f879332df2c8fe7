//! The conversion registry.
//!
//! # Mental Model
//!
//! 1. **Open:** rules are appended per destination type. Nothing can be
//!    converted yet.
//! 2. **Sealed:** the rule pool is frozen and lookups become legal. Sealing is
//!    one-way and idempotent.
//!
//! # Precedence Contract
//!
//! Lookup walks a destination's rules newest first; the first rule whose source
//! check and format pattern both accept the request wins. Registering after
//! construction therefore overrides the defaults without removing them.
//!
//! # Invariants
//!
//! - Rules are only ever appended, never removed or reordered.
//! - `register*` is rejected once sealed, `convert*` is rejected until sealed.
//! - A value already of the destination type is returned as-is.

use std::any::Any;
use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;

use super::collision::RuleConflict;
use super::error::{BoxError, ConvertError, RegistryState};
use super::format::FormatPattern;
use super::rule::ConversionRule;
use super::value::{TypeKey, Value};

/// Maps (runtime source type, optional format) to a converter, per destination type.
#[derive(Default)]
pub struct ConversionRegistry {
	rules: HashMap<TypeKey, Vec<Arc<ConversionRule>>>,
	state: RegistryState,
	conflicts: Vec<RuleConflict>,
}

impl ConversionRegistry {
	/// Creates an empty, open registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an open registry holding the same rules as `other`.
	///
	/// The rule lists are copied, the rules themselves are shared. Registering
	/// on either registry afterwards does not affect the other.
	pub fn from_registry(other: &ConversionRegistry) -> Self {
		Self {
			rules: other.rules.clone(),
			state: RegistryState::Open,
			conflicts: other.conflicts.clone(),
		}
	}

	/// Registers a converter that ignores the requested format.
	pub fn register<S, T, E, F>(
		&mut self,
		format: Option<FormatPattern>,
		convert: F,
	) -> Result<(), ConvertError>
	where
		S: Any + Send + Sync,
		T: Any + Send + Sync,
		E: Into<BoxError>,
		F: Fn(&S) -> Result<T, E> + Send + Sync + 'static,
	{
		self.ensure_open()?;
		self.insert(ConversionRule::simple::<S, T, E, F>(format, convert));
		Ok(())
	}

	/// Registers a converter that receives the requested format string.
	pub fn register_formatted<S, T, E, F>(
		&mut self,
		format: Option<FormatPattern>,
		convert: F,
	) -> Result<(), ConvertError>
	where
		S: Any + Send + Sync,
		T: Any + Send + Sync,
		E: Into<BoxError>,
		F: Fn(&S, Option<&str>) -> Result<T, E> + Send + Sync + 'static,
	{
		self.ensure_open()?;
		self.insert(ConversionRule::formatted::<S, T, E, F>(format, convert));
		Ok(())
	}

	/// Appends a prebuilt rule.
	pub fn register_rule(&mut self, rule: ConversionRule) -> Result<(), ConvertError> {
		self.ensure_open()?;
		self.insert(rule);
		Ok(())
	}

	fn ensure_open(&self) -> Result<(), ConvertError> {
		match self.state {
			RegistryState::Open => Ok(()),
			state => Err(ConvertError::InvalidState {
				operation: "register",
				state,
			}),
		}
	}

	fn insert(&mut self, rule: ConversionRule) {
		let rules = self.rules.entry(rule.destination()).or_default();
		let winner = rules.len();
		if let Some(shadowed) = rules.iter().rposition(|existing| rule.shadows(existing)) {
			let conflict = RuleConflict {
				destination: rule.destination(),
				source: rule.source().key(),
				format: rule.format().cloned(),
				shadowed,
				winner,
			};
			tracing::warn!(%conflict, "conversion rule overrides an earlier registration");
			self.conflicts.push(conflict);
		}
		rules.push(Arc::new(rule));
	}

	/// Freezes the registry. Calling it again is a no-op.
	pub fn seal(&mut self) {
		if self.state == RegistryState::Sealed {
			return;
		}
		self.state = RegistryState::Sealed;
		tracing::debug!(
			rules = self.len(),
			destinations = self.rules.len(),
			"conversion registry sealed"
		);
	}

	/// Builder-style [`Self::seal`].
	pub fn sealed(mut self) -> Self {
		self.seal();
		self
	}

	pub fn state(&self) -> RegistryState {
		self.state
	}

	pub fn is_sealed(&self) -> bool {
		self.state == RegistryState::Sealed
	}

	/// Converts `value` into a `T`.
	pub fn convert<T: Any + Send + Sync>(
		&self,
		value: Value,
		format: Option<&str>,
	) -> Result<T, ConvertError> {
		let destination = TypeKey::of::<T>();
		self.convert_value(value, destination, format)?
			.downcast::<T>()
			.map_err(|produced| ConvertError::UnexpectedOutput {
				destination,
				produced: produced.type_name(),
			})
	}

	/// Converts `value` into the type identified by `destination`.
	pub fn convert_value(
		&self,
		value: Value,
		destination: TypeKey,
		format: Option<&str>,
	) -> Result<Value, ConvertError> {
		if !self.is_sealed() {
			return Err(ConvertError::InvalidState {
				operation: "convert",
				state: self.state,
			});
		}
		if value.type_key() == destination {
			return Ok(value);
		}
		match self.find_rule(&value, destination, format) {
			Some(rule) => rule.apply(&value, format).map_err(ConvertError::Conversion),
			None => Err(ConvertError::NoApplicableConverter {
				value,
				destination,
				format: format.map(str::to_owned),
			}),
		}
	}

	/// The rule `convert` would select, ignoring the already-typed fast path.
	pub fn find_rule(
		&self,
		value: &Value,
		destination: TypeKey,
		format: Option<&str>,
	) -> Option<&ConversionRule> {
		self.rules
			.get(&destination)?
			.iter()
			.rev()
			.find(|rule| rule.matches(value, format))
			.map(Arc::as_ref)
	}

	/// True if `convert` would reach a converter (or the fast path) for this request.
	pub fn can_convert(&self, value: &Value, destination: TypeKey, format: Option<&str>) -> bool {
		value.type_key() == destination || self.find_rule(value, destination, format).is_some()
	}

	/// Rules registered for `destination`, oldest first.
	pub fn rules_for(&self, destination: TypeKey) -> impl Iterator<Item = &ConversionRule> {
		self.rules
			.get(&destination)
			.into_iter()
			.flatten()
			.map(Arc::as_ref)
	}

	/// Total number of registered rules.
	pub fn len(&self) -> usize {
		self.rules.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.values().all(Vec::is_empty)
	}

	/// Registrations that overrode an equivalent earlier rule.
	pub fn conflicts(&self) -> &[RuleConflict] {
		&self.conflicts
	}
}

impl std::fmt::Debug for ConversionRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConversionRegistry")
			.field("state", &self.state)
			.field("rules", &self.len())
			.field("conflicts", &self.conflicts.len())
			.finish()
	}
}
