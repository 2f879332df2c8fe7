//! Default conversion rules and the process-wide default registry.
//!
//! Destination types covered: `DateTime<Utc>`, [`Url`], `i64`, `f64` and
//! [`serde_json::Number`]. Rules are appended in a fixed order so callers can
//! override any of them by registering after [`register_builtins`].

use std::sync::LazyLock;

use url::Url;

use crate::core::{AnchoredRegex, ConversionRegistry, ConvertError, FormatPattern};

pub mod config;
pub mod datetime;
pub mod radix;

pub use config::{BuiltinConfig, ConfigError, EpochUnit};

/// Format selecting numeric epoch input.
pub const EPOCH_FORMAT: &str = "epoch";
/// Format selecting plain text number parsing.
pub const STRING_FORMAT: &str = "string";
/// Catch-all format for pattern-based date parsing. The format itself is the pattern.
pub const DATE_PATTERN_FORMAT: &str = ".+";

/// Sealed registry holding the default rule set, built on first access.
pub static DEFAULTS: LazyLock<ConversionRegistry> = LazyLock::new(|| {
	tracing::trace!("initialising default conversion registry");
	ConversionRegistry::with_defaults().sealed()
});

/// Failures raised by the built-in converters.
#[derive(Debug, thiserror::Error)]
pub enum BuiltinError {
	#[error("invalid radix: {0:?}")]
	InvalidRadix(String),
	#[error("epoch value out of range: {0}")]
	EpochOutOfRange(f64),
	#[error("no date pattern given")]
	MissingPattern,
	#[error("local date-time cannot be mapped to UTC")]
	LocalTimeOutOfRange,
	#[error(transparent)]
	Parse(#[from] chrono::ParseError),
}

/// Errors while installing the built-in rules.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
	#[error(transparent)]
	Registry(#[from] ConvertError),
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("invalid builtin format pattern: {0}")]
	Pattern(#[from] regex::Error),
}

impl ConversionRegistry {
	/// Creates an open registry populated with the default rule set.
	pub fn with_defaults() -> Self {
		Self::with_config(&BuiltinConfig::default()).unwrap_or_else(|e| {
			tracing::error!("Builtin conversion registration failed: {}", e);
			Self::new()
		})
	}

	/// Creates an open registry populated with rules built from `config`.
	pub fn with_config(config: &BuiltinConfig) -> Result<Self, SetupError> {
		let mut registry = Self::new();
		register_builtins(&mut registry, config)?;
		Ok(registry)
	}
}

/// Appends the default rule set to an open registry.
pub fn register_builtins(
	registry: &mut ConversionRegistry,
	config: &BuiltinConfig,
) -> Result<(), SetupError> {
	let offset = config.utc_offset()?;
	let epoch = Some(FormatPattern::exact(EPOCH_FORMAT));
	let string = Some(FormatPattern::exact(STRING_FORMAT));

	registry.register(None, |text: &String| datetime::parse_rfc3339(text))?;

	let unit = config.epoch_unit;
	for format in [None, epoch] {
		registry.register::<i64, _, _, _>(format.clone(), datetime::from_epoch_int(unit))?;
		registry.register::<f64, _, _, _>(format, datetime::from_epoch_float(unit))?;
	}

	registry.register(None, |text: &String| Url::parse(text))?;

	let radix_format = AnchoredRegex::new(radix::RADIX_PATTERN)?;
	registry.register_formatted::<String, _, _, _>(
		Some(radix_format.clone().into()),
		radix::parse_radix(radix_format),
	)?;

	for format in [None, string] {
		registry.register(format.clone(), |text: &String| text.parse::<i64>())?;
		registry.register(format.clone(), |text: &String| text.parse::<f64>())?;
		registry.register(format, |text: &String| text.parse::<serde_json::Number>())?;
	}

	registry.register_formatted::<String, _, _, _>(
		Some(FormatPattern::regex(DATE_PATTERN_FORMAT)?),
		datetime::parse_with_pattern(offset),
	)?;

	Ok(())
}

/// Converts with [`DEFAULTS`].
pub fn convert<T: std::any::Any + Send + Sync>(
	value: crate::core::Value,
	format: Option<&str>,
) -> Result<T, ConvertError> {
	DEFAULTS.convert(value, format)
}
