//! Settings for the built-in rule set.

use chrono::FixedOffset;
use serde::Deserialize;

/// Unit of numeric epoch timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochUnit {
	#[default]
	Milliseconds,
	Seconds,
}

/// Knobs for the default converters.
///
/// ```toml
/// epoch_unit = "seconds"
/// utc_offset_seconds = 3600
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuiltinConfig {
	/// Unit for `i64`/`f64` to date-time conversions.
	pub epoch_unit: EpochUnit,
	/// Offset applied to pattern-parsed date-times that carry no zone.
	pub utc_offset_seconds: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("invalid builtin config: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("utc offset out of range: {0}s")]
	InvalidOffset(i32),
}

impl BuiltinConfig {
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.utc_offset()?;
		Ok(config)
	}

	/// The configured offset as a chrono [`FixedOffset`].
	pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
		FixedOffset::east_opt(self.utc_offset_seconds)
			.ok_or(ConfigError::InvalidOffset(self.utc_offset_seconds))
	}
}
