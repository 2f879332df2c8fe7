//! Radix integer parsing.

use super::BuiltinError;
use crate::core::{AnchoredRegex, BoxError};

/// Format accepted by [`parse_radix`]: `radix:<base>`.
pub const RADIX_PATTERN: &str = r"radix:(\d+)";

/// Parses an integer in the base named by a `radix:<base>` format.
pub fn parse_radix(
	pattern: AnchoredRegex,
) -> impl Fn(&String, Option<&str>) -> Result<i64, BoxError> {
	move |text, format| {
		let format = format.ok_or(BuiltinError::MissingPattern)?;
		let radix = pattern
			.captures(format)
			.and_then(|caps| caps.get(1))
			.map(|base| base.as_str())
			.ok_or_else(|| BuiltinError::InvalidRadix(format.to_string()))?;
		let base = radix
			.parse::<u32>()
			.ok()
			.filter(|base| (2..=36).contains(base))
			.ok_or_else(|| BuiltinError::InvalidRadix(radix.to_string()))?;
		Ok(i64::from_str_radix(text, base)?)
	}
}
