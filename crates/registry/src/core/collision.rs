//! Registration conflicts.
//!
//! Two rules conflict when they share destination, source type and an
//! equivalent format pattern. Conflicts are recorded for diagnostics only; the
//! later rule still wins at lookup time.

use super::format::FormatPattern;
use super::value::TypeKey;

#[derive(Debug, Clone)]
pub struct RuleConflict {
	pub destination: TypeKey,
	pub source: TypeKey,
	pub format: Option<FormatPattern>,
	/// Position of the overridden rule within the destination's sequence.
	pub shadowed: usize,
	/// Position of the newly registered rule.
	pub winner: usize,
}

impl std::fmt::Display for RuleConflict {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"{} -> {} rule #{} shadows #{}",
			self.source, self.destination, self.winner, self.shadowed
		)?;
		if let Some(format) = &self.format {
			write!(f, " for format {format}")?;
		}
		Ok(())
	}
}
