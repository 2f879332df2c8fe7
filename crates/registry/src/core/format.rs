//! Format patterns attached to conversion rules.
//!
//! A pattern decides whether a rule applies to the format string requested at
//! conversion time. Both variants use full-match semantics: a pattern that only
//! covers a prefix or substring of the candidate does not match.

use std::fmt;

use regex::Regex;

/// Literal or regular-expression format discriminator.
#[derive(Clone)]
pub enum FormatPattern {
	/// Matches one exact format string.
	Exact(String),
	/// Matches any format string the expression spans completely.
	Regex(AnchoredRegex),
}

impl FormatPattern {
	pub fn exact(format: impl Into<String>) -> Self {
		Self::Exact(format.into())
	}

	/// Compiles `pattern` as a regular expression format.
	pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
		AnchoredRegex::new(pattern).map(Self::Regex)
	}

	/// Returns true if the pattern matches the whole of `candidate`.
	pub fn matches_fully(&self, candidate: &str) -> bool {
		match self {
			Self::Exact(format) => format == candidate,
			Self::Regex(re) => re.anchored.is_match(candidate),
		}
	}

	/// The literal format, or the regex source as written by the caller.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Exact(format) => format,
			Self::Regex(re) => &re.source,
		}
	}

	/// Same variant and same source text.
	pub(crate) fn is_equivalent(&self, other: &Self) -> bool {
		matches!(
			(self, other),
			(Self::Exact(_), Self::Exact(_)) | (Self::Regex(_), Self::Regex(_))
		) && self.as_str() == other.as_str()
	}
}

impl From<&str> for FormatPattern {
	fn from(format: &str) -> Self {
		Self::exact(format)
	}
}

impl From<String> for FormatPattern {
	fn from(format: String) -> Self {
		Self::Exact(format)
	}
}

impl From<AnchoredRegex> for FormatPattern {
	fn from(re: AnchoredRegex) -> Self {
		Self::Regex(re)
	}
}

impl fmt::Debug for FormatPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Exact(format) => f.debug_tuple("Exact").field(format).finish(),
			Self::Regex(re) => f.debug_tuple("Regex").field(&re.source).finish(),
		}
	}
}

impl fmt::Display for FormatPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Exact(format) => write!(f, "{format:?}"),
			Self::Regex(re) => write!(f, "/{}/", re.source),
		}
	}
}

/// A regex compiled so that it can only match an entire haystack.
///
/// `\A(?:a|ab)\z` matches `"ab"` even though a leftmost-first search for `a|ab`
/// stops after `"a"`.
#[derive(Clone)]
pub struct AnchoredRegex {
	source: String,
	anchored: Regex,
}

impl AnchoredRegex {
	pub fn new(pattern: &str) -> Result<Self, regex::Error> {
		// Compiling the bare pattern first rejects input like `a)|(b` that would
		// otherwise escape the wrapping group.
		Regex::new(pattern)?;
		let anchored = Regex::new(&format!(r"\A(?:{pattern})\z"))?;
		Ok(Self {
			source: pattern.to_string(),
			anchored,
		})
	}

	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// Capture groups of a full match, for converters that read parameters out
	/// of the format (`radix:16`).
	pub fn captures<'h>(&self, haystack: &'h str) -> Option<regex::Captures<'h>> {
		self.anchored.captures(haystack)
	}
}
