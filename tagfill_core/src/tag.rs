use std::fmt;
use std::str::FromStr;

use derive_more::Deref;
use serde::Deserialize;
use serde::Serialize;

use crate::InjectError;
use crate::InjectResult;

/// Opening sequence of a delimiter marker.
pub const MARKER_OPEN: &str = "<!--";
/// Closing sequence of a delimiter marker.
pub const MARKER_CLOSE: &str = "-->";

/// The name of a content slot.
///
/// A tag is written into documentation as `<!--NAME-->`, and the same marker
/// is used for both the opening and the closing boundary of the generated
/// region. Tag names are case-sensitive.
///
/// ```rust
/// use tagfill_core::Tag;
///
/// let tag = Tag::new("CHAIN_IDS").unwrap();
/// assert_eq!(tag.marker(), "<!--CHAIN_IDS-->");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deref, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
	/// Create a tag, rejecting empty names and names containing the marker's
	/// closing sequence.
	pub fn new(name: impl Into<String>) -> InjectResult<Self> {
		let name = name.into();

		if name.is_empty() {
			return Err(InjectError::EmptyTag);
		}

		if name.contains(MARKER_CLOSE) {
			return Err(InjectError::InvalidTag(name));
		}

		Ok(Self(name))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// The delimiter marker for this tag, e.g. `<!--CHAIN_IDS-->`.
	pub fn marker(&self) -> String {
		format!("{MARKER_OPEN}{}{MARKER_CLOSE}", self.0)
	}
}

impl fmt::Display for Tag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl FromStr for Tag {
	type Err = InjectError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

impl TryFrom<String> for Tag {
	type Error = InjectError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

impl From<Tag> for String {
	fn from(value: Tag) -> Self {
		value.0
	}
}

/// Find the first occurrence of `needle` in `haystack`.
pub(crate) fn memstr(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	if needle.is_empty() || needle.len() > haystack.len() {
		return None;
	}

	haystack
		.windows(needle.len())
		.position(|window| window == needle)
}
