use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::InjectError;
use crate::InjectResult;
use crate::Tag;
use crate::locator::Match;
use crate::locator::MalformedRegion;
use crate::locator::ScanOptions;
use crate::locator::TagScan;
use crate::locator::find_tag_with_options;
use crate::locator::line_of_offset;

/// What to do with a file that has an opening marker but no closing marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
	/// Leave the file untouched and report it.
	#[default]
	Skip,
	/// Abort the tag's injection before any file is written.
	Error,
}

#[derive(Debug, Clone, Default)]
pub struct InjectOptions {
	pub scan: ScanOptions,
	pub malformed: MalformedPolicy,
	/// Compute every rewrite without touching the filesystem.
	pub dry_run: bool,
}

/// Result of injecting content for one tag.
#[derive(Debug, Clone)]
pub struct InjectReport {
	pub tag: Tag,
	/// Files whose region was (or, in a dry run, would be) rewritten.
	pub updated: Vec<PathBuf>,
	/// Files whose region already held the content.
	pub unchanged: Vec<PathBuf>,
	/// Files skipped because the closing marker is missing.
	pub malformed: Vec<MalformedRegion>,
	pub dry_run: bool,
}

impl InjectReport {
	fn new(tag: &Tag, dry_run: bool) -> Self {
		Self {
			tag: tag.clone(),
			updated: Vec::new(),
			unchanged: Vec::new(),
			malformed: Vec::new(),
			dry_run,
		}
	}

	/// True when no file under the root contains the tag's marker.
	pub fn is_not_found(&self) -> bool {
		self.updated.is_empty() && self.unchanged.is_empty() && self.malformed.is_empty()
	}

	/// Number of regions located for the tag.
	pub fn match_count(&self) -> usize {
		self.updated.len() + self.unchanged.len()
	}
}

/// A region whose current content differs from what injection would write.
#[derive(Debug, Clone)]
pub struct StaleEntry {
	pub path: PathBuf,
	pub tag: Tag,
	/// The text currently between the markers.
	pub current_content: String,
	/// The text injection would place between the markers.
	pub expected_content: String,
	/// 1-indexed line of the opening marker.
	pub line: usize,
}

/// Result of checking one tag without writing.
#[derive(Debug, Clone)]
pub struct CheckReport {
	pub tag: Tag,
	pub stale: Vec<StaleEntry>,
	pub up_to_date: Vec<PathBuf>,
	pub malformed: Vec<MalformedRegion>,
}

impl CheckReport {
	/// Returns true if every located region already holds the content.
	pub fn is_ok(&self) -> bool {
		self.stale.is_empty() && self.malformed.is_empty()
	}

	pub fn is_not_found(&self) -> bool {
		self.stale.is_empty() && self.up_to_date.is_empty() && self.malformed.is_empty()
	}
}

/// The framed text written between the two markers.
pub fn render_region(content: &str) -> String {
	format!("\n{content}\n")
}

/// Replace the bytes in `[start, stop)` of `original` with the framed
/// content. Bytes outside the range are copied through unchanged.
///
/// # Panics
///
/// Panics if `start > stop` or `stop > original.len()`.
pub fn splice(original: &[u8], start: usize, stop: usize, content: &str) -> Vec<u8> {
	let region = render_region(content);
	let head = &original[..start];
	let tail = &original[stop..];

	let mut updated = Vec::with_capacity(head.len() + region.len() + tail.len());
	updated.extend_from_slice(head);
	updated.extend_from_slice(region.as_bytes());
	updated.extend_from_slice(tail);
	updated
}

/// Rewrites tag-bounded regions under a documentation root.
#[derive(Debug, Clone)]
pub struct Injector {
	root: PathBuf,
	options: InjectOptions,
}

impl Injector {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self::with_options(root, InjectOptions::default())
	}

	pub fn with_options(root: impl Into<PathBuf>, options: InjectOptions) -> Self {
		Self {
			root: root.into(),
			options,
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn options(&self) -> &InjectOptions {
		&self.options
	}

	/// Overwrite every region bounded by `tag` with `content`.
	///
	/// Each matched file is read fresh, spliced, and written back whole. A
	/// failure on one file leaves earlier rewrites in place.
	pub fn inject(&self, tag: &Tag, content: &str) -> InjectResult<InjectReport> {
		let scan = self.scan(tag)?;
		let mut report = InjectReport::new(tag, self.options.dry_run);
		report.malformed = scan.malformed;

		for found in &scan.matches {
			let original = read_file(&found.path)?;
			let updated = splice_checked(&original, found, content)?;

			if updated == original {
				report.unchanged.push(found.path.clone());
				continue;
			}

			if !self.options.dry_run {
				std::fs::write(&found.path, &updated).map_err(|e| InjectError::io(&found.path, e))?;
				tracing::debug!(path = %found.path.display(), tag = %tag, "rewrote region");
			}

			report.updated.push(found.path.clone());
		}

		Ok(report)
	}

	/// Compare every region bounded by `tag` against `content` without
	/// writing anything. Regions are compared against the files as they are
	/// on disk; use [`crate::check_slots`] for a sequence of slots.
	pub fn check(&self, tag: &Tag, content: &str) -> InjectResult<CheckReport> {
		let scan = self.scan(tag)?;
		let expected_content = render_region(content);
		let mut report = CheckReport {
			tag: tag.clone(),
			stale: Vec::new(),
			up_to_date: Vec::new(),
			malformed: scan.malformed,
		};

		for found in &scan.matches {
			let original = read_file(&found.path)?;
			ensure_in_bounds(&original, found)?;

			let current = &original[found.start..found.stop];
			if current == expected_content.as_bytes() {
				report.up_to_date.push(found.path.clone());
				continue;
			}

			report.stale.push(StaleEntry {
				path: found.path.clone(),
				tag: tag.clone(),
				current_content: String::from_utf8_lossy(current).into_owned(),
				expected_content: expected_content.clone(),
				line: line_of_offset(&original, found.start),
			});
		}

		Ok(report)
	}

	/// Locate the tag and apply the malformed-region policy.
	fn scan(&self, tag: &Tag) -> InjectResult<TagScan> {
		let scan = find_tag_with_options(&self.root, tag, &self.options.scan)?;

		if scan.is_empty() {
			tracing::warn!("no tags for {tag}");
			return Ok(scan);
		}

		if self.options.malformed == MalformedPolicy::Error {
			if let Some(malformed) = scan.malformed.first() {
				return Err(InjectError::MalformedRegion {
					tag: tag.to_string(),
					path: malformed.path.display().to_string(),
				});
			}
		}

		Ok(scan)
	}
}

fn read_file(path: &Path) -> InjectResult<Vec<u8>> {
	std::fs::read(path).map_err(|e| InjectError::io(path, e))
}

fn ensure_in_bounds(original: &[u8], found: &Match) -> InjectResult<()> {
	if found.start > found.stop || found.stop > original.len() {
		return Err(InjectError::RegionOutOfBounds {
			path: found.path.display().to_string(),
			start: found.start,
			stop: found.stop,
			len: original.len(),
		});
	}

	Ok(())
}

pub(crate) fn splice_checked(original: &[u8], found: &Match, content: &str) -> InjectResult<Vec<u8>> {
	ensure_in_bounds(original, found)?;
	Ok(splice(original, found.start, found.stop, content))
}
