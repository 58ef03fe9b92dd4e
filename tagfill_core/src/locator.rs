use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use serde::Serialize;

use crate::InjectError;
use crate::InjectResult;
use crate::Tag;
use crate::tag::memstr;

/// Options controlling which files the locator visits.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
	/// Gitignore-style patterns for paths that are never scanned.
	pub exclude_patterns: Vec<String>,
}

/// A replaceable region for one tag within one file.
///
/// `start` is the byte index immediately after the opening marker and `stop`
/// is the byte index where the closing marker begins, so `start <= stop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
	pub path: PathBuf,
	pub start: usize,
	pub stop: usize,
}

/// A file with an opening marker but no closing marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedRegion {
	pub path: PathBuf,
	/// Byte index immediately after the unclosed opening marker.
	pub start: usize,
}

/// The outcome of locating a marker pair inside a single buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
	/// Both markers were found.
	Bounded { start: usize, stop: usize },
	/// Only the opening marker was found.
	Unclosed { start: usize },
}

/// Every region found for a tag during one scan of the tree.
#[derive(Debug, Clone)]
pub struct TagScan {
	pub tag: Tag,
	pub matches: Vec<Match>,
	pub malformed: Vec<MalformedRegion>,
}

impl TagScan {
	/// True when no file under the root contains the tag's marker.
	pub fn is_empty(&self) -> bool {
		self.matches.is_empty() && self.malformed.is_empty()
	}
}

/// Locate the first marker pair in `content`.
///
/// A marker at offset 0 is treated as absent, so a file that begins with the
/// marker yields `None` even when a closing marker follows. Only the first
/// pair is considered; later pairs of the same marker are ignored.
pub fn locate_region(content: &[u8], marker: &[u8]) -> Option<Region> {
	let first = memstr(content, marker)?;
	if first == 0 {
		return None;
	}

	let start = first + marker.len();
	let region = match memstr(&content[start..], marker) {
		Some(offset) => {
			Region::Bounded {
				start,
				stop: start + offset,
			}
		}
		None => Region::Unclosed { start },
	};

	Some(region)
}

/// Read a single file and locate the tag's region in it.
pub fn scan_file(path: &Path, tag: &Tag) -> InjectResult<Option<Region>> {
	let content = std::fs::read(path).map_err(|e| InjectError::io(path, e))?;
	Ok(locate_region(&content, tag.marker().as_bytes()))
}

/// Recursively scan `root` for files containing the tag's marker pair.
pub fn find_tag(root: &Path, tag: &Tag) -> InjectResult<TagScan> {
	find_tag_with_options(root, tag, &ScanOptions::default())
}

/// Recursively scan `root` with explicit [`ScanOptions`].
///
/// Every directory entry is visited depth-first. Entries of a directory are
/// visited in path order, though callers should not rely on the order of
/// matches across files.
pub fn find_tag_with_options(root: &Path, tag: &Tag, options: &ScanOptions) -> InjectResult<TagScan> {
	let files = collect_files(root, options)?;
	let mut scan = TagScan {
		tag: tag.clone(),
		matches: Vec::new(),
		malformed: Vec::new(),
	};

	for path in files {
		match scan_file(&path, tag)? {
			Some(Region::Bounded { start, stop }) => {
				tracing::debug!(path = %path.display(), start, stop, tag = %tag, "found region");
				scan.matches.push(Match { path, start, stop });
			}
			Some(Region::Unclosed { start }) => {
				tracing::warn!(path = %path.display(), tag = %tag, "opening marker has no closing marker");
				scan.malformed.push(MalformedRegion { path, start });
			}
			None => {}
		}
	}

	Ok(scan)
}

/// Every file under `root` that a scan would visit, in walk order.
///
/// Symlinks are followed. A file reachable through several paths is listed
/// once, under the first path that reaches it, so a file is never rewritten
/// twice in one pass.
pub fn collect_files(root: &Path, options: &ScanOptions) -> InjectResult<Vec<PathBuf>> {
	if !root.is_dir() {
		return Err(InjectError::MissingRoot(root.display().to_string()));
	}

	let exclude = build_exclude_matcher(root, &options.exclude_patterns)?;
	let mut ancestors = HashSet::new();
	let mut seen_files = HashSet::new();
	let mut files = Vec::new();

	walk_dir(root, &exclude, &mut ancestors, &mut seen_files, &mut files)?;

	Ok(files)
}

/// Build a `Gitignore` matcher from exclude patterns. These follow
/// `.gitignore` syntax and are resolved relative to the scan root.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> InjectResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			InjectError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| InjectError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

fn walk_dir(
	dir: &Path,
	exclude: &Gitignore,
	ancestors: &mut HashSet<PathBuf>,
	seen_files: &mut HashSet<PathBuf>,
	files: &mut Vec<PathBuf>,
) -> InjectResult<()> {
	// A cycle is a directory that is its own ancestor. Sibling links to the
	// same directory are walked again and deduplicated per file.
	let canonical = canonical_path(dir);
	if !ancestors.insert(canonical.clone()) {
		return Err(InjectError::SymlinkCycle {
			path: dir.display().to_string(),
		});
	}

	let mut paths = Vec::new();
	for entry in std::fs::read_dir(dir).map_err(|e| InjectError::io(dir, e))? {
		let entry = entry.map_err(|e| InjectError::io(dir, e))?;
		paths.push(entry.path());
	}
	paths.sort();

	for path in paths {
		let is_dir = path.is_dir();

		if exclude.matched(&path, is_dir).is_ignore() {
			tracing::debug!(path = %path.display(), "excluded");
			continue;
		}

		if is_dir {
			walk_dir(&path, exclude, ancestors, seen_files, files)?;
			continue;
		}

		if !seen_files.insert(canonical_path(&path)) {
			tracing::debug!(path = %path.display(), "already visited through another path");
			continue;
		}

		files.push(path);
	}

	ancestors.remove(&canonical);

	Ok(())
}

fn canonical_path(path: &Path) -> PathBuf {
	path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// 1-indexed line number of the byte at `offset`.
pub fn line_of_offset(content: &[u8], offset: usize) -> usize {
	let end = offset.min(content.len());
	content[..end].iter().filter(|&&byte| byte == b'\n').count() + 1
}
