use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::CheckReport;
use crate::InjectError;
use crate::InjectReport;
use crate::InjectResult;
use crate::Injector;
use crate::MalformedPolicy;
use crate::StaleEntry;
use crate::Tag;
use crate::injector::splice;
use crate::locator::MalformedRegion;
use crate::locator::Region;
use crate::locator::collect_files;
use crate::locator::line_of_offset;
use crate::locator::locate_region;

/// A tag together with the rendered content destined for its regions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Slot {
	pub tag: Tag,
	pub content: String,
}

impl Slot {
	pub fn new(tag: Tag, content: impl Into<String>) -> Self {
		Self {
			tag,
			content: content.into(),
		}
	}
}

/// A `[[slots]]` entry from `tagfill.toml`.
///
/// File-backed entries read pre-rendered content from disk:
///
/// ```toml
/// [[slots]]
/// tag = "CORE_ADDRESS"
/// path = "generated/core-address.md"
/// ```
///
/// Inline entries carry the content directly:
///
/// ```toml
/// [[slots]]
/// tag = "SUPPORT_NOTE"
/// content = "Reach out on Discord for help."
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum SlotSource {
	File { tag: Tag, path: PathBuf },
	Inline { tag: Tag, content: String },
}

impl SlotSource {
	pub fn tag(&self) -> &Tag {
		match self {
			Self::File { tag, .. } | Self::Inline { tag, .. } => tag,
		}
	}

	/// Load the slot's content. File paths are resolved against
	/// `project_root`.
	pub fn resolve(&self, project_root: &Path) -> InjectResult<Slot> {
		match self {
			Self::File { tag, path } => {
				let abs_path = project_root.join(path);
				let content =
					std::fs::read_to_string(&abs_path).map_err(|e| InjectError::SlotContent {
						tag: tag.to_string(),
						path: path.display().to_string(),
						reason: e.to_string(),
					})?;
				Ok(Slot::new(tag.clone(), content))
			}
			Self::Inline { tag, content } => Ok(Slot::new(tag.clone(), content.clone())),
		}
	}
}

/// Resolve every configured slot, keeping declaration order.
pub fn load_slots(sources: &[SlotSource], project_root: &Path) -> InjectResult<Vec<Slot>> {
	sources
		.iter()
		.map(|source| source.resolve(project_root))
		.collect()
}

/// Parse a JSON manifest of slots produced by an external renderer.
///
/// ```rust
/// use tagfill_core::parse_manifest;
///
/// let slots = parse_manifest(r#"[{ "tag": "CHAIN_IDS", "content": "| id |" }]"#).unwrap();
/// assert_eq!(slots[0].tag.as_str(), "CHAIN_IDS");
/// ```
pub fn parse_manifest(json: &str) -> InjectResult<Vec<Slot>> {
	serde_json::from_str(json).map_err(|e| InjectError::ManifestParse(e.to_string()))
}

/// Inject each slot in order. Every slot sees the files as left by the slots
/// before it.
pub fn apply_slots(injector: &Injector, slots: &[Slot]) -> InjectResult<Vec<InjectReport>> {
	let mut reports = Vec::with_capacity(slots.len());
	for slot in slots {
		reports.push(injector.inject(&slot.tag, &slot.content)?);
	}
	Ok(reports)
}

/// Check each slot without writing.
///
/// The slots are applied in order to in-memory copies of the files, exactly
/// as [`apply_slots`] would write them. A region is stale when its text on
/// disk differs from its text after the whole sequence, so nested and
/// repeated slots pass once `apply` has run. A tag repeated across slots is
/// reported under each of them, compared against the final text.
pub fn check_slots(injector: &Injector, slots: &[Slot]) -> InjectResult<Vec<CheckReport>> {
	let options = injector.options();
	let mut files = Vec::new();
	for path in collect_files(injector.root(), &options.scan)? {
		let content = std::fs::read(&path).map_err(|e| InjectError::io(&path, e))?;
		files.push((path, content));
	}

	let mut staged: Vec<Vec<u8>> = files.iter().map(|(_, content)| content.clone()).collect();
	let mut touched_by_slot = Vec::with_capacity(slots.len());
	let mut reports = Vec::with_capacity(slots.len());

	for slot in slots {
		let marker = slot.tag.marker();
		let mut report = CheckReport {
			tag: slot.tag.clone(),
			stale: Vec::new(),
			up_to_date: Vec::new(),
			malformed: Vec::new(),
		};
		let mut touched = Vec::new();

		for (index, content) in staged.iter_mut().enumerate() {
			match locate_region(content, marker.as_bytes()) {
				Some(Region::Bounded { start, stop }) => {
					*content = splice(content, start, stop, &slot.content);
					touched.push(index);
				}
				Some(Region::Unclosed { start }) => {
					report.malformed.push(MalformedRegion {
						path: files[index].0.clone(),
						start,
					});
				}
				None => {}
			}
		}

		if options.malformed == MalformedPolicy::Error {
			if let Some(malformed) = report.malformed.first() {
				return Err(InjectError::MalformedRegion {
					tag: slot.tag.to_string(),
					path: malformed.path.display().to_string(),
				});
			}
		}

		touched_by_slot.push(touched);
		reports.push(report);
	}

	for ((slot, report), touched) in slots.iter().zip(&mut reports).zip(touched_by_slot) {
		let marker = slot.tag.marker();

		for index in touched {
			let (path, original) = &files[index];
			let current = bounded_region(original, marker.as_bytes());
			let expected = bounded_region(&staged[index], marker.as_bytes());

			if current.map(|(_, text)| text) == expected.map(|(_, text)| text) {
				report.up_to_date.push(path.clone());
				continue;
			}

			let line = match (current, expected) {
				(Some((start, _)), _) => line_of_offset(original, start),
				(None, Some((start, _))) => line_of_offset(&staged[index], start),
				(None, None) => 1,
			};
			report.stale.push(StaleEntry {
				path: path.clone(),
				tag: slot.tag.clone(),
				current_content: region_text(current),
				expected_content: region_text(expected),
				line,
			});
		}

		if report.is_not_found() {
			tracing::warn!("no tags for {}", slot.tag);
		}
	}

	Ok(reports)
}

/// Start offset and text of the tag's first complete region.
fn bounded_region<'a>(content: &'a [u8], marker: &[u8]) -> Option<(usize, &'a [u8])> {
	match locate_region(content, marker)? {
		Region::Bounded { start, stop } => Some((start, &content[start..stop])),
		Region::Unclosed { .. } => None,
	}
}

fn region_text(region: Option<(usize, &[u8])>) -> String {
	region
		.map(|(_, text)| String::from_utf8_lossy(text).into_owned())
		.unwrap_or_default()
}
