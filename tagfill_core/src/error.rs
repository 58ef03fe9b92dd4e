use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum InjectError {
	#[error("failed to access `{path}`: {source}")]
	#[diagnostic(code(tagfill::io_error))]
	Io {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("tag names must not be empty")]
	#[diagnostic(
		code(tagfill::empty_tag),
		help("pass the name that appears inside the marker, e.g. `CHAIN_IDS` for `<!--CHAIN_IDS-->`")
	)]
	EmptyTag,

	#[error("invalid tag name `{0}`: tag names must not contain `-->`")]
	#[diagnostic(code(tagfill::invalid_tag))]
	InvalidTag(String),

	#[error("opening marker for tag `{tag}` in {path} has no closing marker")]
	#[diagnostic(
		code(tagfill::malformed_region),
		help("add a second `<!--{tag}-->` marker to close the generated region")
	)]
	MalformedRegion { tag: String, path: String },

	#[error("region [{start}, {stop}) no longer fits {path} ({len} bytes)")]
	#[diagnostic(
		code(tagfill::region_out_of_bounds),
		help("the file changed between scanning and rewriting; run the injection again")
	)]
	RegionOutOfBounds {
		path: String,
		start: usize,
		stop: usize,
		len: usize,
	},

	#[error("documentation root `{0}` does not exist or is not a directory")]
	#[diagnostic(
		code(tagfill::missing_root),
		help("set `root` in tagfill.toml or pass `--root`")
	)]
	MissingRoot(String),

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(tagfill::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(tagfill::config_parse),
		help("check that tagfill.toml is valid TOML with `root`, `[exclude]` and `[[slots]]` entries")
	)]
	ConfigParse(String),

	#[error("failed to load content for slot `{tag}` from `{path}`: {reason}")]
	#[diagnostic(code(tagfill::slot_content))]
	SlotContent {
		tag: String,
		path: String,
		reason: String,
	},

	#[error("failed to parse slot manifest: {0}")]
	#[diagnostic(
		code(tagfill::manifest_parse),
		help("the manifest must be a JSON array of `{{\"tag\": ..., \"content\": ...}}` objects")
	)]
	ManifestParse(String),
}

impl InjectError {
	/// Wrap an I/O error with the path that caused it.
	pub fn io(path: &Path, source: std::io::Error) -> Self {
		Self::Io {
			path: path.display().to_string(),
			source,
		}
	}
}

pub type InjectResult<T> = Result<T, InjectError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
