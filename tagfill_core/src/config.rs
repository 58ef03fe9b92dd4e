use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::InjectError;
use crate::InjectOptions;
use crate::InjectResult;
use crate::MalformedPolicy;
use crate::locator::ScanOptions;
use crate::slots::SlotSource;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["tagfill.toml", ".tagfill.toml", ".config/tagfill.toml"];

/// Configuration loaded from a `tagfill.toml` file.
///
/// ```toml
/// root = "docs/.snippets/text"
/// malformed = "skip"
///
/// [exclude]
/// patterns = ["drafts/", "*.bak"]
///
/// [[slots]]
/// tag = "CHAIN_IDS"
/// path = "generated/chain-ids.md"
///
/// [[slots]]
/// tag = "SUPPORT_NOTE"
/// content = "Inline content."
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagfillConfig {
	/// Documentation root scanned for markers, relative to the project root.
	/// Defaults to the project root itself.
	#[serde(default)]
	pub root: Option<PathBuf>,
	/// Policy for files with an opening marker but no closing marker.
	#[serde(default)]
	pub malformed: MalformedPolicy,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	/// Content slots injected by `tagfill apply`, in declaration order.
	#[serde(default)]
	pub slots: Vec<SlotSource>,
}

/// Paths under the documentation root that are never scanned.
///
/// ```toml
/// [exclude]
/// patterns = ["vendor/", "*.generated.md"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeConfig {
	#[serde(default)]
	pub patterns: Vec<String>,
}

impl TagfillConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(project_root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| project_root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at
	/// `project_root`. Returns `None` if no config file exists.
	pub fn load(project_root: &Path) -> InjectResult<Option<TagfillConfig>> {
		let Some(config_path) = Self::resolve_path(project_root) else {
			return Ok(None);
		};

		let content =
			std::fs::read_to_string(&config_path).map_err(|e| InjectError::io(&config_path, e))?;
		let config = Self::parse(&content)?;
		tracing::debug!(path = %config_path.display(), slots = config.slots.len(), "loaded config");

		Ok(Some(config))
	}

	/// Parse config from TOML text.
	pub fn parse(content: &str) -> InjectResult<TagfillConfig> {
		toml::from_str(content).map_err(|e| InjectError::ConfigParse(e.to_string()))
	}

	/// The absolute documentation root for a project.
	pub fn docs_root(&self, project_root: &Path) -> PathBuf {
		match &self.root {
			Some(root) => project_root.join(root),
			None => project_root.to_path_buf(),
		}
	}

	/// Injection options described by this config.
	pub fn inject_options(&self) -> InjectOptions {
		InjectOptions {
			scan: ScanOptions {
				exclude_patterns: self.exclude.patterns.clone(),
			},
			malformed: self.malformed,
			dry_run: false,
		}
	}
}
