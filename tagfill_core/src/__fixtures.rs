use std::path::Path;

use tempfile::TempDir;

use crate::Tag;

/// Create a temporary directory populated with `files`, given as
/// `(relative path, content)` pairs. Parent directories are created.
pub(crate) fn tree(files: &[(&str, &str)]) -> TempDir {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	for (rel, content) in files {
		write(tmp.path(), rel, content);
	}
	tmp
}

pub(crate) fn write(root: &Path, rel: &str, content: &str) {
	let path = root.join(rel);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir {}: {e}", parent.display()));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
}

pub(crate) fn read(root: &Path, rel: &str) -> String {
	let path = root.join(rel);
	std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

pub(crate) fn tag(name: &str) -> Tag {
	Tag::new(name).unwrap_or_else(|e| panic!("tag {name}: {e}"))
}
