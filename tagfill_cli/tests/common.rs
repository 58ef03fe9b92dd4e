#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn tagfill_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("tagfill"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("TAGFILL_LOG");
	cmd
}

pub fn write(root: &Path, rel: &str, content: &str) -> std::io::Result<()> {
	let path = root.join(rel);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, content)
}
