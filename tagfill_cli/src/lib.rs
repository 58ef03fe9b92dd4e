use std::path::PathBuf;

use clap::ArgGroup;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Regenerate tagged sections of documentation files.",
	long_about = "tagfill replaces the text between pairs of `<!--TAG-->` markers in \
	              documentation files with freshly rendered content, leaving every other byte \
	              untouched.\n\nQuick start:\n  tagfill init     Create a tagfill.toml\n  tagfill \
	              apply    Inject every configured slot\n  tagfill check    Verify generated \
	              regions are current\n  tagfill locate   List the regions for a tag"
)]
pub struct TagfillCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory (where `tagfill.toml` lives).
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Documentation root to scan, overriding `root` from `tagfill.toml`.
	/// Relative paths resolve against the project root.
	#[arg(long, short, global = true)]
	pub root: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Create a sample `tagfill.toml` in the project root.
	///
	/// If a config file already exists this command is a no-op and exits
	/// successfully.
	Init,
	/// Inject content into every region bounded by a single tag.
	///
	/// The content is written between the markers framed by one leading and
	/// one trailing newline. Files with an opening marker and no closing
	/// marker are reported and left untouched.
	#[command(group(ArgGroup::new("source").required(true).args(["content", "content_file"])))]
	Inject {
		/// Name of the tag, e.g. `CHAIN_IDS` for `<!--CHAIN_IDS-->`.
		tag: String,

		/// Content to inject.
		#[arg(long)]
		content: Option<String>,

		/// Read the content to inject from a file.
		#[arg(long)]
		content_file: Option<PathBuf>,

		/// Preview which files would change without writing them.
		#[arg(long, default_value_t = false)]
		dry_run: bool,
	},
	/// Inject every slot, in order.
	///
	/// Slots come from a JSON manifest when `--manifest` is given, otherwise
	/// from the `[[slots]]` entries of `tagfill.toml`. Each slot sees the
	/// files as left by the slots before it.
	Apply {
		/// JSON manifest of `{"tag", "content"}` objects. Use `-` to read
		/// from stdin.
		#[arg(long)]
		manifest: Option<PathBuf>,

		/// Preview which files would change without writing them.
		#[arg(long, default_value_t = false)]
		dry_run: bool,
	},
	/// Check that every slot's regions already hold the slot's content.
	///
	/// Exits with a non-zero status code if any region is stale or any file
	/// has an unclosed marker. Nothing is written.
	Check {
		/// JSON manifest of `{"tag", "content"}` objects. Use `-` to read
		/// from stdin.
		#[arg(long)]
		manifest: Option<PathBuf>,

		/// Show a line diff for each stale region.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Output format for check results. Use `text` for human-readable
		/// output, `json` for programmatic consumption, or `github` for
		/// GitHub Actions annotations.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// List every region bounded by a tag.
	Locate {
		/// Name of the tag, e.g. `CHAIN_IDS` for `<!--CHAIN_IDS-->`.
		tag: String,

		/// Output format for the located regions.
		#[arg(long, value_enum, default_value_t = LocateOutputFormat::Text)]
		format: LocateOutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
	/// GitHub Actions annotation format. Emits `::warning` and `::error`
	/// annotations that appear inline on pull request diffs.
	Github,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LocateOutputFormat {
	/// Human-readable text output.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
