use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tagfill_cli::Commands;
use tagfill_cli::LocateOutputFormat;
use tagfill_cli::OutputFormat;
use tagfill_cli::TagfillCli;
use tagfill_core::CheckReport;
use tagfill_core::InjectError;
use tagfill_core::InjectReport;
use tagfill_core::Injector;
use tagfill_core::Slot;
use tagfill_core::Tag;
use tagfill_core::TagfillConfig;
use tagfill_core::apply_slots;
use tagfill_core::check_slots;
use tagfill_core::find_tag_with_options;
use tagfill_core::load_slots;
use tagfill_core::locator::line_of_offset;
use tagfill_core::parse_manifest;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = TagfillCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args).map(|()| 0),
		Some(Commands::Inject {
			tag,
			content,
			content_file,
			dry_run,
		}) => {
			run_inject(
				&args,
				tag,
				content.as_deref(),
				content_file.as_deref(),
				*dry_run,
			)
			.map(|()| 0)
		}
		Some(Commands::Apply { manifest, dry_run }) => {
			run_apply(&args, manifest.as_deref(), *dry_run).map(|()| 0)
		}
		Some(Commands::Check {
			manifest,
			diff,
			format,
		}) => run_check(&args, manifest.as_deref(), *diff, *format).map(i32::from),
		Some(Commands::Locate { tag, format }) => run_locate(&args, tag, *format).map(|()| 0),
		None => {
			eprintln!("No subcommand specified. Run `tagfill --help` for usage.");
			process::exit(1);
		}
	};

	match result {
		Ok(0) => {}
		Ok(code) => process::exit(code),
		Err(e) => {
			// Render core errors through miette for help text and codes.
			match e.downcast::<InjectError>() {
				Ok(inject_err) => {
					let report: miette::Report = (*inject_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

/// Core diagnostics go to stderr. They stay quiet unless `--verbose` or
/// `TAGFILL_LOG` asks for them, since the CLI prints its own warnings.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_directive = if verbose { "tagfill_core=debug" } else { "error" };
	let filter = EnvFilter::try_from_env("TAGFILL_LOG")
		.unwrap_or_else(|_| EnvFilter::new(default_directive));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.try_init();
}

/// Resolved locations and configuration for a single invocation.
struct Context {
	project_root: PathBuf,
	docs_root: PathBuf,
	config: TagfillConfig,
}

impl Context {
	fn load(args: &TagfillCli) -> CliResult<Self> {
		let project_root = resolve_root(args);
		let config = TagfillConfig::load(&project_root)?.unwrap_or_default();
		let docs_root = match &args.root {
			Some(root) => project_root.join(root),
			None => config.docs_root(&project_root),
		};

		Ok(Self {
			project_root,
			docs_root,
			config,
		})
	}

	fn injector(&self, dry_run: bool) -> Injector {
		let mut options = self.config.inject_options();
		options.dry_run = dry_run;
		Injector::with_options(&self.docs_root, options)
	}

	fn relative(&self, path: &Path) -> String {
		make_relative(path, &self.project_root)
	}
}

fn resolve_root(args: &TagfillCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

fn run_init(args: &TagfillCli) -> CliResult<()> {
	let root = resolve_root(args);

	if let Some(existing) = TagfillConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(());
	}

	let config_path = root.join("tagfill.toml");
	let sample_config = "# tagfill configuration\n\n# Directory scanned for <!--TAG--> marker \
	                     pairs, relative to this file.\nroot = \"docs\"\n\n# What to do with a \
	                     file that has an opening marker but no closing marker:\n# \"skip\" \
	                     reports it and leaves it untouched, \"error\" aborts.\nmalformed = \
	                     \"skip\"\n\n# Paths that are never scanned (gitignore syntax).\n# \
	                     [exclude]\n# patterns = [\"drafts/\"]\n\n# Content injected by `tagfill \
	                     apply`, in order.\n# [[slots]]\n# tag = \"CHAIN_IDS\"\n# path = \
	                     \"generated/chain-ids.md\"\n";

	std::fs::write(&config_path, sample_config)
		.map_err(|e| InjectError::io(&config_path, e))?;
	println!("Created {}", config_path.display());
	println!();
	println!("Next steps:");
	println!("  1. Add a marker pair to a documentation file:");
	println!("     <!--CHAIN_IDS-->");
	println!("     <!--CHAIN_IDS-->");
	println!("  2. Declare a [[slots]] entry for the tag in tagfill.toml");
	println!("  3. Run `tagfill apply` to fill the region");

	Ok(())
}

fn run_inject(
	args: &TagfillCli,
	tag: &str,
	content: Option<&str>,
	content_file: Option<&Path>,
	dry_run: bool,
) -> CliResult<()> {
	let ctx = Context::load(args)?;
	let tag = Tag::new(tag)?;

	let content = match (content, content_file) {
		(Some(content), _) => content.to_string(),
		(None, Some(file)) => {
			let path = ctx.project_root.join(file);
			std::fs::read_to_string(&path).map_err(|e| InjectError::io(&path, e))?
		}
		(None, None) => return Err("either --content or --content-file is required".into()),
	};

	let report = ctx.injector(dry_run).inject(&tag, &content)?;
	print_inject_report(&report, &ctx, args.verbose);

	Ok(())
}

fn run_apply(args: &TagfillCli, manifest: Option<&Path>, dry_run: bool) -> CliResult<()> {
	let ctx = Context::load(args)?;
	let slots = read_slots(&ctx, manifest)?;

	if slots.is_empty() {
		println!("No slots to apply. Add [[slots]] to tagfill.toml or pass --manifest.");
		return Ok(());
	}

	let reports = apply_slots(&ctx.injector(dry_run), &slots)?;
	for report in &reports {
		print_inject_report(report, &ctx, args.verbose);
	}

	if dry_run || args.verbose {
		let updated: usize = reports.iter().map(|report| report.updated.len()).sum();
		let verb = if dry_run { "Would update" } else { "Updated" };
		println!("{verb} {updated} region(s) across {} slot(s).", reports.len());
	}

	Ok(())
}

fn run_check(
	args: &TagfillCli,
	manifest: Option<&Path>,
	show_diff: bool,
	format: OutputFormat,
) -> CliResult<bool> {
	let ctx = Context::load(args)?;
	let slots = read_slots(&ctx, manifest)?;
	let reports = check_slots(&ctx.injector(true), &slots)?;

	let missing: Vec<&Tag> = reports
		.iter()
		.filter(|report| report.is_not_found())
		.map(|report| &report.tag)
		.collect();
	if !matches!(format, OutputFormat::Json) {
		for tag in &missing {
			eprintln!("{} no tags for {tag}", colored!("warning:", yellow));
		}
	}

	let stale_count: usize = reports.iter().map(|report| report.stale.len()).sum();
	let malformed_count: usize = reports.iter().map(|report| report.malformed.len()).sum();
	let ok = reports.iter().all(CheckReport::is_ok);

	match format {
		OutputFormat::Json => {
			let stale: Vec<serde_json::Value> = reports
				.iter()
				.flat_map(|report| &report.stale)
				.map(|entry| {
					serde_json::json!({
						"file": ctx.relative(&entry.path),
						"tag": entry.tag.as_str(),
						"line": entry.line,
					})
				})
				.collect();
			let mut malformed = Vec::new();
			for report in &reports {
				for entry in &report.malformed {
					malformed.push(serde_json::json!({
						"file": ctx.relative(&entry.path),
						"tag": report.tag.as_str(),
					}));
				}
			}
			let missing: Vec<&str> = missing.iter().map(|tag| tag.as_str()).collect();
			let output = serde_json::json!({
				"ok": ok,
				"stale": stale,
				"malformed": malformed,
				"missing": missing,
			});
			println!("{output}");
		}
		OutputFormat::Github => {
			for report in &reports {
				for entry in &report.malformed {
					println!(
						"::error file={}::Opening marker for tag `{}` has no closing marker",
						ctx.relative(&entry.path),
						report.tag
					);
				}
				for entry in &report.stale {
					println!(
						"::warning file={},line={}::Generated region for tag `{}` is out of date",
						ctx.relative(&entry.path),
						entry.line,
						entry.tag
					);
				}
			}
			if ok {
				println!("All generated regions are up to date.");
			} else {
				eprintln!("{}", check_summary(stale_count, malformed_count));
			}
		}
		OutputFormat::Text => {
			if ok {
				println!("Check passed: all generated regions are up to date.");
				return Ok(false);
			}

			eprintln!("Check failed.");
			eprintln!("  stale regions: {stale_count}");
			eprintln!("  unclosed markers: {malformed_count}");

			for report in &reports {
				for entry in &report.malformed {
					eprintln!(
						"  tag `{}` in {}: no closing marker",
						report.tag,
						ctx.relative(&entry.path)
					);
				}
				for entry in &report.stale {
					eprintln!(
						"  tag `{}` at {}:{}",
						entry.tag,
						ctx.relative(&entry.path),
						entry.line
					);
					if show_diff {
						print_diff(&entry.current_content, &entry.expected_content);
					}
				}
			}

			eprintln!();
			eprintln!("{}", check_summary(stale_count, malformed_count));
		}
	}

	Ok(!ok)
}

fn check_summary(stale_count: usize, malformed_count: usize) -> String {
	format!(
		"{stale_count} stale region(s), {malformed_count} unclosed marker(s). Run `tagfill apply` \
		 to regenerate."
	)
}

fn run_locate(args: &TagfillCli, tag: &str, format: LocateOutputFormat) -> CliResult<()> {
	let ctx = Context::load(args)?;
	let tag = Tag::new(tag)?;
	let scan = find_tag_with_options(&ctx.docs_root, &tag, &ctx.config.inject_options().scan)?;
	let marker_len = tag.marker().len();

	let mut matches = Vec::with_capacity(scan.matches.len());
	for found in &scan.matches {
		let line = marker_line(&found.path, found.start - marker_len)?;
		matches.push((found, line));
	}

	match format {
		LocateOutputFormat::Json => {
			let matches: Vec<serde_json::Value> = matches
				.iter()
				.map(|(found, line)| {
					serde_json::json!({
						"file": ctx.relative(&found.path),
						"start": found.start,
						"stop": found.stop,
						"line": line,
					})
				})
				.collect();
			let malformed: Vec<serde_json::Value> = scan
				.malformed
				.iter()
				.map(|entry| {
					serde_json::json!({
						"file": ctx.relative(&entry.path),
						"start": entry.start,
					})
				})
				.collect();
			let output = serde_json::json!({
				"tag": tag.as_str(),
				"matches": matches,
				"malformed": malformed,
			});
			println!("{output}");
		}
		LocateOutputFormat::Text => {
			if scan.is_empty() {
				eprintln!("{} no tags for {tag}", colored!("warning:", yellow));
				return Ok(());
			}

			for (found, line) in &matches {
				println!(
					"{}:{line} [{}..{})",
					ctx.relative(&found.path),
					found.start,
					found.stop
				);
			}
			for entry in &scan.malformed {
				eprintln!(
					"{} {} has no closing marker for tag `{tag}`",
					colored!("warning:", yellow),
					ctx.relative(&entry.path)
				);
			}
		}
	}

	Ok(())
}

/// 1-indexed line of the opening marker that starts at `offset`.
fn marker_line(path: &Path, offset: usize) -> CliResult<usize> {
	let content = std::fs::read(path).map_err(|e| InjectError::io(path, e))?;
	Ok(line_of_offset(&content, offset))
}

fn read_slots(ctx: &Context, manifest: Option<&Path>) -> CliResult<Vec<Slot>> {
	let Some(manifest) = manifest else {
		return Ok(load_slots(&ctx.config.slots, &ctx.project_root)?);
	};

	let json = if manifest == Path::new("-") {
		let mut json = String::new();
		std::io::stdin().read_to_string(&mut json)?;
		json
	} else {
		let path = ctx.project_root.join(manifest);
		std::fs::read_to_string(&path).map_err(|e| InjectError::io(&path, e))?
	};

	Ok(parse_manifest(&json)?)
}

fn print_inject_report(report: &InjectReport, ctx: &Context, verbose: bool) {
	for entry in &report.malformed {
		eprintln!(
			"{} {} has no closing marker for tag `{}`; file skipped",
			colored!("warning:", yellow),
			ctx.relative(&entry.path),
			report.tag
		);
	}

	if report.is_not_found() {
		eprintln!("{} no tags for {}", colored!("warning:", yellow), report.tag);
		return;
	}

	if report.dry_run {
		if report.updated.is_empty() {
			println!("Tag `{}`: already up to date.", report.tag);
			return;
		}

		println!(
			"Dry run: would update {} file(s) for tag `{}`:",
			report.updated.len(),
			report.tag
		);
		for path in &report.updated {
			println!("  {}", ctx.relative(path));
		}
		return;
	}

	if verbose {
		println!(
			"Tag `{}`: updated {} file(s), {} already current.",
			report.tag,
			report.updated.len(),
			report.unchanged.len()
		);
		for path in &report.updated {
			println!("  {}", ctx.relative(path));
		}
	}
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}
