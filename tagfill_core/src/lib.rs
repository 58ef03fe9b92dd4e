//! `tagfill_core` regenerates machine-derived sections of documentation
//! files. Authors place a pair of identical markers, `<!--TAG-->`, around a
//! region; `tagfill` finds every such pair under a documentation root and
//! replaces the bytes between them with freshly rendered content, leaving
//! every other byte of the file untouched.
//!
//! ## Pipeline
//!
//! ```text
//! (tag, content) pairs from a renderer or tagfill.toml
//!   → Locator (walks the tree, finds the first marker pair per file)
//!   → Injector (re-reads each file, splices head + "\n" + content + "\n" + tail)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: loading `tagfill.toml`.
//! - [`locator`]: recursive marker search producing [`Match`] values.
//! - [`injector`]: region rewriting and staleness checks.
//! - [`slots`]: (tag, content) pairs from config or a JSON manifest.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use tagfill_core::Injector;
//! use tagfill_core::Tag;
//!
//! let injector = Injector::new(Path::new("docs"));
//! let tag = Tag::new("CHAIN_IDS").unwrap();
//! let report = injector.inject(&tag, "| Chain | ID |\n| --- | --- |").unwrap();
//! if report.is_not_found() {
//!     eprintln!("no tags for {tag}");
//! }
//! ```
//!
//! ## Known limitations
//!
//! - Only the first marker pair per file is addressed for a tag.
//! - A marker at byte offset 0 of a file is treated as absent.
//! - Content is inserted verbatim; markers inside the content are not
//!   escaped.

pub use config::*;
pub use error::*;
pub use injector::*;
pub use locator::Match;
pub use locator::MalformedRegion;
pub use locator::Region;
pub use locator::ScanOptions;
pub use locator::TagScan;
pub use locator::find_tag;
pub use locator::find_tag_with_options;
pub use slots::*;
pub use tag::*;

pub mod config;
#[allow(unused_assignments)]
mod error;
mod injector;
pub mod locator;
pub mod slots;
mod tag;

#[cfg(test)]
mod __fixtures;
