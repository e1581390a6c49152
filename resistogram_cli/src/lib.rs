use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Resolve resistance table directives in markdown documentation.",
	long_about = "resistogram resolves `%%RESIST ...%%` directives in markdown documents \
	              against antibiotic and organism reference tables.\n\nEach directive names \
	              antibiotics (`abx=`), organisms (`org=`) and optionally a data source hint \
	              (`source=`). Tokens may be identifiers, names, synonyms, classes, groups, \
	              `all`, or `auto` to detect names in the surrounding page.\n\nQuick start:\n  \
	              resistogram resolve  Resolve every directive in the docs tree\n  resistogram \
	              sources  Show the data source hierarchy\n  resistogram table    Print merged \
	              resistance rows\n  resistogram lookup   Resolve a single parameter"
)]
pub struct ResistCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Resolve every directive in the project's markdown documents.
	///
	/// Scans the project for markdown files (or only the given files),
	/// resolves each `%%RESIST ...%%` directive and prints the table
	/// component it becomes, with the resolved antibiotics, organisms and
	/// data source.
	Resolve {
		/// Files to resolve instead of scanning the project.
		files: Vec<PathBuf>,

		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,

		/// Exit with a non-zero status code when any directive contains
		/// tokens that could not be resolved.
		#[arg(long, default_value_t = false)]
		strict: bool,
	},
	/// List the configured data sources as a tree.
	///
	/// Every source is shown below its parent with its year. The source
	/// chosen when a directive gives no `source=` hint is marked.
	Sources {
		/// Output format for the source list.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Print the merged resistance rows of a data source.
	///
	/// Selects a source the way a directive's `source=` hint does, merges the
	/// rows it inherits from its ancestors, and keeps only the requested
	/// antibiotics and organisms. Organisms are ordered by class rank.
	Table {
		/// Data source hint: an id, part of a name, or a year.
		#[arg(long)]
		source: Option<String>,

		/// Antibiotics to include. Defaults to `all`.
		#[arg(long)]
		abx: Option<String>,

		/// Organisms to include. Defaults to `all`.
		#[arg(long)]
		org: Option<String>,

		/// Output format for the table.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Resolve a single antibiotic or organism parameter.
	///
	/// Useful for checking what a directive parameter expands to. With
	/// `--text`, `auto` detects names in the given text.
	Lookup {
		/// Antibiotic parameter to resolve.
		#[arg(long, conflicts_with = "org", required_unless_present = "org")]
		abx: Option<String>,

		/// Organism parameter to resolve.
		#[arg(long)]
		org: Option<String>,

		/// Page text used for `auto` detection.
		#[arg(long)]
		text: Option<String>,

		/// Output format for the lookup result.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
