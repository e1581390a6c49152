use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use resistogram_cli::Commands;
use resistogram_cli::OutputFormat;
use resistogram_cli::ResistCli;
use resistogram_core::ReferenceData;
use resistogram_core::ResistConfig;
use resistogram_core::ResistError;
use resistogram_core::SharedReference;
use resistogram_core::project::DocumentReport;
use resistogram_core::project::collect_documents;
use resistogram_core::project::resolve_files;
use resistogram_core::records::ResistanceRow;
use resistogram_core::records::Source;
use resistogram_core::resolver::Resolution;
use resistogram_core::resolver::split_param;
use resistogram_core::sources::source_forest;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Parameter value used when `table` is given no antibiotics or organisms.
const ALL: &str = "all";

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
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = ResistCli::parse();

	// Respect NO_COLOR env var, --no-color flag and terminal support.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stdout).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_logging(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Resolve {
			files,
			format,
			strict,
		}) => run_resolve(&args, files, *format, *strict),
		Some(Commands::Sources { format }) => run_sources(&args, *format),
		Some(Commands::Table {
			source,
			abx,
			org,
			format,
		}) => run_table(
			&args,
			source.as_deref(),
			abx.as_deref(),
			org.as_deref(),
			*format,
		),
		Some(Commands::Lookup {
			abx,
			org,
			text,
			format,
		}) => run_lookup(&args, abx.as_deref(), org.as_deref(), text.as_deref(), *format),
		None => {
			eprintln!("No subcommand specified. Run `resistogram --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<ResistError>() {
			Ok(resist_err) => {
				let report: miette::Report = (*resist_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.init();
}

fn resolve_root(args: &ResistCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn load_reference(args: &ResistCli) -> Result<(ResistConfig, ReferenceData), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = ResistConfig::load_or_default(&root)?;
	let data = ReferenceData::load(&config, &root)?;

	if args.verbose {
		print_loaded(&data, &config, &root);
	}

	Ok((config, data))
}

fn print_loaded(data: &ReferenceData, config: &ResistConfig, root: &Path) {
	eprintln!(
		"Loaded {} antibiotic(s), {} organism(s) and {} source(s) from {}",
		data.tables().antibiotics.len(),
		data.tables().organisms.len(),
		data.sources().len(),
		config.data_path(root).display()
	);
}

fn run_resolve(
	args: &ResistCli,
	files: &[PathBuf],
	format: OutputFormat,
	strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = ResistConfig::load_or_default(&root)?;

	// Without reference data the run still succeeds; directives just
	// produce no tables.
	let reference = SharedReference::new(config.clone(), root.clone());
	match reference.get() {
		Ok(data) if args.verbose => print_loaded(data, &config, &root),
		Ok(_) => {}
		Err(error) => {
			eprintln!(
				"{} {error}, no tables will be produced",
				colored!("warning:", yellow)
			);
		}
	}

	let files = if files.is_empty() {
		collect_documents(&root, &config)?
	} else {
		files.to_vec()
	};

	let reports = resolve_files(&reference, &files)?;
	let unresolved = reports
		.iter()
		.flat_map(|report| &report.directives)
		.filter(|resolution| resolution.has_unresolved())
		.count();

	match format {
		OutputFormat::Json => print_reports_json(&reports, &root),
		OutputFormat::Text => print_reports_text(&reports, &root),
	}

	if strict && unresolved > 0 {
		process::exit(1);
	}

	Ok(())
}

fn print_reports_json(reports: &[DocumentReport], root: &Path) {
	let documents: Vec<serde_json::Value> = reports
		.iter()
		.map(|report| {
			serde_json::json!({
				"file": make_relative(&report.file, root),
				"directives": report.directives,
			})
		})
		.collect();
	println!("{}", serde_json::Value::Array(documents));
}

fn print_reports_text(reports: &[DocumentReport], root: &Path) {
	if reports.is_empty() {
		println!("No directives found.");
		return;
	}

	let mut directive_count = 0;
	let mut unresolved_count = 0;
	for report in reports {
		println!("{}", colored!(make_relative(&report.file, root), bold));
		for resolution in &report.directives {
			directive_count += 1;
			println!(
				"  {}:{} {}",
				resolution.line,
				resolution.column,
				resolution.component()
			);

			if resolution.data_source_id.is_none() {
				eprintln!(
					"  {} no data source available, the table will be empty",
					colored!("warning:", yellow)
				);
			}
			if resolution.has_unresolved() {
				unresolved_count += 1;
				print_unresolved("antibiotic", &resolution.unresolved_abx);
				print_unresolved("organism", &resolution.unresolved_org);
			}
		}
	}

	println!(
		"\nResolved {directive_count} directive(s) in {} file(s).",
		reports.len()
	);
	if unresolved_count > 0 {
		println!(
			"{}",
			colored!(
				format!("{unresolved_count} directive(s) contain unresolved tokens."),
				yellow
			)
		);
	}
}

fn print_unresolved(kind: &str, tokens: &[String]) {
	if tokens.is_empty() {
		return;
	}

	eprintln!(
		"  {} unresolved {kind} token(s): {}",
		colored!("warning:", yellow),
		tokens.join(", ")
	);
}

fn run_sources(args: &ResistCli, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let (config, data) = load_reference(args)?;
	let sources = data.sources();
	let default_id = data.select_source(None).map(|source| source.id.as_str());
	let locale = display_locale(&config);

	if sources.is_empty() {
		match format {
			OutputFormat::Json => println!("[]"),
			OutputFormat::Text => println!("No data sources configured."),
		}
		return Ok(());
	}

	let forest = source_forest(sources);
	match format {
		OutputFormat::Json => {
			let entries: Vec<serde_json::Value> = forest
				.iter()
				.map(|node| {
					serde_json::json!({
						"id": node.source.id,
						"parentId": node.source.parent_id,
						"year": node.source.year,
						"depth": node.depth,
						"name": node.source.name(locale),
						"file": node.source.source_file,
						"default": Some(node.source.id.as_str()) == default_id,
					})
				})
				.collect();
			println!("{}", serde_json::Value::Array(entries));
		}
		OutputFormat::Text => {
			println!("{}", colored!("Data sources:", bold));
			for node in &forest {
				let marker = if Some(node.source.id.as_str()) == default_id {
					format!(" {}", colored!("(default)", green))
				} else {
					String::new()
				};
				println!(
					"  {}{}{marker}",
					"  ".repeat(node.depth),
					source_label(node.source, locale)
				);
			}
			println!("\n{} source(s)", sources.len());
		}
	}

	Ok(())
}

fn run_table(
	args: &ResistCli,
	hint: Option<&str>,
	abx: Option<&str>,
	org: Option<&str>,
	format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
	let (config, data) = load_reference(args)?;
	let locale = display_locale(&config);
	let Some(source) = data.select_source(hint) else {
		return Err(ResistError::NoDataSource(hint.unwrap_or_default().to_string()).into());
	};

	// There is no page to detect names in, so `auto` resolves nothing.
	let abx = data.resolve_antibiotics(&split_param(abx.unwrap_or(ALL)), "");
	let org = data.resolve_organisms(&split_param(org.unwrap_or(ALL)), "");

	let mut rows: Vec<ResistanceRow> = data
		.merged_rows(&source.id)
		.into_iter()
		.filter(|row| {
			abx.resolved.contains(&row.antibiotic_id) && org.resolved.contains(&row.organism_id)
		})
		.collect();
	rows.sort_by(|a, b| {
		data.index()
			.org_rank(&a.organism_id)
			.cmp(data.index().org_rank(&b.organism_id))
	});

	match format {
		OutputFormat::Json => {
			let output = serde_json::json!({
				"source": source.id,
				"antibioticIds": abx.resolved,
				"organismIds": org.resolved,
				"unresolvedAbx": abx.unresolved,
				"unresolvedOrg": org.unresolved,
				"rows": rows,
			});
			println!("{output}");
		}
		OutputFormat::Text => {
			println!(
				"{} {}",
				colored!("Source:", bold),
				source_label(source, locale)
			);
			print_unresolved("antibiotic", &abx.unresolved);
			print_unresolved("organism", &org.unresolved);

			if rows.is_empty() {
				println!("No resistance rows match.");
				return Ok(());
			}

			println!();
			println!(
				"{:<12} {:<12} {:>10} {:>10} {}",
				"antibiotic", "organism", "resistant", "isolates", "from"
			);
			for row in &rows {
				println!(
					"{:<12} {:<12} {:>10} {:>10} {}",
					row.antibiotic_id,
					row.organism_id,
					row.resistance_pct
						.map_or_else(|| "-".to_string(), |pct| format!("{pct:.1}%")),
					row.n_isolates
						.map_or_else(|| "-".to_string(), |count| count.to_string()),
					row.source_id
				);
			}
			println!("\n{} row(s)", rows.len());
		}
	}

	Ok(())
}

fn run_lookup(
	args: &ResistCli,
	abx: Option<&str>,
	org: Option<&str>,
	text: Option<&str>,
	format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
	let (_, data) = load_reference(args)?;
	let page_text = text.map_or_else(String::new, |text| format!(" {text} "));

	let resolution: Resolution = match (abx, org) {
		(Some(abx), _) => data.resolve_antibiotics(&split_param(abx), &page_text),
		(None, Some(org)) => data.resolve_organisms(&split_param(org), &page_text),
		(None, None) => Resolution::default(),
	};

	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string(&resolution)?),
		OutputFormat::Text => {
			let resolved = if resolution.resolved.is_empty() {
				"none".to_string()
			} else {
				resolution.resolved.join(", ")
			};
			println!("{:<12} {}", "resolved:", colored!(resolved, green));
			if !resolution.unresolved.is_empty() {
				println!(
					"{:<12} {}",
					"unresolved:",
					colored!(resolution.unresolved.join(", "), yellow)
				);
			}
		}
	}

	Ok(())
}

/// The first configured locale names sources in output.
fn display_locale(config: &ResistConfig) -> &str {
	config.locales.first().map_or("de", String::as_str)
}

fn source_label(source: &Source, locale: &str) -> String {
	let mut label = source.id.clone();
	if let Some(year) = source.year {
		label.push_str(&format!(" ({year})"));
	}
	if let Some(name) = source.name(locale) {
		label.push_str(&format!(" {name}"));
	}

	label
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
