use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use csv::ReaderBuilder;
use csv::Trim;

use crate::ResistError;
use crate::ResistResult;
use crate::config::ResistConfig;
use crate::merge::ResistanceTables;
use crate::records::RawTables;
use crate::records::ReferenceTables;
use crate::records::ResistanceRow;
use crate::records::Row;
use crate::records::Source;

/// Read a CSV file with a header row into raw rows.
pub fn read_rows(path: &Path) -> ResistResult<Vec<Row>> {
	let file = std::fs::File::open(path).map_err(|e| table_error(path, &e))?;
	rows_from_reader(file, &path.display().to_string())
}

/// Parse CSV text with a header row into raw rows.
pub fn parse_rows(content: &str) -> ResistResult<Vec<Row>> {
	rows_from_reader(content.as_bytes(), "<inline>")
}

fn rows_from_reader(input: impl Read, path_display: &str) -> ResistResult<Vec<Row>> {
	let mut reader = ReaderBuilder::new()
		.trim(Trim::All)
		.flexible(true)
		.from_reader(input);

	let headers: Vec<String> = reader
		.headers()
		.map_err(|e| ResistError::TableRead {
			path: path_display.to_string(),
			reason: e.to_string(),
		})?
		.iter()
		.map(|header| header.trim_start_matches('\u{feff}').to_string())
		.collect();

	let mut rows = Vec::new();
	for (idx, record) in reader.records().enumerate() {
		let record = record.map_err(|e| ResistError::TableRead {
			path: path_display.to_string(),
			reason: format!("row {}: {e}", idx + 1),
		})?;

		if record.iter().all(str::is_empty) {
			continue;
		}

		let row: Row = headers
			.iter()
			.zip(record.iter())
			.map(|(header, value)| (header.clone(), value.to_string()))
			.collect();
		rows.push(row);
	}

	Ok(rows)
}

fn table_error(path: &Path, error: &impl std::fmt::Display) -> ResistError {
	ResistError::TableRead {
		path: path.display().to_string(),
		reason: error.to_string(),
	}
}

/// Read a table, treating any failure as an empty table. The failure is
/// logged once here and not surfaced to callers.
pub fn read_rows_or_empty(path: &Path) -> Vec<Row> {
	match read_rows(path) {
		Ok(rows) => rows,
		Err(error) => {
			tracing::error!(path = %path.display(), %error, "failed to load reference table");
			Vec::new()
		}
	}
}

/// Load every reference table named in `config`.
///
/// Missing or unreadable tables become empty; only a missing data directory
/// is an error.
pub fn load_reference_tables(config: &ResistConfig, root: &Path) -> ResistResult<ReferenceTables> {
	let dir = config.data_path(root);
	if !dir.is_dir() {
		return Err(ResistError::DataDirMissing(dir.display().to_string()));
	}

	let files = &config.files;
	let raw = RawTables {
		antibiotics: read_rows_or_empty(&dir.join(&files.antibiotics)),
		organisms: read_rows_or_empty(&dir.join(&files.organisms)),
		antibiotic_classes: read_rows_or_empty(&dir.join(&files.antibiotic_classes)),
		organism_classes: read_rows_or_empty(&dir.join(&files.organism_classes)),
		organism_groups: read_rows_or_empty(&dir.join(&files.organism_groups)),
		sources: read_rows_or_empty(&dir.join(&files.sources)),
	};

	let tables = ReferenceTables::from_rows(&raw, &config.locales);
	tracing::debug!(
		antibiotics = tables.antibiotics.len(),
		organisms = tables.organisms.len(),
		sources = tables.sources.len(),
		"loaded reference tables"
	);

	Ok(tables)
}

/// Resistance tables read lazily from CSV files in a data directory. Each
/// file is read at most once; later requests share the cached rows.
#[derive(Debug)]
pub struct CsvResistanceTables {
	dir: PathBuf,
	cache: Mutex<HashMap<String, Arc<[ResistanceRow]>>>,
}

impl CsvResistanceTables {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: dir.into(),
			cache: Mutex::new(HashMap::new()),
		}
	}

	/// Number of files read so far.
	pub fn cached_files(&self) -> usize {
		self.cache
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.len()
	}
}

impl ResistanceTables for CsvResistanceTables {
	fn rows_for(&self, source: &Source) -> Arc<[ResistanceRow]> {
		if source.source_file.is_empty() {
			return Arc::from(Vec::new());
		}

		// The lock is held across the read so concurrent callers never load the
		// same file twice.
		let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
		if let Some(rows) = cache.get(&source.source_file) {
			return Arc::clone(rows);
		}

		let rows: Arc<[ResistanceRow]> = read_rows_or_empty(&self.dir.join(&source.source_file))
			.iter()
			.map(ResistanceRow::from_row)
			.collect();
		cache.insert(source.source_file.clone(), Arc::clone(&rows));

		rows
	}
}
