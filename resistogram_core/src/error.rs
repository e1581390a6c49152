use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum ResistError {
	#[error(transparent)]
	#[diagnostic(code(resistogram::io_error))]
	Io(#[from] std::io::Error),

	#[error("failure to load markdown: {0}")]
	#[diagnostic(code(resistogram::markdown))]
	Markdown(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(resistogram::config_parse),
		help("check that resistogram.toml is valid TOML with [files], [include] and/or [exclude] sections")
	)]
	ConfigParse(String),

	#[error("failed to read table `{path}`: {reason}")]
	#[diagnostic(code(resistogram::table_read))]
	TableRead { path: String, reason: String },

	#[error("reference data directory not found: `{0}`")]
	#[diagnostic(
		code(resistogram::data_dir_missing),
		help("set `data_dir` in resistogram.toml to the directory holding the reference tables")
	)]
	DataDirMissing(String),

	#[error("reference data unavailable")]
	#[diagnostic(
		code(resistogram::reference_unavailable),
		help("an earlier error prevented the reference tables from loading; directives render no table")
	)]
	ReferenceUnavailable,

	#[error("no data source matches `{0}`")]
	#[diagnostic(
		code(resistogram::no_data_source),
		help("run `resistogram sources` to list the configured data sources")
	)]
	NoDataSource(String),

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(resistogram::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },
}

pub type ResistResult<T> = Result<T, ResistError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
