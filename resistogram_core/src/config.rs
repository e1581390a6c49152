use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::ResistError;
use crate::ResistResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"resistogram.toml",
	".resistogram.toml",
	".config/resistogram.toml",
];

/// Locales read from the reference tables when none are configured.
pub const DEFAULT_LOCALES: [&str; 2] = ["de", "en"];

/// Plugin instance id reported to the rendering layer by default.
pub const DEFAULT_PLUGIN_ID: &str = "default";

/// Configuration loaded from a `resistogram.toml` file.
///
/// ```toml
/// data_dir = "data"
/// locales = ["de", "en"]
/// plugin_id = "default"
///
/// [files]
/// antibiotics = "antibiotics.csv"
/// organisms = "organisms.csv"
/// sources = "data_sources.csv"
/// antibiotic_classes = "antibiotic_classes.csv"
/// organism_classes = "organism_classes.csv"
/// organism_groups = "organism_groups.csv"
///
/// [include]
/// patterns = ["docs/**/*.mdx"]
///
/// [exclude]
/// patterns = ["drafts/"]
/// disable_gitignore = false
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ResistConfig {
	/// Directory holding the reference tables, relative to the project root.
	#[serde(default = "default_data_dir")]
	pub data_dir: PathBuf,
	/// Locale suffixes read from `name_*`, `short_name_*`, `full_name_*` and
	/// `synonyms_*` columns. Order matters: earlier locales contribute their
	/// synonyms first.
	#[serde(default = "default_locales")]
	pub locales: Vec<String>,
	/// Identifier of this plugin instance, passed through to the rendered
	/// table component.
	#[serde(default = "default_plugin_id")]
	pub plugin_id: String,
	/// File names of the reference tables inside `data_dir`.
	#[serde(default)]
	pub files: FilesConfig,
	/// Glob patterns restricting which documents are scanned.
	#[serde(default)]
	pub include: IncludeConfig,
	/// Gitignore-style patterns for documents to skip.
	#[serde(default)]
	pub exclude: ExcludeConfig,
}

impl Default for ResistConfig {
	fn default() -> Self {
		Self {
			data_dir: default_data_dir(),
			locales: default_locales(),
			plugin_id: default_plugin_id(),
			files: FilesConfig::default(),
			include: IncludeConfig::default(),
			exclude: ExcludeConfig::default(),
		}
	}
}

fn default_data_dir() -> PathBuf {
	PathBuf::from("data")
}

fn default_locales() -> Vec<String> {
	DEFAULT_LOCALES.iter().map(ToString::to_string).collect()
}

fn default_plugin_id() -> String {
	DEFAULT_PLUGIN_ID.to_string()
}

/// Names of the reference table files.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilesConfig {
	pub antibiotics: PathBuf,
	pub organisms: PathBuf,
	pub sources: PathBuf,
	pub antibiotic_classes: PathBuf,
	pub organism_classes: PathBuf,
	pub organism_groups: PathBuf,
}

impl Default for FilesConfig {
	fn default() -> Self {
		Self {
			antibiotics: PathBuf::from("antibiotics.csv"),
			organisms: PathBuf::from("organisms.csv"),
			sources: PathBuf::from("data_sources.csv"),
			antibiotic_classes: PathBuf::from("antibiotic_classes.csv"),
			organism_classes: PathBuf::from("organism_classes.csv"),
			organism_groups: PathBuf::from("organism_groups.csv"),
		}
	}
}

/// Configuration for restricting which documents are scanned.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncludeConfig {
	/// Glob patterns relative to the project root. When empty, every
	/// markdown document is scanned.
	#[serde(default)]
	pub patterns: Vec<String>,
}

/// Configuration for excluding documents and directories from scanning.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeConfig {
	/// Gitignore-style patterns relative to the project root, applied on top
	/// of `.gitignore`.
	///
	/// Examples: `"build/"`, `"drafts/*.md"`, `"!drafts/keep.md"`.
	#[serde(default)]
	pub patterns: Vec<String>,
	/// When true, `.gitignore` files are not used for filtering.
	#[serde(default)]
	pub disable_gitignore: bool,
}

impl ResistConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> ResistResult<Option<ResistConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: ResistConfig =
			toml::from_str(&content).map_err(|e| ResistError::ConfigParse(e.to_string()))?;

		Ok(Some(config))
	}

	/// Load the discovered config or fall back to defaults.
	pub fn load_or_default(root: &Path) -> ResistResult<ResistConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}

	/// Absolute path of the reference data directory.
	pub fn data_path(&self, root: &Path) -> PathBuf {
		root.join(&self.data_dir)
	}
}
