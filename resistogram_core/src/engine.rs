use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Serialize;

use crate::ResistError;
use crate::ResistResult;
use crate::config::ResistConfig;
use crate::directive::ABX_PARAM;
use crate::directive::Directive;
use crate::directive::ORG_PARAM;
use crate::directive::SOURCE_PARAM;
use crate::directive::parse_document;
use crate::lexer::DirectiveParams;
use crate::merge::ResistanceTables;
use crate::merge::merge_resistance_rows;
use crate::records::ReferenceTables;
use crate::records::ResistanceRow;
use crate::records::Source;
use crate::resolver::Resolution;
use crate::resolver::resolve_tokens;
use crate::sources::select_data_source;
use crate::synonyms::ReferenceIndex;
use crate::tables::CsvResistanceTables;
use crate::tables::load_reference_tables;

/// Name of the component the rendering layer emits for each directive.
pub const TABLE_COMPONENT: &str = "ResistanceTable";

/// Everything directive resolution reads: the reference tables, the indices
/// built from them and access to per-source resistance rows.
///
/// Built once and then only read, so it can be shared across threads.
pub struct ReferenceData {
	tables: ReferenceTables,
	index: ReferenceIndex,
	resistance: Box<dyn ResistanceTables + Send + Sync>,
	plugin_id: String,
}

impl fmt::Debug for ReferenceData {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReferenceData")
			.field("tables", &self.tables)
			.field("index", &self.index)
			.field("plugin_id", &self.plugin_id)
			.finish_non_exhaustive()
	}
}

impl ReferenceData {
	/// Build the indices for `tables`.
	pub fn new(
		tables: ReferenceTables,
		resistance: impl ResistanceTables + Send + Sync + 'static,
	) -> Self {
		let index = ReferenceIndex::build(&tables);

		Self {
			tables,
			index,
			resistance: Box::new(resistance),
			plugin_id: crate::config::DEFAULT_PLUGIN_ID.to_string(),
		}
	}

	#[must_use]
	pub fn with_plugin_id(mut self, plugin_id: impl Into<String>) -> Self {
		self.plugin_id = plugin_id.into();
		self
	}

	/// Load the configured data directory under `root`.
	pub fn load(config: &ResistConfig, root: &Path) -> ResistResult<Self> {
		let tables = load_reference_tables(config, root)?;
		let resistance = CsvResistanceTables::new(config.data_path(root));

		Ok(Self::new(tables, resistance).with_plugin_id(config.plugin_id.clone()))
	}

	pub fn tables(&self) -> &ReferenceTables {
		&self.tables
	}

	pub fn index(&self) -> &ReferenceIndex {
		&self.index
	}

	pub fn plugin_id(&self) -> &str {
		&self.plugin_id
	}

	pub fn sources(&self) -> &[Source] {
		&self.tables.sources
	}

	/// Resolve antibiotic request tokens against the antibiotic index.
	pub fn resolve_antibiotics(&self, tokens: &[String], page_text: &str) -> Resolution {
		resolve_tokens(
			tokens,
			&self.index.all_abx_ids,
			&self.index.antibiotics,
			page_text,
		)
	}

	/// Resolve organism request tokens against the organism index.
	pub fn resolve_organisms(&self, tokens: &[String], page_text: &str) -> Resolution {
		resolve_tokens(
			tokens,
			&self.index.all_org_ids,
			&self.index.organisms,
			page_text,
		)
	}

	/// The best source for `hint`; see [`select_data_source`].
	pub fn select_source(&self, hint: Option<&str>) -> Option<&Source> {
		select_data_source(hint, &self.tables.sources)
	}

	/// Resolve a single directive against the shared indices.
	pub fn resolve_directive(&self, directive: &Directive, page_text: &str) -> DirectiveResolution {
		let abx = self.resolve_antibiotics(directive.param(ABX_PARAM).unwrap_or_default(), page_text);
		let org = self.resolve_organisms(directive.param(ORG_PARAM).unwrap_or_default(), page_text);
		let hint = directive.param_value(SOURCE_PARAM);
		let source = self.select_source(hint.as_deref());

		tracing::debug!(
			directive = %directive.raw,
			antibiotics = abx.resolved.len(),
			organisms = org.resolved.len(),
			source = source.map(|source| source.id.as_str()),
			"resolved directive"
		);

		DirectiveResolution {
			antibiotic_ids: abx.resolved,
			organism_ids: org.resolved,
			unresolved_abx: abx.unresolved,
			unresolved_org: org.unresolved,
			data_source_id: source.map(|source| source.id.clone()),
			plugin_id: self.plugin_id.clone(),
			params: directive.params.clone(),
			before: directive.before.clone(),
			after: directive.after.clone(),
			line: directive.line,
			column: directive.column,
		}
	}

	/// Resolve every directive of a markdown document, in document order.
	pub fn resolve_document(&self, content: &str) -> ResistResult<Vec<DirectiveResolution>> {
		let document = parse_document(content)?;

		Ok(document
			.directives
			.iter()
			.map(|directive| self.resolve_directive(directive, &document.page_text))
			.collect())
	}

	/// Effective resistance rows of the source with `source_id`, ancestors
	/// included.
	pub fn merged_rows(&self, source_id: &str) -> Vec<ResistanceRow> {
		merge_resistance_rows(source_id, &self.tables.sources, self.resistance.as_ref())
	}

	/// The rows a resolved directive's table shows: the merged rows of its
	/// source restricted to its antibiotics and organisms.
	pub fn table_rows(&self, resolution: &DirectiveResolution) -> Vec<ResistanceRow> {
		let Some(source_id) = resolution.data_source_id.as_deref() else {
			return Vec::new();
		};

		self.merged_rows(source_id)
			.into_iter()
			.filter(|row| {
				resolution.antibiotic_ids.contains(&row.antibiotic_id)
					&& resolution.organism_ids.contains(&row.organism_id)
			})
			.collect()
	}
}

/// What the rendering layer needs to draw one directive's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveResolution {
	pub antibiotic_ids: Vec<String>,
	pub organism_ids: Vec<String>,
	pub unresolved_abx: Vec<String>,
	pub unresolved_org: Vec<String>,
	/// `None` only when there are no sources at all.
	pub data_source_id: Option<String>,
	pub plugin_id: String,
	/// Directive parameters, passed through untouched.
	pub params: DirectiveParams,
	/// Prose sharing the directive's paragraph.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub before: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub after: Option<String>,
	pub line: usize,
	pub column: usize,
}

impl DirectiveResolution {
	/// Whether a table can be drawn for this directive.
	pub fn has_table(&self) -> bool {
		self.data_source_id.is_some()
	}

	/// Whether any request token could not be resolved.
	pub fn has_unresolved(&self) -> bool {
		!self.unresolved_abx.is_empty() || !self.unresolved_org.is_empty()
	}

	/// Component attributes in the order the rendering layer expects. Id
	/// lists are JSON arrays; passthrough parameters follow the fixed
	/// attributes with their tokens joined by commas.
	pub fn attributes(&self) -> Vec<(String, String)> {
		let mut attributes = vec![
			("antibioticIds".to_string(), json_list(&self.antibiotic_ids)),
			("organismIds".to_string(), json_list(&self.organism_ids)),
			("unresolvedAbx".to_string(), json_list(&self.unresolved_abx)),
			("unresolvedOrg".to_string(), json_list(&self.unresolved_org)),
			(
				"dataSourceId".to_string(),
				self.data_source_id.clone().unwrap_or_default(),
			),
			("pluginId".to_string(), self.plugin_id.clone()),
		];
		attributes.extend(
			self.params
				.iter()
				.map(|(key, tokens)| (key.clone(), tokens.join(","))),
		);

		attributes
	}

	/// The table component as markup, e.g.
	/// `<ResistanceTable antibioticIds='["AMX"]' ... />`.
	pub fn component(&self) -> String {
		let mut markup = format!("<{TABLE_COMPONENT}");
		for (name, value) in self.attributes() {
			let value = value.replace('&', "&amp;").replace('\'', "&#39;");
			markup.push_str(&format!(" {name}='{value}'"));
		}
		markup.push_str(" />");

		markup
	}
}

fn json_list(values: &[String]) -> String {
	serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

type Loader = Box<dyn Fn() -> ResistResult<ReferenceData> + Send + Sync>;

/// Reference data loaded on first use and shared by every later caller.
///
/// The loader runs at most once, even when several threads ask for the data
/// at the same time. A failed load is logged once and every caller then sees
/// [`ResistError::ReferenceUnavailable`].
pub struct SharedReference {
	cell: OnceLock<Option<ReferenceData>>,
	loader: Loader,
}

impl fmt::Debug for SharedReference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SharedReference")
			.field("cell", &self.cell)
			.finish_non_exhaustive()
	}
}

impl SharedReference {
	/// Share the data configured in `config` for the project at `root`.
	pub fn new(config: ResistConfig, root: impl Into<PathBuf>) -> Self {
		let root = root.into();
		Self::with_loader(move || ReferenceData::load(&config, &root))
	}

	pub fn with_loader(
		loader: impl Fn() -> ResistResult<ReferenceData> + Send + Sync + 'static,
	) -> Self {
		Self {
			cell: OnceLock::new(),
			loader: Box::new(loader),
		}
	}

	/// The shared data, loading it if this is the first request.
	pub fn get(&self) -> ResistResult<&ReferenceData> {
		self.cell
			.get_or_init(|| match (self.loader)() {
				Ok(data) => Some(data),
				Err(error) => {
					tracing::error!(%error, "failed to load reference data");
					None
				}
			})
			.as_ref()
			.ok_or(ResistError::ReferenceUnavailable)
	}

	/// Resolve a document's directives. Without reference data no directive
	/// produces a table, so the result is empty rather than an error.
	pub fn resolve_document(&self, content: &str) -> ResistResult<Vec<DirectiveResolution>> {
		let Ok(data) = self.get() else {
			return Ok(Vec::new());
		};

		data.resolve_document(content)
	}
}
