use derive_more::Deref;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use crate::sources::HINT_LOCALE;

/// A raw table row: column header to cell value, in column order.
pub type Row = IndexMap<String, String>;

/// Read a trimmed, non-empty cell from a row.
pub(crate) fn cell(row: &Row, column: &str) -> Option<String> {
	row.get(column)
		.map(|value| value.trim())
		.filter(|value| !value.is_empty())
		.map(ToString::to_string)
}

/// The canonical identifier of a row: `amr_code`, falling back to `id`.
fn row_id(row: &Row) -> Option<String> {
	cell(row, "amr_code").or_else(|| cell(row, "id"))
}

/// Translatable name fields for a single locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedNames {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub short_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub full_name: Option<String>,
	/// Raw synonym list, separated by `;` or `,`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub synonyms: Option<String>,
}

impl LocalizedNames {
	fn from_row(row: &Row, locale: &str) -> Self {
		Self {
			name: cell(row, &format!("name_{locale}")),
			short_name: cell(row, &format!("short_name_{locale}")),
			full_name: cell(row, &format!("full_name_{locale}")),
			synonyms: cell(row, &format!("synonyms_{locale}")),
		}
	}

	pub fn full(value: impl Into<String>) -> Self {
		Self {
			full_name: Some(value.into()),
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_short(mut self, value: impl Into<String>) -> Self {
		self.short_name = Some(value.into());
		self
	}

	#[must_use]
	pub fn with_synonyms(mut self, value: impl Into<String>) -> Self {
		self.synonyms = Some(value.into());
		self
	}

	#[must_use]
	pub fn with_name(mut self, value: impl Into<String>) -> Self {
		self.name = Some(value.into());
		self
	}

	pub fn is_empty(&self) -> bool {
		self.name.is_none()
			&& self.short_name.is_none()
			&& self.full_name.is_none()
			&& self.synonyms.is_none()
	}

	/// Field values in the order they contribute synonyms.
	pub fn values(&self) -> impl Iterator<Item = &str> {
		[
			&self.synonyms,
			&self.full_name,
			&self.short_name,
			&self.name,
		]
		.into_iter()
		.filter_map(Option::as_deref)
	}

	/// The most descriptive display label.
	pub fn label(&self) -> Option<&str> {
		self.full_name
			.as_deref()
			.or(self.name.as_deref())
			.or(self.short_name.as_deref())
	}

	/// The shortest display label.
	pub fn short_label(&self) -> Option<&str> {
		self.short_name.as_deref().or_else(|| self.label())
	}
}

/// Per-locale names of a record, keyed by locale in configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref)]
pub struct Names(IndexMap<String, LocalizedNames>);

impl Names {
	/// Read the name columns for each configured locale. Locales without any
	/// value are left out.
	pub fn from_row(row: &Row, locales: &[String]) -> Self {
		let names = locales
			.iter()
			.map(|locale| (locale.clone(), LocalizedNames::from_row(row, locale)))
			.filter(|(_, names)| !names.is_empty())
			.collect();

		Self(names)
	}

	#[must_use]
	pub fn with(mut self, locale: impl Into<String>, names: LocalizedNames) -> Self {
		self.0.insert(locale.into(), names);
		self
	}

	/// Display label for `locale`, falling back to the first locale that
	/// has one.
	pub fn label(&self, locale: &str) -> Option<&str> {
		self.0
			.get(locale)
			.and_then(LocalizedNames::label)
			.or_else(|| self.0.values().find_map(LocalizedNames::label))
	}

	/// Short display label for `locale`, with the same fallback as
	/// [`Names::label`].
	pub fn short_label(&self, locale: &str) -> Option<&str> {
		self.0
			.get(locale)
			.and_then(LocalizedNames::short_label)
			.or_else(|| self.0.values().find_map(LocalizedNames::short_label))
	}
}

/// An antibiotic or organism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
	/// Canonical identifier (`amr_code`).
	pub id: String,
	/// Class membership: `class` for antibiotics, `class_id` for organisms.
	pub class_id: Option<String>,
	/// Flat group tags, organisms only.
	#[serde(default)]
	pub groups: Vec<String>,
	#[serde(default)]
	pub names: Names,
}

impl EntityRecord {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			class_id: None,
			groups: Vec::new(),
			names: Names::default(),
		}
	}

	#[must_use]
	pub fn in_class(mut self, class_id: impl Into<String>) -> Self {
		self.class_id = Some(class_id.into());
		self
	}

	#[must_use]
	pub fn in_groups<I, S>(mut self, groups: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.groups = groups.into_iter().map(Into::into).collect();
		self
	}

	#[must_use]
	pub fn named(mut self, locale: impl Into<String>, names: LocalizedNames) -> Self {
		self.names = self.names.with(locale, names);
		self
	}

	/// Build an antibiotic from a table row. Rows without an identifier are
	/// skipped.
	pub fn antibiotic_from_row(row: &Row, locales: &[String]) -> Option<Self> {
		Some(Self {
			id: row_id(row)?,
			class_id: cell(row, "class"),
			groups: Vec::new(),
			names: Names::from_row(row, locales),
		})
	}

	/// Build an organism from a table row. Rows without an identifier are
	/// skipped.
	pub fn organism_from_row(row: &Row, locales: &[String]) -> Option<Self> {
		let groups = cell(row, "groups")
			.map(|groups| {
				groups
					.split(';')
					.map(str::trim)
					.filter(|group| !group.is_empty())
					.map(ToString::to_string)
					.collect()
			})
			.unwrap_or_default();

		Some(Self {
			id: row_id(row)?,
			class_id: cell(row, "class_id"),
			groups,
			names: Names::from_row(row, locales),
		})
	}
}

/// A node of an antibiotic or organism class tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
	pub id: String,
	/// Parent class; `None` for roots.
	pub parent_id: Option<String>,
	#[serde(default)]
	pub names: Names,
}

impl ClassRecord {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			parent_id: None,
			names: Names::default(),
		}
	}

	#[must_use]
	pub fn under(mut self, parent_id: impl Into<String>) -> Self {
		self.parent_id = Some(parent_id.into());
		self
	}

	#[must_use]
	pub fn named(mut self, locale: impl Into<String>, names: LocalizedNames) -> Self {
		self.names = self.names.with(locale, names);
		self
	}

	pub fn from_row(row: &Row, locales: &[String]) -> Option<Self> {
		Some(Self {
			id: row_id(row)?,
			parent_id: cell(row, "parent_id"),
			names: Names::from_row(row, locales),
		})
	}
}

/// A flat organism group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
	pub id: String,
	#[serde(default)]
	pub names: Names,
}

impl GroupRecord {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			names: Names::default(),
		}
	}

	#[must_use]
	pub fn named(mut self, locale: impl Into<String>, names: LocalizedNames) -> Self {
		self.names = self.names.with(locale, names);
		self
	}

	pub fn from_row(row: &Row, locales: &[String]) -> Option<Self> {
		Some(Self {
			id: row_id(row)?,
			names: Names::from_row(row, locales),
		})
	}
}

/// Display labels of a data source for a single locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLabels {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub long_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub short_name: Option<String>,
}

impl SourceLabels {
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			..Self::default()
		}
	}
}

/// A dataset version, possibly nested under a broader dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
	pub id: String,
	pub parent_id: Option<String>,
	/// Publication year; `None` when missing or not a number.
	pub year: Option<i32>,
	/// File name of this source's own resistance table.
	pub source_file: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(default)]
	pub labels: IndexMap<String, SourceLabels>,
}

impl Source {
	pub fn new(id: impl Into<String>, year: Option<i32>) -> Self {
		let id = id.into();
		Self {
			source_file: format!("{id}.csv"),
			id,
			parent_id: None,
			year,
			url: None,
			labels: IndexMap::new(),
		}
	}

	#[must_use]
	pub fn under(mut self, parent_id: impl Into<String>) -> Self {
		self.parent_id = Some(parent_id.into());
		self
	}

	#[must_use]
	pub fn with_file(mut self, source_file: impl Into<String>) -> Self {
		self.source_file = source_file.into();
		self
	}

	#[must_use]
	pub fn labelled(mut self, locale: impl Into<String>, labels: SourceLabels) -> Self {
		self.labels.insert(locale.into(), labels);
		self
	}

	/// Read a source row. Labels are read for each configured locale and
	/// always for [`HINT_LOCALE`], whose name source hints are matched
	/// against.
	pub fn from_row(row: &Row, locales: &[String]) -> Option<Self> {
		let mut label_locales: Vec<&str> = locales.iter().map(String::as_str).collect();
		if !label_locales.contains(&HINT_LOCALE) {
			label_locales.push(HINT_LOCALE);
		}

		let labels = label_locales
			.into_iter()
			.map(|locale| {
				let labels = SourceLabels {
					name: cell(row, &format!("name_{locale}")),
					long_name: cell(row, &format!("source_long_name_{locale}")),
					short_name: cell(row, &format!("source_short_name_{locale}")),
				};
				(locale.to_string(), labels)
			})
			.filter(|(_, labels)| *labels != SourceLabels::default())
			.collect();

		Some(Self {
			id: cell(row, "id")?,
			parent_id: cell(row, "parent_id"),
			year: cell(row, "year").and_then(|year| year.parse().ok()),
			source_file: cell(row, "source_file").unwrap_or_default(),
			url: cell(row, "source_url"),
			labels,
		})
	}

	/// The display name for `locale`, if the source has one.
	pub fn name(&self, locale: &str) -> Option<&str> {
		self.labels
			.get(locale)
			.and_then(|labels| labels.name.as_deref())
	}
}

/// A resistance measurement for one antibiotic/organism pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResistanceRow {
	pub antibiotic_id: String,
	pub organism_id: String,
	/// Percentage of resistant isolates; `None` when the cell is not numeric.
	pub resistance_pct: Option<f64>,
	/// Number of tested isolates; `None` when the cell is not numeric.
	pub n_isolates: Option<u32>,
	/// The source this row was read from.
	pub source_id: String,
	/// Remaining columns, passed through untouched.
	#[serde(flatten)]
	pub extra: IndexMap<String, String>,
}

impl ResistanceRow {
	pub fn new(
		antibiotic_id: impl Into<String>,
		organism_id: impl Into<String>,
		resistance_pct: Option<f64>,
	) -> Self {
		Self {
			antibiotic_id: antibiotic_id.into(),
			organism_id: organism_id.into(),
			resistance_pct,
			n_isolates: None,
			source_id: String::new(),
			extra: IndexMap::new(),
		}
	}

	#[must_use]
	pub fn with_isolates(mut self, n_isolates: u32) -> Self {
		self.n_isolates = Some(n_isolates);
		self
	}

	pub fn from_row(row: &Row) -> Self {
		let extra = row
			.iter()
			.filter(|(column, _)| {
				!matches!(
					column.as_str(),
					"antibiotic_id" | "organism_id" | "resistance_pct" | "n_isolates" | "source_id"
				)
			})
			.map(|(column, value)| (column.clone(), value.clone()))
			.collect();

		Self {
			antibiotic_id: cell(row, "antibiotic_id").unwrap_or_default(),
			organism_id: cell(row, "organism_id").unwrap_or_default(),
			resistance_pct: row
				.get("resistance_pct")
				.map(String::as_str)
				.and_then(parse_number),
			n_isolates: row
				.get("n_isolates")
				.map(String::as_str)
				.and_then(parse_count),
			source_id: String::new(),
			extra,
		}
	}

	/// Merge key: `antibiotic-organism`.
	pub fn key(&self) -> String {
		format!("{}-{}", self.antibiotic_id, self.organism_id)
	}
}

/// Coerce a numeric cell. Non-numeric values become `None` rather than an
/// error. A trailing `%` is tolerated.
pub fn parse_number(value: &str) -> Option<f64> {
	let value = value.trim();
	let value = value.strip_suffix('%').unwrap_or(value).trim_end();
	value.parse::<f64>().ok().filter(|number| number.is_finite())
}

/// Coerce an isolate count cell. Fractions are truncated, negative or
/// non-numeric values become `None`.
pub fn parse_count(value: &str) -> Option<u32> {
	parse_number(value)
		.filter(|number| *number >= 0.0 && *number <= f64::from(u32::MAX))
		.map(|number| number as u32)
}

/// All reference tables, already converted into typed records. Order
/// matches the order rows were read in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTables {
	pub antibiotics: Vec<EntityRecord>,
	pub organisms: Vec<EntityRecord>,
	pub antibiotic_classes: Vec<ClassRecord>,
	pub organism_classes: Vec<ClassRecord>,
	pub organism_groups: Vec<GroupRecord>,
	pub sources: Vec<Source>,
}

impl ReferenceTables {
	/// Convert raw rows using the configured locale list.
	pub fn from_rows(raw: &RawTables, locales: &[String]) -> Self {
		Self {
			antibiotics: raw
				.antibiotics
				.iter()
				.filter_map(|row| EntityRecord::antibiotic_from_row(row, locales))
				.collect(),
			organisms: raw
				.organisms
				.iter()
				.filter_map(|row| EntityRecord::organism_from_row(row, locales))
				.collect(),
			antibiotic_classes: raw
				.antibiotic_classes
				.iter()
				.filter_map(|row| ClassRecord::from_row(row, locales))
				.collect(),
			organism_classes: raw
				.organism_classes
				.iter()
				.filter_map(|row| ClassRecord::from_row(row, locales))
				.collect(),
			organism_groups: raw
				.organism_groups
				.iter()
				.filter_map(|row| GroupRecord::from_row(row, locales))
				.collect(),
			sources: raw
				.sources
				.iter()
				.filter_map(|row| Source::from_row(row, locales))
				.collect(),
		}
	}

	pub fn organism(&self, id: &str) -> Option<&EntityRecord> {
		self.organisms.iter().find(|record| record.id == id)
	}

	pub fn source(&self, id: &str) -> Option<&Source> {
		self.sources.iter().find(|source| source.id == id)
	}
}

/// Reference tables as raw rows, before typing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTables {
	pub antibiotics: Vec<Row>,
	pub organisms: Vec<Row>,
	pub antibiotic_classes: Vec<Row>,
	pub organism_classes: Vec<Row>,
	pub organism_groups: Vec<Row>,
	pub sources: Vec<Row>,
}
