use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::records::ResistanceRow;
use crate::records::Source;
use crate::sources::ancestor_chain;

/// Provides the resistance rows a single source defines itself, without
/// anything inherited from its ancestors.
pub trait ResistanceTables {
	fn rows_for(&self, source: &Source) -> Arc<[ResistanceRow]>;
}

/// Resistance tables held in memory, keyed by source id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTables {
	rows: HashMap<String, Arc<[ResistanceRow]>>,
}

impl InMemoryTables {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_rows(mut self, source_id: impl Into<String>, rows: Vec<ResistanceRow>) -> Self {
		self.insert(source_id, rows);
		self
	}

	pub fn insert(&mut self, source_id: impl Into<String>, rows: Vec<ResistanceRow>) {
		self.rows.insert(source_id.into(), Arc::from(rows));
	}
}

impl ResistanceTables for InMemoryTables {
	fn rows_for(&self, source: &Source) -> Arc<[ResistanceRow]> {
		self.rows
			.get(&source.id)
			.map_or_else(|| Arc::from(Vec::new()), Arc::clone)
	}
}

/// The effective resistance rows of the source `selected_id`.
///
/// Rows of every source on the ancestor chain are overlaid root first, keyed
/// by antibiotic and organism, so a more specific source replaces what its
/// ancestors say about the same pair. A replaced row keeps the position of
/// the row it replaced. Each row carries the id of the source it came from.
/// An unknown `selected_id` yields no rows.
pub fn merge_resistance_rows(
	selected_id: &str,
	sources: &[Source],
	tables: &(impl ResistanceTables + ?Sized),
) -> Vec<ResistanceRow> {
	let chain = ancestor_chain(selected_id, sources);
	if chain.is_empty() {
		tracing::warn!(source = %selected_id, "unknown data source, no resistance rows");
		return Vec::new();
	}

	let mut merged: IndexMap<String, ResistanceRow> = IndexMap::new();
	for source in chain {
		for row in tables.rows_for(source).iter() {
			let mut row = row.clone();
			row.source_id.clone_from(&source.id);
			merged.insert(row.key(), row);
		}
	}

	tracing::debug!(source = %selected_id, rows = merged.len(), "merged resistance rows");

	merged.into_values().collect()
}
