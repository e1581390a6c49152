use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::OnceLock;

use derive_more::Deref;
use indexmap::IndexMap;
use indexmap::IndexSet;
use serde::Serialize;

use crate::matcher::RegexMatcher;
use crate::records::ClassRecord;
use crate::records::EntityRecord;
use crate::records::Names;
use crate::records::ReferenceTables;

/// Rank given to organisms without a ranked class.
pub const UNRANKED: &str = "99";

/// Synonym to canonical identifiers, in insertion order.
///
/// Re-registering an existing synonym keeps its original position and only
/// replaces (or extends) its identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deref)]
pub struct SynonymMap(IndexMap<String, Vec<String>>);

impl SynonymMap {
	/// Map `synonym` to exactly `ids`, replacing what was there.
	pub fn set(&mut self, synonym: impl Into<String>, ids: Vec<String>) {
		self.0.insert(synonym.into(), ids);
	}

	/// Union `ids` into whatever `synonym` already maps to. Existing ids keep
	/// their position; duplicates are dropped.
	pub fn merge(&mut self, synonym: impl Into<String>, ids: &[String]) {
		let entry = self.0.entry(synonym.into()).or_default();
		for id in ids {
			if !entry.contains(id) {
				entry.push(id.clone());
			}
		}
	}

	pub fn ids(&self, synonym: &str) -> Option<&[String]> {
		self.0.get(synonym).map(Vec::as_slice)
	}

	/// The identifiers of `synonym` joined with commas.
	pub fn joined(&self, synonym: &str) -> Option<String> {
		self.0.get(synonym).map(|ids| ids.join(","))
	}
}

/// A synonym map together with its case-folded lookup table and the
/// compiled patterns used to detect its synonyms in page text.
#[derive(Debug, Clone, Default)]
pub struct SynonymIndex {
	map: SynonymMap,
	folded: HashMap<String, Vec<String>>,
	matcher: OnceLock<RegexMatcher>,
}

impl PartialEq for SynonymIndex {
	fn eq(&self, other: &Self) -> bool {
		self.map == other.map
	}
}

impl Eq for SynonymIndex {}

impl SynonymIndex {
	pub fn new(map: SynonymMap) -> Self {
		let mut folded = HashMap::with_capacity(map.len());
		for (synonym, ids) in map.iter() {
			folded.insert(synonym.to_lowercase(), ids.clone());
		}

		Self {
			map,
			folded,
			matcher: OnceLock::new(),
		}
	}

	pub fn map(&self) -> &SynonymMap {
		&self.map
	}

	/// The matcher for this index's synonyms. Patterns are compiled on first
	/// use and shared by every later directive.
	pub fn matcher(&self) -> &RegexMatcher {
		self.matcher
			.get_or_init(|| RegexMatcher::for_synonyms(&self.map))
	}

	/// Case-insensitive lookup. When several synonyms fold to the same key
	/// the one registered last wins.
	pub fn lookup(&self, token: &str) -> Option<&[String]> {
		self.folded.get(&token.to_lowercase()).map(Vec::as_slice)
	}

	pub fn len(&self) -> usize {
		self.map.len()
	}

	pub fn is_empty(&self) -> bool {
		self.map.is_empty()
	}
}

/// Every synonym of a record: its identifier plus each name field of each
/// locale, split on `;` and `,`. Dotted names also contribute their
/// dot-stripped form.
pub fn collect_synonyms(id: &str, names: &Names) -> IndexSet<String> {
	let mut synonyms = IndexSet::new();
	let mut add = |value: &str| {
		for part in value.split([';', ',']) {
			let trimmed = part.trim();
			if trimmed.is_empty() {
				continue;
			}
			synonyms.insert(trimmed.to_string());
			let without_dots = trimmed.replace('.', "");
			if without_dots != trimmed {
				synonyms.insert(without_dots);
			}
		}
	};

	add(id);
	for localized in names.values() {
		for value in localized.values() {
			add(value);
		}
	}

	synonyms
}

/// Map every synonym of every record to that record's own identifier.
pub fn direct_synonym_map(records: &[EntityRecord]) -> SynonymMap {
	let mut map = SynonymMap::default();
	for record in records {
		for synonym in collect_synonyms(&record.id, &record.names) {
			map.set(synonym, vec![record.id.clone()]);
		}
	}

	map
}

/// Parent id to child classes in row order. Roots are keyed by `""`.
fn class_children(classes: &[ClassRecord]) -> HashMap<&str, Vec<&ClassRecord>> {
	let mut children: HashMap<&str, Vec<&ClassRecord>> = HashMap::new();
	for class in classes {
		children
			.entry(class.parent_id.as_deref().unwrap_or(""))
			.or_default()
			.push(class);
	}

	children
}

/// Assign dotted, zero-padded ranks ("01.02.03") reflecting document order
/// among siblings at every level of the class forest.
pub fn class_ranks(classes: &[ClassRecord]) -> HashMap<String, String> {
	fn assign(
		children: &HashMap<&str, Vec<&ClassRecord>>,
		parent_id: &str,
		prefix: &str,
		ranks: &mut HashMap<String, String>,
	) {
		let Some(siblings) = children.get(parent_id) else {
			return;
		};

		for (index, class) in siblings.iter().enumerate() {
			let position = format!("{:02}", index + 1);
			let rank = if prefix.is_empty() {
				position
			} else {
				format!("{prefix}.{position}")
			};

			// A class appearing twice keeps its first rank and is not walked
			// again.
			if ranks.contains_key(&class.id) {
				continue;
			}
			ranks.insert(class.id.clone(), rank.clone());
			assign(children, &class.id, &rank, ranks);
		}
	}

	let children = class_children(classes);
	let mut ranks = HashMap::new();
	assign(&children, "", "", &mut ranks);

	ranks
}

/// Memoized union of the organisms in a class and all of its descendant
/// classes.
struct DescendantOrganisms<'a> {
	children: &'a HashMap<&'a str, Vec<&'a ClassRecord>>,
	direct: HashMap<&'a str, Vec<&'a str>>,
	memo: HashMap<String, Vec<String>>,
	visiting: HashSet<String>,
}

impl<'a> DescendantOrganisms<'a> {
	fn new(
		children: &'a HashMap<&'a str, Vec<&'a ClassRecord>>,
		organisms: &'a [EntityRecord],
	) -> Self {
		let mut direct: HashMap<&str, Vec<&str>> = HashMap::new();
		for organism in organisms {
			if let Some(class_id) = organism.class_id.as_deref() {
				direct.entry(class_id).or_default().push(&organism.id);
			}
		}

		Self {
			children,
			direct,
			memo: HashMap::new(),
			visiting: HashSet::new(),
		}
	}

	fn of(&mut self, class_id: &str) -> Vec<String> {
		if let Some(members) = self.memo.get(class_id) {
			return members.clone();
		}
		// Cycles in the parent links contribute nothing past the repeat.
		if !self.visiting.insert(class_id.to_string()) {
			return Vec::new();
		}

		let mut members: IndexSet<String> = self
			.direct
			.get(class_id)
			.into_iter()
			.flatten()
			.map(|id| (*id).to_string())
			.collect();

		let children = self.children;
		for child in children.get(class_id).into_iter().flatten() {
			members.extend(self.of(&child.id));
		}

		self.visiting.remove(class_id);
		let members: Vec<String> = members.into_iter().collect();
		self.memo.insert(class_id.to_string(), members.clone());

		members
	}
}

/// Immutable lookup structures derived from the reference tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceIndex {
	pub antibiotics: SynonymIndex,
	pub organisms: SynonymIndex,
	/// Antibiotics that declare a class, in table order.
	pub all_abx_ids: Vec<String>,
	/// Organisms that declare a class, in table order.
	pub all_org_ids: Vec<String>,
	/// Organism class id to dotted rank.
	pub class_ranks: HashMap<String, String>,
	/// Organism id to the rank of its class.
	pub org_ranks: HashMap<String, String>,
	/// Antibiotic class id to member antibiotics.
	pub abx_class_members: IndexMap<String, Vec<String>>,
	/// Organism class id to organisms in it or any descendant class.
	pub org_class_members: IndexMap<String, Vec<String>>,
	/// Organism group id to member organisms.
	pub org_group_members: IndexMap<String, Vec<String>>,
}

impl ReferenceIndex {
	/// Build every synonym map and rank table from `tables`. Building is
	/// deterministic: equal tables always produce equal indices.
	pub fn build(tables: &ReferenceTables) -> Self {
		let mut abx_map = direct_synonym_map(&tables.antibiotics);
		let mut org_map = direct_synonym_map(&tables.organisms);

		let children = class_children(&tables.organism_classes);
		let class_ranks = class_ranks(&tables.organism_classes);
		let org_ranks = tables
			.organisms
			.iter()
			.map(|organism| {
				let rank = organism
					.class_id
					.as_deref()
					.and_then(|class_id| class_ranks.get(class_id))
					.map_or_else(|| UNRANKED.to_string(), Clone::clone);
				(organism.id.clone(), rank)
			})
			.collect();

		// Antibiotic classes: synonyms merge into existing mappings.
		let mut abx_class_members = IndexMap::new();
		let mut class_synonym_members: IndexMap<String, Vec<String>> = IndexMap::new();
		for class in &tables.antibiotic_classes {
			let members: Vec<String> = tables
				.antibiotics
				.iter()
				.filter(|antibiotic| antibiotic.class_id.as_deref() == Some(class.id.as_str()))
				.map(|antibiotic| antibiotic.id.clone())
				.collect();
			if members.is_empty() {
				continue;
			}

			for synonym in collect_synonyms(&class.id, &class.names) {
				class_synonym_members
					.entry(synonym)
					.or_default()
					.extend(members.iter().cloned());
			}
			abx_class_members.insert(class.id.clone(), members);
		}
		for (synonym, members) in class_synonym_members {
			abx_map.merge(synonym, &members);
		}

		// Organism classes: synonyms are replaced by the full descendant set.
		let mut descendants = DescendantOrganisms::new(&children, &tables.organisms);
		let mut org_class_members = IndexMap::new();
		for class in &tables.organism_classes {
			let members = descendants.of(&class.id);
			if members.is_empty() {
				continue;
			}

			for synonym in collect_synonyms(&class.id, &class.names) {
				org_map.set(synonym, members.clone());
			}
			org_class_members.insert(class.id.clone(), members);
		}

		// Organism groups: synonyms merge into existing mappings.
		let mut group_members: HashMap<&str, Vec<String>> = HashMap::new();
		for organism in &tables.organisms {
			for group in &organism.groups {
				group_members
					.entry(group.as_str())
					.or_default()
					.push(organism.id.clone());
			}
		}
		let mut org_group_members = IndexMap::new();
		for group in &tables.organism_groups {
			let Some(members) = group_members.get(group.id.as_str()) else {
				continue;
			};

			for synonym in collect_synonyms(&group.id, &group.names) {
				org_map.merge(synonym, members);
			}
			org_group_members.insert(group.id.clone(), members.clone());
		}

		let all_abx_ids = classified_ids(&tables.antibiotics);
		let all_org_ids = classified_ids(&tables.organisms);

		tracing::debug!(
			antibiotic_synonyms = abx_map.len(),
			organism_synonyms = org_map.len(),
			antibiotics = all_abx_ids.len(),
			organisms = all_org_ids.len(),
			"built reference index"
		);

		Self {
			antibiotics: SynonymIndex::new(abx_map),
			organisms: SynonymIndex::new(org_map),
			all_abx_ids,
			all_org_ids,
			class_ranks,
			org_ranks,
			abx_class_members,
			org_class_members,
			org_group_members,
		}
	}

	/// Display rank of an organism; unranked organisms sort last.
	pub fn org_rank(&self, organism_id: &str) -> &str {
		self.org_ranks
			.get(organism_id)
			.map_or(UNRANKED, String::as_str)
	}

	/// Stable sort of organism ids by class rank.
	pub fn sort_by_rank(&self, organism_ids: &mut [String]) {
		organism_ids.sort_by(|a, b| self.org_rank(a).cmp(self.org_rank(b)));
	}
}

/// Only entities assigned to a class count as valid resolution targets.
fn classified_ids(records: &[EntityRecord]) -> Vec<String> {
	records
		.iter()
		.filter(|record| record.class_id.is_some())
		.map(|record| record.id.clone())
		.collect()
}
