use std::cmp::Ordering;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::collections::HashSet;

use crate::records::Source;

/// Locale whose display name a source hint is matched against.
pub const HINT_LOCALE: &str = "de";

/// Number of ancestors of `source` that exist in `sources`. Roots have zero.
/// A parent cycle stops counting at the first repeated source.
pub fn parent_count(source: &Source, sources: &[Source]) -> usize {
	let by_id = index_by_id(sources);
	count_parents(source, &by_id)
}

fn index_by_id(sources: &[Source]) -> HashMap<&str, &Source> {
	sources
		.iter()
		.map(|source| (source.id.as_str(), source))
		.collect()
}

fn count_parents(source: &Source, by_id: &HashMap<&str, &Source>) -> usize {
	let mut seen = HashSet::from([source.id.as_str()]);
	let mut count = 0;
	let mut current = source;
	while let Some(parent) = current
		.parent_id
		.as_deref()
		.and_then(|parent_id| by_id.get(parent_id))
	{
		if !seen.insert(parent.id.as_str()) {
			break;
		}
		count += 1;
		current = parent;
	}

	count
}

/// The path from the forest root to the source with `id`, inclusive and
/// root first. Empty when `id` is not a known source.
pub fn ancestor_chain<'a>(id: &str, sources: &'a [Source]) -> Vec<&'a Source> {
	let by_id = index_by_id(sources);
	let Some(mut current) = by_id.get(id).copied() else {
		return Vec::new();
	};

	let mut seen = HashSet::from([current.id.as_str()]);
	let mut chain = vec![current];
	while let Some(parent) = current
		.parent_id
		.as_deref()
		.and_then(|parent_id| by_id.get(parent_id).copied())
	{
		if !seen.insert(parent.id.as_str()) {
			break;
		}
		chain.push(parent);
		current = parent;
	}
	chain.reverse();

	chain
}

/// Which key dominates the ranking of candidate sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Priority {
	/// Newest first, then most deeply nested.
	Year,
	/// Most deeply nested first, then newest.
	Parents,
}

/// Pick the best source for an optional `hint`.
///
/// Without a hint the newest source wins; among sources of the same year the
/// more deeply nested one, then the one declared first. With a hint only
/// sources whose id, German display name or year contain the hint compete,
/// and nesting depth is preferred over recency. A hint matching nothing
/// falls back to the unhinted choice. Returns `None` only for an empty
/// source list.
pub fn select_data_source<'a>(hint: Option<&str>, sources: &'a [Source]) -> Option<&'a Source> {
	let hint = hint.map(str::trim).filter(|hint| !hint.is_empty());
	let Some(hint) = hint else {
		return best(sources.iter().enumerate().collect(), sources, Priority::Year);
	};

	let needle = hint.to_lowercase();
	let matching: Vec<(usize, &Source)> = sources
		.iter()
		.enumerate()
		.filter(|(_, source)| matches_hint(source, hint, &needle))
		.collect();

	if matching.is_empty() {
		tracing::debug!(%hint, "no data source matches hint, using the default");
		return best(sources.iter().enumerate().collect(), sources, Priority::Year);
	}

	best(matching, sources, Priority::Parents)
}

fn matches_hint(source: &Source, hint: &str, needle: &str) -> bool {
	source.id.to_lowercase().contains(needle)
		|| source
			.name(HINT_LOCALE)
			.is_some_and(|name| name.to_lowercase().contains(needle))
		|| source
			.year
			.is_some_and(|year| year.to_string().contains(hint))
}

fn best<'a>(
	candidates: Vec<(usize, &'a Source)>,
	sources: &'a [Source],
	priority: Priority,
) -> Option<&'a Source> {
	let by_id = index_by_id(sources);
	candidates
		.into_iter()
		.map(|(position, source)| {
			let depth = count_parents(source, &by_id);
			(position, depth, source)
		})
		.min_by(|a, b| compare(a, b, priority))
		.map(|(_, _, source)| source)
}

/// Orders candidates best first. A missing year ranks below every year.
fn compare(
	(a_position, a_depth, a): &(usize, usize, &Source),
	(b_position, b_depth, b): &(usize, usize, &Source),
	priority: Priority,
) -> Ordering {
	let year = Reverse(a.year).cmp(&Reverse(b.year));
	let depth = b_depth.cmp(a_depth);
	let primary = match priority {
		Priority::Year => year.then(depth),
		Priority::Parents => depth.then(year),
	};

	primary.then(a_position.cmp(b_position))
}

/// A source together with its depth in the source forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceNode<'a> {
	pub source: &'a Source,
	pub depth: usize,
}

/// Depth-first walk of the source forest, children in list order. Sources
/// whose parent is unknown are treated as roots; sources only reachable
/// through a parent cycle are appended at depth zero.
pub fn source_forest(sources: &[Source]) -> Vec<SourceNode<'_>> {
	let known: HashSet<&str> = sources.iter().map(|source| source.id.as_str()).collect();
	let mut children: HashMap<&str, Vec<&Source>> = HashMap::new();
	let mut roots = Vec::new();
	for source in sources {
		match source.parent_id.as_deref() {
			Some(parent_id) if known.contains(parent_id) => {
				children.entry(parent_id).or_default().push(source);
			}
			_ => roots.push(source),
		}
	}

	fn visit<'a>(
		source: &'a Source,
		depth: usize,
		children: &HashMap<&str, Vec<&'a Source>>,
		seen: &mut HashSet<&'a str>,
		nodes: &mut Vec<SourceNode<'a>>,
	) {
		if !seen.insert(source.id.as_str()) {
			return;
		}
		nodes.push(SourceNode { source, depth });
		for child in children.get(source.id.as_str()).into_iter().flatten() {
			visit(child, depth + 1, children, seen, nodes);
		}
	}

	let mut seen = HashSet::new();
	let mut nodes = Vec::with_capacity(sources.len());
	for root in roots {
		visit(root, 0, &children, &mut seen, &mut nodes);
	}
	for source in sources {
		visit(source, 0, &children, &mut seen, &mut nodes);
	}

	nodes
}
