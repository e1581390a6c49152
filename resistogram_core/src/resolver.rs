use std::collections::HashSet;

use indexmap::IndexSet;
use serde::Serialize;

use crate::matcher::SynonymMatcher;
use crate::synonyms::SynonymIndex;

/// Request token selecting every valid identifier.
pub const ALL_TOKEN: &str = "all";
/// Request token detecting identifiers from the page text.
pub const AUTO_TOKEN: &str = "auto";

/// The outcome of resolving one request parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
	/// Canonical identifiers in the order they were first resolved.
	pub resolved: Vec<String>,
	/// Request tokens that contributed nothing.
	pub unresolved: Vec<String>,
}

impl Resolution {
	pub fn is_empty(&self) -> bool {
		self.resolved.is_empty() && self.unresolved.is_empty()
	}
}

/// Split a raw comma separated parameter into trimmed, non-empty tokens.
pub fn split_param(param: &str) -> Vec<String> {
	param
		.split(',')
		.map(str::trim)
		.filter(|token| !token.is_empty())
		.map(ToString::to_string)
		.collect()
}

/// Resolve a raw parameter such as `"amx, Fluoroquinolones"` or `"auto"`.
/// An absent or empty parameter resolves to nothing and is not an error.
pub fn resolve_ids(
	param: Option<&str>,
	valid_ids: &[String],
	index: &SynonymIndex,
	page_text: &str,
) -> Resolution {
	let Some(param) = param else {
		return Resolution::default();
	};

	resolve_tokens(&split_param(param), valid_ids, index, page_text)
}

/// Resolve already split request tokens with the index's own precompiled
/// matcher.
pub fn resolve_tokens(
	tokens: &[String],
	valid_ids: &[String],
	index: &SynonymIndex,
	page_text: &str,
) -> Resolution {
	resolve_tokens_with(index.matcher(), tokens, valid_ids, index, page_text)
}

/// Resolve request tokens using `matcher` for `auto` detection.
///
/// Explicit tokens only resolve to identifiers listed in `valid_ids`, while
/// `auto` adds whatever the matched synonyms map to.
pub fn resolve_tokens_with(
	matcher: &impl SynonymMatcher,
	tokens: &[String],
	valid_ids: &[String],
	index: &SynonymIndex,
	page_text: &str,
) -> Resolution {
	let tokens: Vec<&str> = tokens
		.iter()
		.map(|token| token.trim())
		.filter(|token| !token.is_empty())
		.collect();
	if tokens.is_empty() {
		return Resolution::default();
	}

	let valid: HashSet<&str> = valid_ids.iter().map(String::as_str).collect();
	let mut resolved: IndexSet<String> = IndexSet::new();

	for token in &tokens {
		match *token {
			AUTO_TOKEN => {
				let prepared = matcher.prepare_text(page_text);
				for (synonym, ids) in index.map().iter() {
					if matcher.matches(&prepared, synonym) {
						resolved.extend(ids.iter().cloned());
					}
				}
			}
			ALL_TOKEN => resolved.extend(valid_ids.iter().cloned()),
			_ => {
				resolved.extend(
					explicit_ids(index, token)
						.into_iter()
						.filter(|id| valid.contains(id.as_str())),
				);
			}
		}
	}

	let unresolved: Vec<String> = if resolved.is_empty() {
		let mut unresolved: Vec<String> = tokens
			.iter()
			.filter(|token| !is_keyword(token))
			.map(ToString::to_string)
			.collect();
		if unresolved.is_empty() && tokens.contains(&AUTO_TOKEN) {
			unresolved.push(AUTO_TOKEN.to_string());
		}
		unresolved
	} else {
		tokens
			.iter()
			.filter(|token| !is_keyword(token))
			.filter(|token| {
				!explicit_ids(index, token)
					.iter()
					.any(|id| resolved.contains(id))
			})
			.map(ToString::to_string)
			.collect()
	};

	if !unresolved.is_empty() {
		tracing::warn!(tokens = ?unresolved, "unresolved identifier tokens");
	}

	Resolution {
		resolved: resolved.into_iter().collect(),
		unresolved,
	}
}

fn is_keyword(token: &str) -> bool {
	token == ALL_TOKEN || token == AUTO_TOKEN
}

/// Identifiers an explicit token stands for: its synonym mapping, or the
/// upper-cased token itself read as a comma separated identifier list.
fn explicit_ids(index: &SynonymIndex, token: &str) -> Vec<String> {
	match index.lookup(token) {
		Some(ids) => ids.to_vec(),
		None => token
			.to_uppercase()
			.split(',')
			.map(ToString::to_string)
			.collect(),
	}
}
