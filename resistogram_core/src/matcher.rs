use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::synonyms::SynonymMap;

static CODE_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`{1,3}[\s\S]*?`{1,3}").unwrap());
static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());
static DECORATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*_~#>/.,]+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static WORD_CHAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\p{L}\p{N}]$").unwrap());

/// Decides whether a synonym occurs in page text.
///
/// Page text is prepared once per directive and then tested against every
/// synonym of an index, so implementations should do their normalization in
/// [`SynonymMatcher::prepare_text`].
pub trait SynonymMatcher {
	/// Normalize page text before matching.
	fn prepare_text(&self, text: &str) -> String;

	/// Whether `synonym` appears in `prepared` as a standalone word.
	fn matches(&self, prepared: &str, synonym: &str) -> bool;
}

/// Case-insensitive regex matching on Unicode letter/number boundaries.
///
/// A literal `.` in a synonym is optional in the text, and any run of
/// whitespace matches any other run. A synonym with dots that does not match
/// is retried once without its dots.
///
/// Patterns for the synonyms given to [`RegexMatcher::for_synonyms`] are
/// compiled up front; any other synonym is compiled when it is matched.
#[derive(Debug, Clone, Default)]
pub struct RegexMatcher {
	patterns: HashMap<String, SynonymPattern>,
}

impl RegexMatcher {
	/// Compile the patterns of every synonym in `map`.
	pub fn for_synonyms(map: &SynonymMap) -> Self {
		let patterns: HashMap<String, SynonymPattern> = map
			.keys()
			.map(|synonym| (synonym.clone(), SynonymPattern::compile(synonym)))
			.collect();
		tracing::debug!(patterns = patterns.len(), "compiled synonym patterns");

		Self { patterns }
	}

	/// Number of precompiled synonym patterns.
	pub fn len(&self) -> usize {
		self.patterns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.patterns.is_empty()
	}
}

impl SynonymMatcher for RegexMatcher {
	fn prepare_text(&self, text: &str) -> String {
		strip_markdown_light(text)
	}

	fn matches(&self, prepared: &str, synonym: &str) -> bool {
		match self.patterns.get(synonym) {
			Some(pattern) => pattern.is_match(prepared),
			None => SynonymPattern::compile(synonym).is_match(prepared),
		}
	}
}

/// The compiled pattern of one synonym and, for dotted synonyms, of its
/// dot-stripped form.
#[derive(Debug, Clone)]
struct SynonymPattern {
	exact: Option<Regex>,
	without_dots: Option<Regex>,
}

impl SynonymPattern {
	fn compile(synonym: &str) -> Self {
		let without_dots = synonym.replace('.', "");
		let without_dots = if without_dots == synonym {
			None
		} else {
			token_regex(&strip_markdown_light(&without_dots))
		};

		Self {
			exact: token_regex(&strip_markdown_light(synonym)),
			without_dots,
		}
	}

	fn is_match(&self, prepared: &str) -> bool {
		[&self.exact, &self.without_dots]
			.into_iter()
			.flatten()
			.any(|regex| is_bounded_match(regex, prepared))
	}
}

/// Remove lightweight markdown decoration: code spans and images are
/// dropped, links keep their text, the punctuation `*_~#>/.,` becomes
/// whitespace and whitespace runs collapse to a single space.
pub fn strip_markdown_light(text: &str) -> String {
	let text = CODE_SPAN.replace_all(text, " ");
	let text = IMAGE.replace_all(&text, " ");
	let text = LINK.replace_all(&text, "$1");
	let text = DECORATION.replace_all(&text, " ");
	let text = WHITESPACE.replace_all(&text, " ");

	text.trim().to_string()
}

/// Compile the pattern for a single synonym. Returns `None` for blank input
/// or a pattern the regex engine rejects.
pub fn token_regex(synonym: &str) -> Option<Regex> {
	let synonym = synonym.trim();
	if synonym.is_empty() {
		return None;
	}

	let escaped = regex::escape(synonym).replace(r"\.", r"\.?");
	let pattern = WHITESPACE.replace_all(&escaped, r"\s+");

	match Regex::new(&format!("(?i){pattern}")) {
		Ok(regex) => Some(regex),
		Err(error) => {
			tracing::debug!(%synonym, %error, "skipping synonym with unusable pattern");
			None
		}
	}
}

/// Find a match of `regex` in `text` that is neither preceded nor followed by
/// a letter or number.
pub fn is_bounded_match(regex: &Regex, text: &str) -> bool {
	let mut start = 0;
	while start <= text.len() {
		let Some(found) = regex.find_at(text, start) else {
			return false;
		};

		let before = text[..found.start()].chars().next_back();
		let after = text[found.end()..].chars().next();
		if !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char) {
			return true;
		}

		// Retry one character past the rejected match start.
		start = found.start()
			+ text[found.start()..]
				.chars()
				.next()
				.map_or(1, char::len_utf8);
	}

	false
}

/// Letters and numbers by general category. Combining marks are not word
/// characters.
fn is_word_char(c: char) -> bool {
	let mut buffer = [0; 4];
	WORD_CHAR.is_match(c.encode_utf8(&mut buffer))
}
