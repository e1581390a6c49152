use std::sync::LazyLock;

use markdown::ParseOptions;
use markdown::mdast::Node;
use markdown::to_mdast;
use regex::Regex;
use serde::Serialize;

use crate::ResistError;
use crate::ResistResult;
use crate::lexer::DirectiveParams;
use crate::lexer::parse_params;

/// Marks a paragraph as holding a directive.
pub const DIRECTIVE_MARKER: &str = "%%RESIST";

/// Parameter selecting antibiotics.
pub const ABX_PARAM: &str = "abx";
/// Parameter selecting organisms.
pub const ORG_PARAM: &str = "org";
/// Parameter hinting at a data source.
pub const SOURCE_PARAM: &str = "source";

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%%RESIST\s*([^%]*)%%").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// A `%%RESIST ...%%` directive found in a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
	/// Parsed parameters in the order they were written.
	pub params: DirectiveParams,
	/// The parameter string as written between the marker and the closing
	/// `%%`.
	pub raw: String,
	/// Paragraph text before the directive, trimmed. `None` when blank.
	pub before: Option<String>,
	/// Paragraph text after the directive, trimmed. `None` when blank.
	pub after: Option<String>,
	/// 1-indexed line of the containing paragraph.
	pub line: usize,
	/// 1-indexed column of the containing paragraph.
	pub column: usize,
}

impl Directive {
	/// Parse the first directive in a paragraph's text.
	pub fn from_paragraph_text(text: &str, line: usize, column: usize) -> Option<Self> {
		let captures = DIRECTIVE.captures(text)?;
		let whole = captures.get(0)?;
		let raw = captures.get(1).map_or("", |m| m.as_str());

		Some(Self {
			params: parse_params(raw),
			raw: raw.to_string(),
			before: non_blank(&text[..whole.start()]),
			after: non_blank(&text[whole.end()..]),
			line,
			column,
		})
	}

	/// Tokens of `key`, if the directive sets it.
	pub fn param(&self, key: &str) -> Option<&[String]> {
		self.params.get(key).map(Vec::as_slice)
	}

	/// The value of `key` as written, tokens joined with commas.
	pub fn param_value(&self, key: &str) -> Option<String> {
		self.params.get(key).map(|tokens| tokens.join(","))
	}
}

fn non_blank(text: &str) -> Option<String> {
	let text = text.trim();
	(!text.is_empty()).then(|| text.to_string())
}

/// Every directive of a document together with the document's plain text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedDocument {
	pub directives: Vec<Directive>,
	/// Prose of the whole document, used for `auto` detection.
	pub page_text: String,
}

/// Parse a markdown document, collecting its directives and plain text.
pub fn parse_document(content: &str) -> ResistResult<ParsedDocument> {
	let options = ParseOptions::gfm();
	let mdast = to_mdast(content, &options).map_err(|e| ResistError::Markdown(e.to_string()))?;

	let mut directives = Vec::new();
	collect_directives(&mdast, &mut directives);

	Ok(ParsedDocument {
		directives,
		page_text: plain_text(&mdast),
	})
}

fn collect_directives(node: &Node, directives: &mut Vec<Directive>) {
	if let Node::Paragraph(_) = node {
		let text = node_text(node);
		if text.contains(DIRECTIVE_MARKER) {
			let (line, column) = node
				.position()
				.map_or((0, 0), |position| (position.start.line, position.start.column));
			if let Some(directive) = Directive::from_paragraph_text(&text, line, column) {
				directives.push(directive);
			}
		}
		return;
	}

	if let Some(children) = node.children() {
		for child in children {
			collect_directives(child, directives);
		}
	}
}

/// Concatenated literal content of a node and its descendants, including
/// code spans and image alt text.
pub fn node_text(node: &Node) -> String {
	let mut out = String::new();
	push_node_text(node, &mut out);
	out
}

fn push_node_text(node: &Node, out: &mut String) {
	match node {
		Node::Text(text) => out.push_str(&text.value),
		Node::InlineCode(code) => out.push_str(&code.value),
		Node::Code(code) => out.push_str(&code.value),
		Node::Html(html) => out.push_str(&html.value),
		Node::InlineMath(math) => out.push_str(&math.value),
		Node::Image(image) => out.push_str(&image.alt),
		_ => {
			if let Some(children) = node.children() {
				for child in children {
					push_node_text(child, out);
				}
			}
		}
	}
}

/// The prose of a document: text nodes joined by single spaces, padded with
/// one space on each side. Code, inline code and directive paragraphs are
/// left out.
pub fn plain_text(root: &Node) -> String {
	let mut out = String::new();
	push_plain_text(root, &mut out);

	let compact = WHITESPACE.replace_all(&out, " ");
	format!(" {} ", compact.trim())
}

fn push_plain_text(node: &Node, out: &mut String) {
	match node {
		Node::Code(_) | Node::InlineCode(_) => return,
		Node::Paragraph(_) if node_text(node).contains(DIRECTIVE_MARKER) => return,
		Node::Text(text) if !text.value.is_empty() => {
			if !out.is_empty() && !out.ends_with(char::is_whitespace) {
				out.push(' ');
			}
			out.push_str(&text.value);
		}
		Node::Break(_) => out.push(' '),
		_ => {}
	}

	if let Some(children) = node.children() {
		for child in children {
			push_plain_text(child, out);
		}
	}
}

/// Plain text of a markdown document; see [`plain_text`].
pub fn page_text(content: &str) -> ResistResult<String> {
	let mdast = to_mdast(content, &ParseOptions::gfm())
		.map_err(|e| ResistError::Markdown(e.to_string()))?;
	Ok(plain_text(&mdast))
}
