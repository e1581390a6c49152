use std::ops::Range;

use indexmap::IndexMap;
use logos::Logos;
use snailquote::unescape;

/// Raw tokens of a directive's parameter string, e.g.
/// `abx=amx, "Amoxicillin, clavulanic acid" org=auto`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum ParamToken {
	/// `abx=`
	#[regex(r"[A-Za-z0-9_]+=")]
	Key,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuoted,
	#[regex(r"'[^']*'")]
	SingleQuoted,
	#[token(",")]
	Comma,
	#[regex(r"[ \t\r\n]+")]
	Whitespace,
	#[regex(r#"[^,"'= \t\r\n]+"#)]
	Text,
	#[token("=")]
	Equals,
}

/// Directive parameters: key to value tokens, in the order keys first
/// appear. A repeated key keeps its first position and its last value.
pub type DirectiveParams = IndexMap<String, Vec<String>>;

/// Parse a directive parameter string.
///
/// Every `key=` starts a parameter whose value runs until the next key. The
/// value is split on commas into trimmed tokens; a token that starts with a
/// quote keeps its commas and spaces. Keys without any token are dropped.
pub fn parse_params(input: &str) -> DirectiveParams {
	let raw: Vec<(Result<ParamToken, ()>, Range<usize>)> = ParamToken::lexer(input).spanned().collect();

	let mut params = DirectiveParams::new();
	let mut current: Option<(&str, Vec<(Option<ParamToken>, &str)>)> = None;

	for (token, span) in raw {
		let slice = &input[span];
		if token == Ok(ParamToken::Key) {
			if let Some((key, value)) = current.take() {
				insert_param(&mut params, key, &value);
			}
			current = Some((&slice[..slice.len() - 1], Vec::new()));
			continue;
		}

		// Text before the first key belongs to no parameter.
		if let Some((_, value)) = current.as_mut() {
			value.push((token.ok(), slice));
		}
	}

	if let Some((key, value)) = current {
		insert_param(&mut params, key, &value);
	}

	params
}

fn insert_param(params: &mut DirectiveParams, key: &str, value: &[(Option<ParamToken>, &str)]) {
	let tokens = value_tokens(value);
	if tokens.is_empty() {
		return;
	}

	params.insert(key.to_string(), tokens);
}

fn value_tokens(value: &[(Option<ParamToken>, &str)]) -> Vec<String> {
	let mut tokens = Vec::new();
	let mut pending = String::new();

	for (token, slice) in value {
		match token {
			Some(ParamToken::Comma) => flush(&mut pending, &mut tokens),
			Some(ParamToken::DoubleQuoted | ParamToken::SingleQuoted) if pending.trim().is_empty() => {
				pending.clear();
				let unquoted = unquote(slice);
				if !unquoted.trim().is_empty() {
					tokens.push(unquoted.trim().to_string());
				}
			}
			_ => pending.push_str(slice),
		}
	}
	flush(&mut pending, &mut tokens);

	tokens
}

fn flush(pending: &mut String, tokens: &mut Vec<String>) {
	let token = pending.trim();
	if !token.is_empty() {
		tokens.push(token.to_string());
	}
	pending.clear();
}

/// Strip the surrounding quotes, resolving escapes in double quoted strings.
fn unquote(slice: &str) -> String {
	let inner = &slice[1..slice.len() - 1];
	if slice.starts_with('"') && inner.contains('\\') {
		unescape(slice).unwrap_or_else(|_| inner.to_string())
	} else {
		inner.to_string()
	}
}
