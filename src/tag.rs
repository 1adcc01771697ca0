/*!
# Tag parser

Splits a tag token's raw text (including its `<`/`>` delimiters) into a
kind, element name, and an ordered attribute list with per-item line
numbers. Entity decoding, whitespace compression, and NFC normalization
of attribute values happen here, since they depend on the attribute
value's own starting line.
*/
use std::collections::HashSet;

use crate::entities;
use crate::error::ParseErrorKind::*;
use crate::error::{LineError, LineResult};
use crate::selectors;
use crate::text;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TagKind {
	Start,
	Empty,
	End,
}

/// A single decoded attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAttribute {
	pub name: String,
	pub name_line: u64,
	pub value: String,
	pub value_line: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagToken {
	pub kind: TagKind,
	pub name: String,
	pub name_line: u64,
	pub attrs: Vec<RawAttribute>,
	pub line: u64,
}

fn is_ws(c: char) -> bool {
	matches!(c, ' ' | '\t' | '\n')
}

/// Parse a tag token. `raw` is the full matched text, including the
/// leading `<` and trailing `>`; `start_line` is the line the `<` is on.
pub fn parse(raw: &str, start_line: u64) -> LineResult<TagToken> {
	let chars: Vec<char> = raw.chars().collect();
	if chars.len() < 2 || chars[0] != '<' || chars[chars.len() - 1] != '>' {
		return Err(LineError::new(start_line, TagParseFailure));
	}
	let body = &chars[1..chars.len() - 1];

	let mut idx = 0;
	let leading_slash = body.first() == Some(&'/');
	if leading_slash {
		idx = 1;
	}
	let mut end_idx = body.len();
	if end_idx > idx && body[end_idx - 1] == '/' {
		if leading_slash {
			return Err(LineError::new(start_line, TagParseFailure));
		}
		end_idx -= 1;
	}
	let trailing_slash = end_idx < body.len();
	let inner = &body[idx..end_idx];

	let mut line = start_line;
	let name_line = line;
	let mut pos = 0;
	while pos < inner.len() && !is_ws(inner[pos]) {
		pos += 1;
	}
	let name_raw: String = inner[..pos].iter().collect();
	let name = text::nfc(&name_raw);
	if !selectors::valid_name(&name) {
		return Err(LineError::new(name_line, InvalidTagName));
	}

	let mut attrs = Vec::new();
	let mut seen = HashSet::new();
	let mut i = pos;
	loop {
		let ws_start = i;
		while i < inner.len() && is_ws(inner[i]) {
			if inner[i] == '\n' {
				line += 1;
			}
			i += 1;
		}
		if i >= inner.len() {
			break;
		}
		if i == ws_start {
			return Err(LineError::new(line, TagParseFailure));
		}

		let attr_name_line = line;
		let name_start = i;
		while i < inner.len() && inner[i] != '=' && !is_ws(inner[i]) {
			i += 1;
		}
		if i >= inner.len() {
			return Err(LineError::new(attr_name_line, TagParseFailure));
		}
		let attr_name_raw: String = inner[name_start..i].iter().collect();

		while i < inner.len() && is_ws(inner[i]) {
			if inner[i] == '\n' {
				line += 1;
			}
			i += 1;
		}
		if i >= inner.len() || inner[i] != '=' {
			return Err(LineError::new(attr_name_line, TagParseFailure));
		}
		i += 1;
		while i < inner.len() && is_ws(inner[i]) {
			if inner[i] == '\n' {
				line += 1;
			}
			i += 1;
		}
		if i >= inner.len() || (inner[i] != '"' && inner[i] != '\'') {
			return Err(LineError::new(attr_name_line, TagParseFailure));
		}
		let quote = inner[i];
		i += 1;
		let value_line = line;
		let value_start = i;
		while i < inner.len() && inner[i] != quote {
			if inner[i] == '<' {
				return Err(LineError::new(value_line, UnescapedLessThanInAttributeValue));
			}
			if inner[i] == '\n' {
				line += 1;
			}
			i += 1;
		}
		if i >= inner.len() {
			return Err(LineError::new(value_line, TagParseFailure));
		}
		let raw_value: String = inner[value_start..i].iter().collect();
		i += 1;

		let attr_name = text::nfc(&attr_name_raw);
		if !selectors::valid_name(&attr_name) {
			return Err(LineError::new(attr_name_line, InvalidAttributeName));
		}
		let decoded = entities::decode(&raw_value, value_line)?;
		let compressed = text::compress_whitespace(&decoded);
		let value = text::nfc(&compressed);

		if !seen.insert(attr_name.clone()) {
			return Err(LineError::new(attr_name_line, DuplicateAttribute(attr_name)));
		}
		attrs.push(RawAttribute { name: attr_name, name_line: attr_name_line, value, value_line });
	}

	let kind = if leading_slash {
		TagKind::End
	} else if trailing_slash {
		TagKind::Empty
	} else {
		TagKind::Start
	};
	if kind == TagKind::End && !attrs.is_empty() {
		return Err(LineError::new(start_line, ClosingTagsMayNotHaveAttributes));
	}

	Ok(TagToken { kind, name, name_line, attrs, line: start_line })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_empty_tag_with_no_attributes() {
		let t = parse("<root/>", 1).unwrap();
		assert_eq!(t.kind, TagKind::Empty);
		assert_eq!(t.name, "root");
		assert!(t.attrs.is_empty());
	}

	#[test]
	fn parses_start_tag_with_attributes() {
		let t = parse("<a x=\"1\" y='2'/>", 5).unwrap();
		assert_eq!(t.kind, TagKind::Empty);
		assert_eq!(t.attrs.len(), 2);
		assert_eq!(t.attrs[0].name, "x");
		assert_eq!(t.attrs[0].value, "1");
		assert_eq!(t.attrs[1].name, "y");
		assert_eq!(t.attrs[1].value, "2");
	}

	#[test]
	fn parses_end_tag() {
		let t = parse("</a>", 1).unwrap();
		assert_eq!(t.kind, TagKind::End);
		assert_eq!(t.name, "a");
	}

	#[test]
	fn rejects_end_tag_with_attributes() {
		let err = parse("</a x=\"1\">", 1).unwrap_err();
		assert_eq!(err.kind, ClosingTagsMayNotHaveAttributes);
	}

	#[test]
	fn rejects_both_leading_and_trailing_slash() {
		let err = parse("</a/>", 1).unwrap_err();
		assert_eq!(err.kind, TagParseFailure);
	}

	#[test]
	fn rejects_duplicate_attribute_names() {
		let err = parse("<a x=\"1\" x=\"2\"/>", 1).unwrap_err();
		assert!(matches!(err.kind, DuplicateAttribute(ref n) if n == "x"));
	}

	#[test]
	fn rejects_unescaped_less_than_in_attribute_value() {
		let err = parse("<a x=\"1<2\"/>", 1).unwrap_err();
		assert_eq!(err.kind, UnescapedLessThanInAttributeValue);
	}

	#[test]
	fn decodes_entities_and_compresses_whitespace_in_values() {
		let t = parse("<a x=\"  a &amp;  b  \"/>", 1).unwrap();
		assert_eq!(t.attrs[0].value, "a & b");
	}

	#[test]
	fn tracks_attribute_value_line_across_embedded_newlines() {
		let t = parse("<a\n  x=\"1\"\n  y=\"2\"/>", 1).unwrap();
		assert_eq!(t.attrs[0].value_line, 2);
		assert_eq!(t.attrs[1].value_line, 3);
	}
}
