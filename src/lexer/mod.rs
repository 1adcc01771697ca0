/*!
# Tokenizer

Scans an in-memory codepoint buffer into a lazy sequence of lexical
tokens: comment, processing instruction, DOCTYPE, CDATA, tag, text, or
a tokenization failure. The tokenizer holds a single cursor into the
buffer and a running line counter; it never looks behind the cursor and
never blocks, since the whole input is available up front.
*/
pub mod bytes;

use crate::error::ParseErrorKind::*;
use crate::error::{LineError, LineResult};
use crate::selectors;
use crate::text;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
	Comment,
	ProcessingInstruction,
	Doctype,
	CData,
	Tag,
	Text,
}

/// A single token along with its starting line and decoded text.
///
/// `text` has already been through line-break normalization and codepoint
/// validation; for [`TokenKind::CData`] it holds only the section's inner
/// body (the `<![CDATA[`/`]]>` delimiters are stripped).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
	pub kind: TokenKind,
	pub line: u64,
	pub text: String,
}

pub struct Tokenizer {
	chars: Vec<char>,
	pos: usize,
	line: u64,
}

impl Tokenizer {
	pub fn new(input: &str) -> Tokenizer {
		Tokenizer { chars: input.chars().collect(), pos: 0, line: 1 }
	}

	/// The current line, i.e. the line at which the next token would start.
	pub fn line(&self) -> u64 {
		self.line
	}

	/// Produce the next token, or `None` at end of input.
	pub fn next_token(&mut self) -> LineResult<Option<Token>> {
		if self.pos >= self.chars.len() {
			return Ok(None);
		}
		let start_line = self.line;

		if self.chars[self.pos] != '<' {
			let end = self.scan_text();
			let token = self.finish(TokenKind::Text, end, start_line)?;
			return Ok(Some(token));
		}

		if let Some(end) = self.try_match(b"<!--", "-->") {
			let token = self.finish(TokenKind::Comment, end, start_line)?;
			return Ok(Some(token));
		}
		if self.starts_with("<?") {
			if let Some(end) = self.find_closing(2, "?>") {
				let token = self.finish(TokenKind::ProcessingInstruction, end, start_line)?;
				return Ok(Some(token));
			}
		}
		if self.starts_with("<!DOCTYPE") {
			if let Some(end) = self.scan_doctype() {
				let token = self.finish(TokenKind::Doctype, end, start_line)?;
				return Ok(Some(token));
			}
		}
		if self.starts_with("<![CDATA[") {
			if let Some(end) = self.find_closing(9, "]]>") {
				return Ok(Some(self.finish_cdata(end, start_line)?));
			}
		}
		if self.pos + 1 < self.chars.len() {
			let next = self.chars[self.pos + 1];
			if next != '!' && next != '?' && next != '>' {
				if let Some(end) = self.scan_tag() {
					let token = self.finish(TokenKind::Tag, end, start_line)?;
					return Ok(Some(token));
				}
			}
		}

		// Nothing matched: the only candidate left is the bare `<` itself.
		self.pos += 1;
		Err(LineError::new(start_line, TokenizationFailed))
	}

	fn starts_with(&self, lit: &str) -> bool {
		let lit_chars: Vec<char> = lit.chars().collect();
		if self.pos + lit_chars.len() > self.chars.len() {
			return false;
		}
		self.chars[self.pos..self.pos + lit_chars.len()] == lit_chars[..]
	}

	fn scan_text(&self) -> usize {
		let mut i = self.pos;
		while i < self.chars.len() && self.chars[i] != '<' {
			i += 1;
		}
		i
	}

	/// Match a literal open delimiter (given as bytes, ASCII only) followed
	/// by any content that eventually reaches `close`, returning the index
	/// just past `close`.
	fn try_match(&self, open: &[u8], close: &str) -> Option<usize> {
		let open_str: String = open.iter().map(|&b| b as char).collect();
		if !self.starts_with(&open_str) {
			return None;
		}
		self.find_closing(open_str.chars().count(), close)
	}

	fn find_closing(&self, skip: usize, close: &str) -> Option<usize> {
		let close_chars: Vec<char> = close.chars().collect();
		let mut i = self.pos + skip;
		while i + close_chars.len() <= self.chars.len() {
			if self.chars[i..i + close_chars.len()] == close_chars[..] {
				return Some(i + close_chars.len());
			}
			i += 1;
		}
		None
	}

	/// `<!DOCTYPE … >` where `…` contains no `<`, `>`, quotes, `[`, or `]`
	/// outside a quoted span.
	fn scan_doctype(&self) -> Option<usize> {
		let mut i = self.pos + "<!DOCTYPE".chars().count();
		let mut quote: Option<char> = None;
		while i < self.chars.len() {
			let c = self.chars[i];
			match quote {
				Some(q) => {
					if c == q {
						quote = None;
					}
				}
				None => match c {
					'"' | '\'' => quote = Some(c),
					'>' => return Some(i + 1),
					'<' | '[' | ']' => return None,
					_ => (),
				},
			}
			i += 1;
		}
		None
	}

	/// `<` + any char except `!`,`?`,`>` + spans of non-`<>"'` interleaved
	/// with quoted spans + `>`.
	fn scan_tag(&self) -> Option<usize> {
		let mut i = self.pos + 1;
		let mut quote: Option<char> = None;
		while i < self.chars.len() {
			let c = self.chars[i];
			match quote {
				Some(q) => {
					if c == q {
						quote = None;
					}
				}
				None => match c {
					'"' | '\'' => quote = Some(c),
					'>' => return Some(i + 1),
					'<' => return None,
					_ => (),
				},
			}
			i += 1;
		}
		None
	}

	fn finish(&mut self, kind: TokenKind, end: usize, start_line: u64) -> LineResult<Token> {
		let raw: String = self.chars[self.pos..end].iter().collect();
		self.pos = end;
		let normalized = text::normalize_line_breaks(&raw);
		if let Some(bad) = selectors::first_invalid_codepoint(&normalized) {
			let before = normalized.chars().take_while(|&c| c != bad).filter(|&c| c == '\n').count() as u64;
			return Err(LineError::new(start_line + before, InvalidCodepoint(bad as u32)));
		}
		let added_lines = normalized.chars().filter(|&c| c == '\n').count() as u64;
		self.line = start_line + added_lines;
		Ok(Token { kind, line: start_line, text: normalized })
	}

	fn finish_cdata(&mut self, end: usize, start_line: u64) -> LineResult<Token> {
		let mut token = self.finish(TokenKind::CData, end, start_line)?;
		let inner: String = token.text.chars().skip(9).take(token.text.chars().count() - 9 - 3).collect();
		token.text = inner;
		Ok(token)
	}
}
