/*!
# Assembler, event engine, and public API

Drives the tokenizer, discards comment/PI/DOCTYPE tokens, merges
adjacent text/CDATA spans into a single content assembly, expands empty
tags into a start/end pair, and maintains the element stack, the
namespace stack, and a small look-ahead event buffer. [`Parser`] is the
crate's single public entry point, exposing the accessor-style API
described for this crate: `read_event` loads the next event, and a
family of `*_only-valid-for-X*` accessors read out of it.
*/
use std::collections::{HashMap, VecDeque};

use crate::entities;
use crate::error::ParseErrorKind::*;
use crate::error::{CallerError, LineError, LineResult, ParseError, Result};
use crate::lexer::bytes;
use crate::lexer::{Token, TokenKind, Tokenizer};
use crate::namespaces::{self, AttrMap, ExternalAttrMap, NamespaceStack};
use crate::tag::{self, TagKind};
use crate::text;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventKind {
	Start,
	Text,
	End,
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
	Start { name: String, namespace: Option<String>, plain: AttrMap, external: ExternalAttrMap },
	Text(String),
	End,
}

#[derive(Debug, Clone, PartialEq)]
struct LoadedEvent {
	line: u64,
	event: Event,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum TagState {
	Initial,
	Active,
	Finished,
}

/// The pull-style XML parser.
///
/// Construct with [`Parser::new`] (from an already-decoded codepoint
/// string) or [`Parser::from_bytes`] (from raw bytes, sniffing the
/// encoding per the byte-stream decoder). Drive it by calling
/// [`Parser::read_event`] in a loop; after it returns `Ok(false)`, or
/// any `Err`, no further calls are meaningful.
pub struct Parser {
	tokenizer: Tokenizer,
	namespaces: NamespaceStack,
	element_stack: Vec<String>,
	tag_state: TagState,
	pending: VecDeque<LoadedEvent>,
	current: Option<LoadedEvent>,
	latched: Option<ParseError>,
	source_name: Option<String>,
}

impl Parser {
	/// Construct a parser over an already-decoded codepoint string.
	///
	/// Fails immediately if `input` begins with U+FEFF: the byte-stream
	/// decoder strips a recognized BOM itself, so a leading U+FEFF reaching
	/// this constructor can only be a caller mistake.
	pub fn new(input: &str) -> Result<Parser> {
		bytes::reject_leading_bom(input).map_err(|e| e.into_parse_error(None))?;
		Ok(Parser {
			tokenizer: Tokenizer::new(input),
			namespaces: NamespaceStack::new(),
			element_stack: Vec::new(),
			tag_state: TagState::Initial,
			pending: VecDeque::new(),
			current: None,
			latched: None,
			source_name: None,
		})
	}

	/// Construct a parser over raw bytes, sniffing a BOM and decoding
	/// UTF-8/UTF-16 into a codepoint string first.
	pub fn from_bytes(input: &[u8]) -> Result<Parser> {
		let decoded = bytes::decode(input).map_err(|e| e.into_parse_error(None))?;
		Parser::new(&decoded)
	}

	pub fn set_source_name(&mut self, name: Option<String>) {
		self.source_name = name;
	}

	pub fn get_source_name(&self) -> Option<&str> {
		self.source_name.as_deref()
	}

	/// Load the next event, or indicate end-of-stream.
	///
	/// Returns `Ok(true)` when an event was loaded (inspect it with
	/// [`Parser::event_kind`] and friends), `Ok(false)` at a well-formed
	/// end of document. A returned `Err` is fatal and sticky: the same
	/// error is returned on every subsequent call.
	pub fn read_event(&mut self) -> Result<bool> {
		if let Some(err) = &self.latched {
			return Err(err.clone());
		}
		match self.load_next() {
			Ok(loaded) => {
				self.current = loaded;
				Ok(self.current.is_some())
			}
			Err(e) => {
				let parse_error = e.into_parse_error(self.source_name.clone());
				self.latched = Some(parse_error.clone());
				Err(parse_error)
			}
		}
	}

	fn load_next(&mut self) -> LineResult<Option<LoadedEvent>> {
		if let Some(ev) = self.pending.pop_front() {
			return Ok(Some(ev));
		}
		self.drive()?;
		Ok(self.pending.pop_front())
	}

	/// Pull tokens until at least one event is buffered or the input is
	/// exhausted.
	fn drive(&mut self) -> LineResult<()> {
		let mut content: Option<(u64, String)> = None;
		loop {
			if !self.pending.is_empty() {
				return Ok(());
			}
			match self.tokenizer.next_token()? {
				None => {
					self.flush_content(&mut content)?;
					return match self.tag_state {
						TagState::Active => Err(LineError::new(self.tokenizer.line(), UnclosedTags)),
						TagState::Initial => Err(LineError::new(self.tokenizer.line(), MissingRootElement)),
						TagState::Finished => Ok(()),
					};
				}
				Some(tok) => self.consume_token(tok, &mut content)?,
			}
		}
	}

	fn consume_token(&mut self, tok: Token, content: &mut Option<(u64, String)>) -> LineResult<()> {
		match tok.kind {
			TokenKind::Comment | TokenKind::ProcessingInstruction | TokenKind::Doctype => Ok(()),
			TokenKind::CData => {
				let (_, buf) = content.get_or_insert_with(|| (tok.line, String::new()));
				buf.push_str(&tok.text);
				Ok(())
			}
			TokenKind::Text => {
				let decoded = entities::decode(&tok.text, tok.line)?;
				let (_, buf) = content.get_or_insert_with(|| (tok.line, String::new()));
				buf.push_str(&decoded);
				Ok(())
			}
			TokenKind::Tag => {
				self.flush_content(content)?;
				self.process_tag(&tok.text, tok.line)
			}
		}
	}

	fn flush_content(&mut self, content: &mut Option<(u64, String)>) -> LineResult<()> {
		let (line, raw) = match content.take() {
			Some(v) => v,
			None => return Ok(()),
		};
		if raw.is_empty() {
			return Ok(());
		}
		if self.tag_state != TagState::Active {
			if let Some(offset) = raw.find(|c: char| !matches!(c, ' ' | '\t' | '\n')) {
				let bad_line = line + raw[..offset].matches('\n').count() as u64;
				return Err(LineError::new(bad_line, TextContentNotAllowedOutsideRoot));
			}
			return Ok(());
		}
		let normalized = text::normalize_line_breaks(&raw);
		let nfc_text = text::nfc(&normalized);
		self.pending.push_back(LoadedEvent { line, event: Event::Text(nfc_text) });
		Ok(())
	}

	fn process_tag(&mut self, raw: &str, start_line: u64) -> LineResult<()> {
		let t = tag::parse(raw, start_line)?;
		let is_open = matches!(t.kind, TagKind::Start | TagKind::Empty);
		let is_close = matches!(t.kind, TagKind::End | TagKind::Empty);

		if is_open {
			if self.tag_state == TagState::Finished {
				return Err(LineError::new(t.line, MultipleRootElements));
			}
			self.element_stack.push(t.name.clone());
			self.tag_state = TagState::Active;
		}

		if is_close {
			if self.tag_state != TagState::Active {
				return Err(LineError::new(t.line, TagPairingError));
			}
			let top = self.element_stack.last().expect("active tag state implies a non-empty element stack");
			if top != &t.name {
				return Err(LineError::new(t.line, TagPairingError));
			}
			self.element_stack.pop();
			if self.element_stack.is_empty() {
				self.tag_state = TagState::Finished;
			}
		}

		if is_open {
			self.namespaces.push_for_element(&t.attrs)?;
		}

		let start_event = if is_open {
			let frame = self.namespaces.top().clone();
			let namespace = namespaces::resolve_element_namespace(&frame, &t.name, t.name_line)?;
			let resolved = namespaces::resolve_attributes(&frame, &t.attrs)?;
			Some(Event::Start {
				name: namespaces::local_name(&t.name).to_string(),
				namespace,
				plain: resolved.plain,
				external: resolved.external,
			})
		} else {
			None
		};

		if is_close {
			self.namespaces.pop();
		}

		if let Some(event) = start_event {
			self.pending.push_back(LoadedEvent { line: t.line, event });
		}
		if is_close {
			self.pending.push_back(LoadedEvent { line: t.line, event: Event::End });
		}
		Ok(())
	}

	fn current(&self) -> std::result::Result<&LoadedEvent, CallerError> {
		self.current.as_ref().ok_or_else(|| CallerError::new("no event is loaded; call read_event first"))
	}

	/// The kind of the currently loaded event.
	pub fn event_kind(&self) -> std::result::Result<EventKind, CallerError> {
		Ok(match &self.current()?.event {
			Event::Start { .. } => EventKind::Start,
			Event::Text(_) => EventKind::Text,
			Event::End => EventKind::End,
		})
	}

	/// The 1-based starting line of the currently loaded event.
	pub fn line_number(&self) -> std::result::Result<u64, CallerError> {
		Ok(self.current()?.line)
	}

	/// The NFC-normalized text of the currently loaded Text event.
	pub fn content_text(&self) -> std::result::Result<&str, CallerError> {
		match &self.current()?.event {
			Event::Text(s) => Ok(s.as_str()),
			_ => Err(CallerError::new("content_text is only valid for a Text event")),
		}
	}

	/// The local name of the currently loaded Start event.
	pub fn element_name(&self) -> std::result::Result<&str, CallerError> {
		match &self.current()?.event {
			Event::Start { name, .. } => Ok(name.as_str()),
			_ => Err(CallerError::new("element_name is only valid for a Start event")),
		}
	}

	/// The resolved namespace of the currently loaded Start event, if any.
	pub fn element_namespace(&self) -> std::result::Result<Option<&str>, CallerError> {
		match &self.current()?.event {
			Event::Start { namespace, .. } => Ok(namespace.as_deref()),
			_ => Err(CallerError::new("element_namespace is only valid for a Start event")),
		}
	}

	/// The plain (unprefixed, non-`xmlns`) attributes of the currently
	/// loaded Start event.
	pub fn attrs(&self) -> std::result::Result<&HashMap<String, String>, CallerError> {
		match &self.current()?.event {
			Event::Start { plain, .. } => Ok(plain),
			_ => Err(CallerError::new("attrs is only valid for a Start event")),
		}
	}

	/// The namespace-keyed external attributes of the currently loaded
	/// Start event.
	pub fn external_attrs(&self) -> std::result::Result<&HashMap<String, HashMap<String, String>>, CallerError> {
		match &self.current()?.event {
			Event::Start { external, .. } => Ok(external),
			_ => Err(CallerError::new("external_attrs is only valid for a Start event")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn events(input: &str) -> Vec<(EventKind, u64)> {
		let mut p = Parser::new(input).unwrap();
		let mut out = Vec::new();
		while p.read_event().unwrap() {
			out.push((p.event_kind().unwrap(), p.line_number().unwrap()));
		}
		out
	}

	#[test]
	fn empty_root_element_emits_start_then_end() {
		let evs = events("<root/>");
		assert_eq!(evs, vec![(EventKind::Start, 1), (EventKind::End, 1)]);
	}

	#[test]
	fn nested_elements_inherit_default_namespace() {
		let mut p = Parser::new("<a xmlns=\"http://ex.com/\"><b x=\"1\"/></a>").unwrap();
		assert!(p.read_event().unwrap());
		assert_eq!(p.element_name().unwrap(), "a");
		assert_eq!(p.element_namespace().unwrap(), Some("http://ex.com/"));
		assert!(p.read_event().unwrap());
		assert_eq!(p.element_name().unwrap(), "b");
		assert_eq!(p.element_namespace().unwrap(), Some("http://ex.com/"));
		assert_eq!(p.attrs().unwrap().get("x"), Some(&"1".to_string()));
		assert!(p.read_event().unwrap());
		assert_eq!(p.event_kind().unwrap(), EventKind::End);
		assert!(p.read_event().unwrap());
		assert_eq!(p.event_kind().unwrap(), EventKind::End);
		assert!(!p.read_event().unwrap());
	}

	#[test]
	fn merges_text_and_cdata_into_one_event() {
		let mut p = Parser::new("<r>hello &amp; <![CDATA[<raw>]]> world</r>").unwrap();
		assert!(p.read_event().unwrap());
		assert!(p.read_event().unwrap());
		assert_eq!(p.event_kind().unwrap(), EventKind::Text);
		assert_eq!(p.content_text().unwrap(), "hello & <raw> world");
	}

	#[test]
	fn decodes_numeric_and_named_entities_in_text() {
		let mut p = Parser::new("<r>&#x41;&#65;&amp;</r>").unwrap();
		p.read_event().unwrap();
		p.read_event().unwrap();
		assert_eq!(p.content_text().unwrap(), "AA&");
	}

	#[test]
	fn rejects_second_root_element() {
		let mut p = Parser::new("<r><a/><b/></r><c/>").unwrap();
		loop {
			match p.read_event() {
				Ok(true) => continue,
				Ok(false) => panic!("expected a ParseError before end of stream"),
				Err(e) => {
					assert_eq!(*e.kind(), MultipleRootElements);
					break;
				}
			}
		}
	}

	#[test]
	fn rejects_mapping_xml_prefix_to_non_reserved_value() {
		let mut p = Parser::new("<r xmlns:xml=\"http://other\"/>").unwrap();
		let err = loop {
			match p.read_event() {
				Ok(true) => continue,
				Ok(false) => panic!("expected a ParseError"),
				Err(e) => break e,
			}
		};
		assert_eq!(*err.kind(), CannotMapToReservedValue);
	}

	#[test]
	fn rejects_aliased_external_attribute() {
		let mut p = Parser::new("<a p:x=\"1\" q:x=\"2\" xmlns:p=\"U\" xmlns:q=\"U\"/>").unwrap();
		let err = loop {
			match p.read_event() {
				Ok(true) => continue,
				Ok(false) => panic!("expected a ParseError"),
				Err(e) => break e,
			}
		};
		assert_eq!(*err.kind(), AliasedExternalAttribute);
	}

	#[test]
	fn rejects_mismatched_end_tag() {
		let mut p = Parser::new("<a><b></a>").unwrap();
		let err = loop {
			match p.read_event() {
				Ok(true) => continue,
				Ok(false) => panic!("expected a ParseError"),
				Err(e) => break e,
			}
		};
		assert_eq!(*err.kind(), TagPairingError);
	}

	#[test]
	fn rejects_unclosed_tags_at_end_of_input() {
		let mut p = Parser::new("<a><b/>").unwrap();
		let err = loop {
			match p.read_event() {
				Ok(true) => continue,
				Ok(false) => panic!("expected a ParseError"),
				Err(e) => break e,
			}
		};
		assert_eq!(*err.kind(), UnclosedTags);
	}

	#[test]
	fn rejects_text_outside_root() {
		let mut p = Parser::new("stray<r/>").unwrap();
		let err = p.read_event().unwrap_err();
		assert_eq!(*err.kind(), TextContentNotAllowedOutsideRoot);
	}

	#[test]
	fn allows_whitespace_outside_root() {
		let evs = events("\n  <r/>\n  ");
		assert_eq!(evs, vec![(EventKind::Start, 2), (EventKind::End, 2)]);
	}

	#[test]
	fn caller_error_when_accessing_unloaded_event() {
		let p = Parser::new("<r/>").unwrap();
		assert!(p.event_kind().is_err());
	}

	#[test]
	fn caller_error_when_accessing_wrong_accessor() {
		let mut p = Parser::new("<r/>").unwrap();
		p.read_event().unwrap();
		assert!(p.content_text().is_err());
	}

	#[test]
	fn error_is_latched_after_first_parse_error() {
		let mut p = Parser::new("stray<r/>").unwrap();
		let first = p.read_event().unwrap_err();
		let second = p.read_event().unwrap_err();
		assert_eq!(first, second);
	}

	#[test]
	fn decodes_utf16le_bom_input_equivalently() {
		let mut bytes_vec = vec![0xff, 0xfe];
		for u in "<r/>".encode_utf16() {
			bytes_vec.extend_from_slice(&u.to_le_bytes());
		}
		let mut p = Parser::from_bytes(&bytes_vec).unwrap();
		assert!(p.read_event().unwrap());
		assert_eq!(p.element_name().unwrap(), "r");
		assert!(p.read_event().unwrap());
		assert!(!p.read_event().unwrap());
	}

	#[test]
	fn source_name_is_carried_into_diagnostics() {
		let mut p = Parser::new("stray<r/>").unwrap();
		p.set_source_name(Some("doc.xml".to_string()));
		assert_eq!(p.get_source_name(), Some("doc.xml"));
		let err = p.read_event().unwrap_err();
		assert_eq!(err.source_name(), Some("doc.xml"));
	}
}
