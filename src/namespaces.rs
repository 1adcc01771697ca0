/*!
# Namespace resolver

A stack of prefix→namespace frames, one per open element, with
copy-on-write sharing: an element that declares no `xmlns`/`xmlns:*`
attributes pushes a clone of the `Rc` on top rather than a fresh map.
Also resolves qualified names against the current frame and splits a
tag's raw attributes into the plain/external maps.
*/
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::error::ParseErrorKind::*;
use crate::error::{LineError, LineResult};
use crate::selectors;
use crate::tag::RawAttribute;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

pub type AttrMap = HashMap<String, String>;
pub type ExternalAttrMap = HashMap<String, AttrMap>;

/// An immutable, reference-counted prefix→namespace map.
#[derive(Debug, Clone)]
pub struct Frame(Rc<HashMap<String, String>>);

impl Frame {
	fn root() -> Frame {
		let mut map = HashMap::new();
		map.insert("xml".to_string(), XML_NAMESPACE.to_string());
		map.insert("xmlns".to_string(), XMLNS_NAMESPACE.to_string());
		Frame(Rc::new(map))
	}

	pub fn lookup(&self, prefix: &str) -> Option<&str> {
		self.0.get(prefix).map(|s| s.as_str())
	}
}

pub struct NamespaceStack {
	frames: Vec<Frame>,
}

impl NamespaceStack {
	pub fn new() -> NamespaceStack {
		NamespaceStack { frames: vec![Frame::root()] }
	}

	pub fn top(&self) -> &Frame {
		self.frames.last().expect("namespace stack is never empty")
	}

	pub fn pop(&mut self) {
		self.frames.pop();
		debug_assert!(!self.frames.is_empty(), "root frame must never be popped");
	}

	/// Validate and apply the `xmlns`/`xmlns:*` declarations found among
	/// `attrs`, pushing a new frame (shared with the current top when there
	/// are no declarations).
	pub fn push_for_element(&mut self, attrs: &[RawAttribute]) -> LineResult<()> {
		let mut decls = Vec::new();
		for a in attrs {
			if a.name == "xmlns" {
				decls.push((String::new(), a.value.clone(), a.name_line));
			} else if let Some(prefix) = a.name.strip_prefix("xmlns:") {
				decls.push((prefix.to_string(), a.value.clone(), a.name_line));
			}
		}

		if decls.is_empty() {
			let top = self.top().clone();
			self.frames.push(top);
			return Ok(());
		}

		let mut seen = HashSet::new();
		let mut new_map = (*self.top().0).clone();
		for (prefix, value, line) in decls {
			if !seen.insert(prefix.clone()) {
				return Err(LineError::new(line, RedefinitionOfPrefixOnElement));
			}
			if value.is_empty() {
				return Err(LineError::new(line, CannotMapNamespaceToEmpty));
			}
			if prefix == "xmlns" {
				return Err(LineError::new(line, CannotMapXmlnsPrefix));
			}
			if value == XMLNS_NAMESPACE {
				return Err(LineError::new(line, CannotMapToReservedValue));
			}
			if prefix == "xml" {
				if value != XML_NAMESPACE {
					return Err(LineError::new(line, CannotMapToReservedValue));
				}
			} else if value == XML_NAMESPACE {
				return Err(LineError::new(line, CannotMapToReservedValue));
			}
			new_map.insert(prefix, value);
		}
		self.frames.push(Frame(Rc::new(new_map)));
		Ok(())
	}
}

/// Split `name` into `(prefix, local)` iff it has exactly one colon and
/// both sides are valid names; otherwise `name` is used as a bare name.
pub fn split_qualified(name: &str) -> Option<(&str, &str)> {
	let mut parts = name.splitn(2, ':');
	let prefix = parts.next()?;
	let rest = parts.next()?;
	if rest.contains(':') {
		return None;
	}
	if selectors::valid_name(prefix) && selectors::valid_name(rest) {
		Some((prefix, rest))
	} else {
		None
	}
}

/// The portion of a qualified name after the colon, or the whole name if
/// it has none (or isn't validly qualified).
pub fn local_name(name: &str) -> &str {
	match split_qualified(name) {
		Some((_, local)) => local,
		None => name,
	}
}

/// Resolve an element's namespace: the prefix's mapping if qualified, the
/// default namespace (if any) otherwise.
pub fn resolve_element_namespace(frame: &Frame, name: &str, name_line: u64) -> LineResult<Option<String>> {
	match split_qualified(name) {
		Some((prefix, _local)) => {
			let ns = frame
				.lookup(prefix)
				.ok_or_else(|| LineError::new(name_line, UnmappedNamespacePrefix(prefix.to_string())))?;
			Ok(Some(ns.to_string()))
		}
		None => Ok(frame.lookup("").map(|s| s.to_string())),
	}
}

#[derive(Debug, Default)]
pub struct ResolvedAttrs {
	pub plain: AttrMap,
	pub external: ExternalAttrMap,
}

/// Split a tag's raw (unresolved) attribute list into plain attributes
/// (no prefix, not bare `xmlns`) and external attributes (prefixed,
/// prefix not `xmlns`), resolving each prefixed name's namespace.
pub fn resolve_attributes(frame: &Frame, attrs: &[RawAttribute]) -> LineResult<ResolvedAttrs> {
	let mut plain = AttrMap::new();
	let mut external = ExternalAttrMap::new();
	let mut seen_pairs: HashMap<(String, String), String> = HashMap::new();

	for a in attrs {
		if a.name == "xmlns" || a.name.starts_with("xmlns:") {
			continue;
		}
		match split_qualified(&a.name) {
			Some((prefix, local)) => {
				let ns = frame
					.lookup(prefix)
					.ok_or_else(|| LineError::new(a.name_line, UnmappedNamespacePrefix(prefix.to_string())))?
					.to_string();
				let key = (ns.clone(), local.to_string());
				if let Some(prev_prefix) = seen_pairs.get(&key) {
					if prev_prefix != prefix {
						return Err(LineError::new(a.name_line, AliasedExternalAttribute));
					}
				}
				seen_pairs.insert(key, prefix.to_string());
				external.entry(ns).or_insert_with(AttrMap::new).insert(local.to_string(), a.value.clone());
			}
			None => {
				plain.insert(a.name.clone(), a.value.clone());
			}
		}
	}
	Ok(ResolvedAttrs { plain, external })
}

#[cfg(test)]
mod tests {
	use super::*;

	fn attr(name: &str, value: &str) -> RawAttribute {
		RawAttribute { name: name.to_string(), name_line: 1, value: value.to_string(), value_line: 1 }
	}

	#[test]
	fn root_frame_maps_xml_and_xmlns() {
		let stack = NamespaceStack::new();
		assert_eq!(stack.top().lookup("xml"), Some(XML_NAMESPACE));
		assert_eq!(stack.top().lookup("xmlns"), Some(XMLNS_NAMESPACE));
	}

	#[test]
	fn declares_default_namespace() {
		let mut stack = NamespaceStack::new();
		stack.push_for_element(&[attr("xmlns", "http://ex.com/")]).unwrap();
		assert_eq!(stack.top().lookup(""), Some("http://ex.com/"));
	}

	#[test]
	fn declares_prefixed_namespace() {
		let mut stack = NamespaceStack::new();
		stack.push_for_element(&[attr("xmlns:p", "http://ex.com/")]).unwrap();
		assert_eq!(stack.top().lookup("p"), Some("http://ex.com/"));
	}

	#[test]
	fn no_declarations_shares_the_parent_frame() {
		let mut stack = NamespaceStack::new();
		stack.push_for_element(&[attr("x", "1")]).unwrap();
		assert_eq!(stack.top().lookup("xml"), Some(XML_NAMESPACE));
	}

	#[test]
	fn rejects_empty_namespace_value() {
		let mut stack = NamespaceStack::new();
		let err = stack.push_for_element(&[attr("xmlns", "")]).unwrap_err();
		assert_eq!(err.kind, CannotMapNamespaceToEmpty);
	}

	#[test]
	fn rejects_mapping_xmlns_prefix() {
		let mut stack = NamespaceStack::new();
		let err = stack.push_for_element(&[attr("xmlns:xmlns", "http://ex.com/")]).unwrap_err();
		assert_eq!(err.kind, CannotMapXmlnsPrefix);
	}

	#[test]
	fn rejects_remapping_xml_prefix_to_other_value() {
		let mut stack = NamespaceStack::new();
		let err = stack.push_for_element(&[attr("xmlns:xml", "http://other")]).unwrap_err();
		assert_eq!(err.kind, CannotMapToReservedValue);
	}

	#[test]
	fn rejects_reusing_xml_reserved_value_for_other_prefix() {
		let mut stack = NamespaceStack::new();
		let err = stack.push_for_element(&[attr("xmlns:p", XML_NAMESPACE)]).unwrap_err();
		assert_eq!(err.kind, CannotMapToReservedValue);
	}

	#[test]
	fn split_qualified_accepts_single_colon_with_valid_sides() {
		assert_eq!(split_qualified("p:x"), Some(("p", "x")));
	}

	#[test]
	fn split_qualified_falls_back_to_bare_on_multiple_colons() {
		assert_eq!(split_qualified("p:x:y"), None);
		assert_eq!(local_name("p:x:y"), "p:x:y");
	}

	#[test]
	fn resolves_external_attribute_namespace() {
		let mut stack = NamespaceStack::new();
		stack.push_for_element(&[attr("xmlns:p", "U")]).unwrap();
		let resolved = resolve_attributes(stack.top(), &[attr("p:x", "1")]).unwrap();
		assert_eq!(resolved.external.get("U").and_then(|m| m.get("x")), Some(&"1".to_string()));
		assert!(resolved.plain.is_empty());
	}

	#[test]
	fn rejects_aliased_external_attribute() {
		let mut stack = NamespaceStack::new();
		stack.push_for_element(&[attr("xmlns:p", "U"), attr("xmlns:q", "U")]).unwrap();
		let err = resolve_attributes(stack.top(), &[attr("p:x", "1"), attr("q:x", "2")]).unwrap_err();
		assert_eq!(err.kind, AliasedExternalAttribute);
	}

	#[test]
	fn rejects_unmapped_attribute_prefix() {
		let stack = NamespaceStack::new();
		let err = resolve_attributes(stack.top(), &[attr("p:x", "1")]).unwrap_err();
		assert!(matches!(err.kind, UnmappedNamespacePrefix(ref p) if p == "p"));
	}
}
