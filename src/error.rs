/*!
# Error types

This module holds the error types returned by the parser: [`ParseError`]
for well-formedness and namespace violations found while parsing, and
[`CallerError`] for misuse of the accessor API in [`crate::Parser`].

Both are hand-rolled with manual [`fmt::Display`]/[`std::error::Error`]
impls rather than a derive-macro crate, following the style of this
crate's teacher (`rxml::error`).
*/
use std::error;
use std::fmt;

/// The specific well-formedness or namespace-well-formedness violation
/// which caused a [`ParseError`].
///
/// Each variant carries whatever detail its message template needs.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
	/// A bare `<` was encountered where no known token starts.
	TokenizationFailed,
	/// A codepoint outside the valid set V was found in a token.
	InvalidCodepoint(u32),
	/// A tag token could not be split into kind/name/attributes.
	TagParseFailure,
	/// An element name failed `valid_name` after NFC normalization.
	InvalidTagName,
	/// An attribute name failed `valid_name` after NFC normalization.
	InvalidAttributeName,
	/// An attribute value contained an unescaped `<`.
	UnescapedLessThanInAttributeValue,
	/// A bare `&` was found which does not begin a recognized escape.
	AmpersandMustBePartOfEscape,
	/// A named entity other than `amp`/`lt`/`gt`/`apos`/`quot`.
	UnrecognizedNamedEntity(String),
	/// A numeric character reference decoded to a codepoint outside V.
	EscapedCodepointOutOfRange(u32),
	/// A `&#...;`/`&#x...;` escape was malformed.
	InvalidEntityEscape,
	/// A second top-level element start was seen after the root closed.
	MultipleRootElements,
	/// The input ended with open elements remaining on the stack.
	UnclosedTags,
	/// The input ended (or closed) without ever opening a root element.
	MissingRootElement,
	/// An end tag's name did not match the innermost open start tag.
	TagPairingError,
	/// An end tag carried one or more attributes.
	ClosingTagsMayNotHaveAttributes,
	/// An `xmlns`/`xmlns:*` declaration used the empty string as its value.
	CannotMapNamespaceToEmpty,
	/// An attempt to declare `xmlns:xmlns`.
	CannotMapXmlnsPrefix,
	/// An attempt to (re)use a reserved namespace value, or to map `xml`
	/// to anything other than its reserved value.
	CannotMapToReservedValue,
	/// The same prefix was declared twice on the same element.
	RedefinitionOfPrefixOnElement,
	/// A prefix was used that has no declaration in scope.
	UnmappedNamespacePrefix(String),
	/// Two attributes on the same tag resolved to the same (namespace,
	/// local) pair via different prefixes.
	AliasedExternalAttribute,
	/// Two attributes (or an attribute and an implicit declaration) shared
	/// the same name on the same tag.
	DuplicateAttribute(String),
	/// Non-whitespace text content appeared outside the root element.
	TextContentNotAllowedOutsideRoot,
	/// The input ended, or text was found, in a state that is not valid
	/// well-formed XML but doesn't fit a more specific variant above.
	InvalidSyntax(&'static str),
}

impl fmt::Display for ParseErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::TokenizationFailed => write!(f, "tokenization failed"),
			Self::InvalidCodepoint(cp) => write!(f, "invalid codepoint U+{:04X}", cp),
			Self::TagParseFailure => write!(f, "tag parse failure"),
			Self::InvalidTagName => write!(f, "invalid tag name"),
			Self::InvalidAttributeName => write!(f, "invalid attribute name"),
			Self::UnescapedLessThanInAttributeValue => {
				write!(f, "attribute value contains unescaped '<'")
			}
			Self::AmpersandMustBePartOfEscape => write!(f, "ampersand must be part of escape"),
			Self::UnrecognizedNamedEntity(name) => {
				write!(f, "unrecognized named entity '{}'", name)
			}
			Self::EscapedCodepointOutOfRange(cp) => {
				write!(f, "escaped codepoint out of range U+{:04X}", cp)
			}
			Self::InvalidEntityEscape => write!(f, "invalid entity escape"),
			Self::MultipleRootElements => write!(f, "multiple root elements"),
			Self::UnclosedTags => write!(f, "unclosed tags"),
			Self::MissingRootElement => write!(f, "missing root element"),
			Self::TagPairingError => write!(f, "tag pairing error"),
			Self::ClosingTagsMayNotHaveAttributes => {
				write!(f, "closing tags may not have attributes")
			}
			Self::CannotMapNamespaceToEmpty => write!(f, "can't map namespace to empty"),
			Self::CannotMapXmlnsPrefix => write!(f, "can't map xmlns prefix"),
			Self::CannotMapToReservedValue => {
				write!(f, "can't map to reserved xmlns/xml value")
			}
			Self::RedefinitionOfPrefixOnElement => {
				write!(f, "redefinition of prefix on element")
			}
			Self::UnmappedNamespacePrefix(prefix) => {
				write!(f, "unmapped namespace prefix '{}'", prefix)
			}
			Self::AliasedExternalAttribute => write!(f, "aliased external attribute"),
			Self::DuplicateAttribute(name) => write!(f, "duplicate attribute '{}'", name),
			Self::TextContentNotAllowedOutsideRoot => {
				write!(f, "text content not allowed outside root element")
			}
			Self::InvalidSyntax(msg) => write!(f, "{}", msg),
		}
	}
}

/// A fatal, sticky parse error: a violation of well-formedness or
/// namespace-well-formedness, with diagnostic context.
///
/// Carries an optional source name, an optional 1-based starting line, and
/// the specific [`ParseErrorKind`]. Formats as `"<name>": line N: detail`,
/// with the name and/or line omitted when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
	source_name: Option<String>,
	line: Option<u64>,
	kind: ParseErrorKind,
}

impl ParseError {
	pub(crate) fn new(source_name: Option<String>, line: Option<u64>, kind: ParseErrorKind) -> ParseError {
		ParseError { source_name, line, kind }
	}

	/// The specific violation which caused this error.
	pub fn kind(&self) -> &ParseErrorKind {
		&self.kind
	}

	/// The source name in effect when the error was raised, if any.
	pub fn source_name(&self) -> Option<&str> {
		self.source_name.as_deref()
	}

	/// The 1-based line at which the error was detected, if known.
	pub fn line(&self) -> Option<u64> {
		self.line
	}
}

impl fmt::Display for ParseError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let mut wrote = false;
		if let Some(name) = self.source_name.as_ref() {
			write!(f, "\"{}\"", name)?;
			wrote = true;
		}
		if let Some(line) = self.line {
			if wrote {
				f.write_str(": ")?;
			}
			write!(f, "line {}", line)?;
			wrote = true;
		}
		if wrote {
			f.write_str(": ")?;
		}
		write!(f, "{}", self.kind)
	}
}

impl error::Error for ParseError {}

/// A [`ParseErrorKind`] paired with the line it was detected at, before
/// the parser's current source name is available to attach.
///
/// Leaf components (the entity decoder, the tag parser, the tokenizer)
/// return this rather than a full [`ParseError`], since they have no
/// notion of the source name configured on the top-level [`crate::Parser`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LineError {
	pub line: Option<u64>,
	pub kind: ParseErrorKind,
}

impl LineError {
	pub fn new(line: u64, kind: ParseErrorKind) -> LineError {
		LineError { line: Some(line), kind }
	}

	/// Construct a `LineError` with no associated line, for failures
	/// detected before any line-counted token has been produced.
	pub fn without_line(kind: ParseErrorKind) -> LineError {
		LineError { line: None, kind }
	}

	pub fn into_parse_error(self, source_name: Option<String>) -> ParseError {
		ParseError::new(source_name, self.line, self.kind)
	}
}

pub(crate) type LineResult<T> = std::result::Result<T, LineError>;

/// Misuse of the accessor API: calling an accessor that is only valid for
/// a different event kind, or before the first [`crate::Parser::read_event`]
/// call.
///
/// This is a distinct category from [`ParseError`]: it indicates a bug in
/// the calling code, not a problem with the input document.
#[derive(Debug, Clone, PartialEq)]
pub struct CallerError {
	message: &'static str,
}

impl CallerError {
	pub(crate) fn new(message: &'static str) -> CallerError {
		CallerError { message }
	}
}

impl fmt::Display for CallerError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.message)
	}
}

impl error::Error for CallerError {}

pub type Result<T> = std::result::Result<T, ParseError>;
