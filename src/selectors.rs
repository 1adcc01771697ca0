/*!
# Codepoint predicates

Pure, locale-independent range tests over Unicode scalar values, used
throughout the lexer, tag parser and namespace resolver to decide which
codepoints may appear where.
*/
use std::fmt;

pub trait CharSelector {
	fn select(&self, c: char) -> bool;
}

#[derive(Debug, Copy, Clone)]
pub struct AllChars();

impl CharSelector for char {
	fn select(&self, c: char) -> bool {
		*self == c
	}
}

impl CharSelector for &'_ [char] {
	fn select(&self, c: char) -> bool {
		self.iter().any(|r| *r == c)
	}
}

impl CharSelector for AllChars {
	fn select(&self, _c: char) -> bool {
		true
	}
}

// inclusive start/end; some endpoints are not themselves valid `char`s
// (e.g. surrogate-adjacent boundaries), hence u32 rather than char.
#[derive(Debug, Copy, Clone)]
pub struct CodepointRange(pub u32, pub u32);

impl CodepointRange {
	pub fn contains(&self, cp: u32) -> bool {
		self.0 <= cp && cp <= self.1
	}
}

#[derive(Copy)]
pub struct CodepointRanges(pub &'static [CodepointRange]);

impl CodepointRanges {
	pub fn select_cp(&self, cp: u32) -> bool {
		self.0.iter().any(|r| r.contains(cp))
	}
}

impl CharSelector for CodepointRanges {
	fn select(&self, c: char) -> bool {
		self.select_cp(c as u32)
	}
}

impl fmt::Debug for CodepointRanges {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "CodepointRanges(<{} ranges>)", self.0.len())
	}
}

impl Clone for CodepointRanges {
	fn clone(&self) -> Self {
		CodepointRanges(self.0)
	}
}

// The valid codepoint set V, before the per-plane noncharacter exclusion.
const VALID_RANGES: &'static [CodepointRange] = &[
	CodepointRange(0x0009, 0x0009),
	CodepointRange(0x000a, 0x000a),
	CodepointRange(0x000d, 0x000d),
	CodepointRange(0x0020, 0x007e),
	CodepointRange(0x0085, 0x0085),
	CodepointRange(0x00a0, 0xd7ff),
	CodepointRange(0xe000, 0xfdcf),
	CodepointRange(0xfdf0, 0x10fffd),
];

pub static CLASS_VALID: CodepointRanges = CodepointRanges(VALID_RANGES);

/// True iff `cp & 0xFFFF` is `0xFFFE` or `0xFFFF`, i.e. `cp` is one of the
/// per-plane noncharacters excluded from V regardless of plane.
fn is_plane_noncharacter(cp: u32) -> bool {
	let low = cp & 0xffff;
	low == 0xfffe || low == 0xffff
}

/// `valid_codepoint(c)`: true iff `c` is in the valid set V.
pub fn valid_codepoint(cp: u32) -> bool {
	CLASS_VALID.select_cp(cp) && !is_plane_noncharacter(cp)
}

/// `valid_string(s)`: true iff every codepoint of `s` is in V. The empty
/// string passes.
pub fn valid_string(s: &str) -> bool {
	s.chars().all(|c| valid_codepoint(c as u32))
}

/// Find the first codepoint of `s` which fails `valid_codepoint`, if any.
/// Used to produce precise diagnostics after a cheap `valid_string` check
/// has already failed.
pub fn first_invalid_codepoint(s: &str) -> Option<char> {
	s.chars().find(|c| !valid_codepoint(*c as u32))
}

// XML 1.0 §2.3 [4a] NameChar, used as "the XML name class".
const NAME_RANGES: &'static [CodepointRange] = &[
	CodepointRange(0x3a, 0x3a), // :
	CodepointRange(0x2d, 0x2d), // -
	CodepointRange(0x2e, 0x2e), // .
	CodepointRange(0x41, 0x5a), // A-Z
	CodepointRange(0x5f, 0x5f), // _
	CodepointRange(0x30, 0x39), // 0-9
	CodepointRange(0x61, 0x7a), // a-z
	CodepointRange(0xb7, 0xb7),
	CodepointRange(0xc0, 0xd6),
	CodepointRange(0xd8, 0xf6),
	CodepointRange(0xf8, 0x2ff),
	CodepointRange(0x300, 0x36f),
	CodepointRange(0x370, 0x37d),
	CodepointRange(0x37f, 0x1fff),
	CodepointRange(0x200c, 0x200d),
	CodepointRange(0x203f, 0x2040),
	CodepointRange(0x2070, 0x218f),
	CodepointRange(0x2c00, 0x2fef),
	CodepointRange(0x3001, 0xd7ff),
	CodepointRange(0xf900, 0xfdcf),
	CodepointRange(0x10000, 0xeffff),
];

// XML 1.0 §2.3 [4] NameStartChar.
const NAME_START_RANGES: &'static [CodepointRange] = &[
	CodepointRange(0x3a, 0x3a),
	CodepointRange(0x41, 0x5a),
	CodepointRange(0x5f, 0x5f),
	CodepointRange(0x61, 0x7a),
	CodepointRange(0xc0, 0xd6),
	CodepointRange(0xd8, 0xf6),
	CodepointRange(0xf8, 0x2ff),
	CodepointRange(0x370, 0x37d),
	CodepointRange(0x37f, 0x1fff),
	CodepointRange(0x200c, 0x200d),
	CodepointRange(0x2070, 0x218f),
	CodepointRange(0x2c00, 0x2fef),
	CodepointRange(0x3001, 0xd7ff),
	CodepointRange(0xf900, 0xfdcf),
	CodepointRange(0x10000, 0xeffff),
];

pub static CLASS_XML_NAME: CodepointRanges = CodepointRanges(NAME_RANGES);
pub static CLASS_XML_NAMESTART: CodepointRanges = CodepointRanges(NAME_START_RANGES);
pub static CLASS_XML_SPACES: &'static [char] = &[' ', '\t', '\r', '\n'];

const HEX_RANGES: &'static [CodepointRange] = &[
	CodepointRange(0x30, 0x39),
	CodepointRange(0x41, 0x46),
	CodepointRange(0x61, 0x66),
];
pub static CLASS_HEX_DIGIT: CodepointRanges = CodepointRanges(HEX_RANGES);

/// `name_first_allowed(c)`: true iff `c` may start a Name, i.e. is not one
/// of the "name-start exclusions" {U+002D, U+002E, U+0030-U+0039, U+00B7,
/// U+0300-U+036F, U+203F, U+2040} and is itself in the name class.
pub fn name_first_allowed(c: char) -> bool {
	CLASS_XML_NAMESTART.select(c)
}

/// `valid_name(s)`: non-empty, every codepoint in the name class, first
/// codepoint not in the name-start exclusions.
pub fn valid_name(s: &str) -> bool {
	let mut chars = s.chars();
	match chars.next() {
		None => return false,
		Some(c) => {
			if !name_first_allowed(c) {
				return false;
			}
		}
	}
	chars.all(|c| CLASS_XML_NAME.select(c))
}
