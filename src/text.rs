/*!
# Text normalizers

Line-break normalization, attribute whitespace compression, and NFC
normalization. These are pure string-to-string functions
applied at well-defined points in the pipeline: line-break normalization
on every token the lexer emits, whitespace compression on attribute
values only, and NFC on names and on text/attribute values after
entity decoding.
*/
use unicode_normalization::UnicodeNormalization;

/// Normalize line breaks to a single U+000A, applying the longest-match
/// rewrites in order:
///
/// 1. `U+000D U+000A` -> `U+000A`
/// 2. `U+000D U+0085` -> `U+000A`
/// 3. any remaining `U+000D`, `U+0085`, or `U+2028` -> `U+000A`
pub fn normalize_line_breaks(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	let mut chars = s.chars().peekable();
	while let Some(c) = chars.next() {
		match c {
			'\r' => {
				match chars.peek() {
					Some('\n') | Some('\u{0085}') => {
						chars.next();
					}
					_ => (),
				}
				out.push('\n');
			}
			'\u{0085}' | '\u{2028}' => out.push('\n'),
			other => out.push(other),
		}
	}
	out
}

/// Replace every maximal run of {U+0009, U+000A, U+000D, U+0020} with a
/// single U+0020, then strip a single leading and single trailing
/// U+0020. Applied to attribute values only, after entity decoding.
pub fn compress_whitespace(s: &str) -> String {
	fn is_space(c: char) -> bool {
		matches!(c, '\u{09}' | '\u{0a}' | '\u{0d}' | '\u{20}')
	}

	let mut out = String::with_capacity(s.len());
	let mut in_run = false;
	for c in s.chars() {
		if is_space(c) {
			if !in_run {
				out.push(' ');
				in_run = true;
			}
		} else {
			out.push(c);
			in_run = false;
		}
	}
	if out.starts_with(' ') {
		out.remove(0);
	}
	if out.ends_with(' ') {
		out.pop();
	}
	out
}

/// Normalize `s` to Unicode Normalization Form C.
pub fn nfc(s: &str) -> String {
	s.nfc().collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalize_line_breaks_folds_crlf() {
		assert_eq!(normalize_line_breaks("a\r\nb"), "a\nb");
	}

	#[test]
	fn normalize_line_breaks_folds_cr_nel() {
		assert_eq!(normalize_line_breaks("a\r\u{0085}b"), "a\nb");
	}

	#[test]
	fn normalize_line_breaks_folds_lone_cr_nel_ls() {
		assert_eq!(normalize_line_breaks("a\rb\u{0085}c\u{2028}d"), "a\nb\nc\nd");
	}

	#[test]
	fn normalize_line_breaks_leaves_lone_lf() {
		assert_eq!(normalize_line_breaks("a\nb"), "a\nb");
	}

	#[test]
	fn compress_whitespace_collapses_runs_and_trims_ends() {
		assert_eq!(compress_whitespace("  a\t\n b   c  "), "a b c");
	}

	#[test]
	fn compress_whitespace_handles_all_whitespace() {
		assert_eq!(compress_whitespace("   \t\n  "), "");
	}

	#[test]
	fn nfc_composes_combining_sequences() {
		// "e" + combining acute -> U+00E9 (é)
		let decomposed = "e\u{0301}";
		assert_eq!(nfc(decomposed), "\u{00e9}");
	}
}
