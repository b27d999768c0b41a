/*!
# Character classes from the XML 1.0 grammar

The contents of this module are implementation details of `nsxml` and
`nsxml_validation` and should not be relied upon.
*/

/// Return true if `c` may start an XML 1.0 `Name` (XML 1.0 § 2.3 \[4\]).
///
/// The colon is included, as it is part of the `Name` production. Use
/// [`is_ncname_start`] for the namespaced variant.
#[inline]
pub fn is_name_start(c: char) -> bool {
	matches!(c,
		':' | 'A'..='Z' | '_' | 'a'..='z'
		| '\u{c0}'..='\u{d6}'
		| '\u{d8}'..='\u{f6}'
		| '\u{f8}'..='\u{2ff}'
		| '\u{370}'..='\u{37d}'
		| '\u{37f}'..='\u{1fff}'
		| '\u{200c}'..='\u{200d}'
		| '\u{2070}'..='\u{218f}'
		| '\u{2c00}'..='\u{2fef}'
		| '\u{3001}'..='\u{d7ff}'
		| '\u{f900}'..='\u{fdcf}'
		| '\u{fdf0}'..='\u{fffd}'
		| '\u{10000}'..='\u{effff}'
	)
}

/// Return true if `c` may occur after the first position of an XML 1.0
/// `Name` (XML 1.0 § 2.3 \[4a\]).
#[inline]
pub fn is_name_char(c: char) -> bool {
	is_name_start(c)
		|| matches!(c,
			'-' | '.' | '0'..='9' | '\u{b7}'
			| '\u{300}'..='\u{36f}'
			| '\u{203f}'..='\u{2040}'
		)
}

/// Like [`is_name_start`], but excluding the colon.
#[inline]
pub fn is_ncname_start(c: char) -> bool {
	c != ':' && is_name_start(c)
}

/// Like [`is_name_char`], but excluding the colon.
#[inline]
pub fn is_ncname_char(c: char) -> bool {
	c != ':' && is_name_char(c)
}

/// Return true if `c` is an XML 1.0 `Char` (XML 1.0 § 2.2 \[2\]).
///
/// Surrogates cannot be represented by [`char`] and need no handling.
#[inline]
pub fn is_xml_char(c: char) -> bool {
	matches!(c,
		'\x09' | '\x0a' | '\x0d'
		| '\u{20}'..='\u{d7ff}'
		| '\u{e000}'..='\u{fffd}'
		| '\u{10000}'..='\u{10ffff}'
	)
}

/// Return true if `c` is XML whitespace (XML 1.0 § 2.3 \[3\]).
#[inline]
pub fn is_space(c: char) -> bool {
	matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Byte variant of [`is_space`].
#[inline]
pub fn is_space_byte(b: u8) -> bool {
	matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn name_chars_are_a_superset_of_name_start_chars() {
		for cp in 0x0..=0x10ffffu32 {
			if let Some(ch) = std::char::from_u32(cp) {
				if is_name_start(ch) && !is_name_char(ch) {
					panic!("U+{:x} may start a name but not continue it", cp)
				}
			}
		}
	}

	#[test]
	fn ncname_classes_reject_colon_only() {
		assert!(is_name_start(':'));
		assert!(!is_ncname_start(':'));
		assert!(!is_ncname_char(':'));
		assert!(is_ncname_start('a'));
		assert!(is_ncname_char('-'));
		assert!(!is_ncname_start('-'));
	}

	#[test]
	fn xml_char_excludes_controls_and_nonchars() {
		assert!(is_xml_char('\t'));
		assert!(!is_xml_char('\x00'));
		assert!(!is_xml_char('\x0b'));
		assert!(!is_xml_char('\u{fffe}'));
		assert!(!is_xml_char('\u{ffff}'));
		assert!(is_xml_char('\u{10000}'));
	}
}
