/*!
# Validator functions for XML-related strings

This is a supplementary crate for `nsxml`. It holds the character classes of
the XML 1.0 grammar and the checks built on top of them, so that they can be
shared between the lexer and the string types without pulling in the parser.
*/
use std::fmt;

pub mod chars;

/**
Error condition from validating an XML string.
*/
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
	/// A Name or NCName was empty.
	EmptyName,
	/// An invalid character was encountered.
	///
	/// This variant contains the character as data.
	InvalidChar(char),
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::EmptyName => f.write_str("Name and NCName must not be empty"),
			Self::InvalidChar(c) => write!(f, "character U+{:04x} is not allowed", *c as u32),
		}
	}
}

impl std::error::Error for Error {}

fn validate_with(s: &str, start: fn(char) -> bool, rest: fn(char) -> bool) -> Result<(), Error> {
	let mut chars = s.chars();
	match chars.next() {
		None => return Err(Error::EmptyName),
		Some(c) if !start(c) => return Err(Error::InvalidChar(c)),
		Some(_) => (),
	}
	match chars.find(|&c| !rest(c)) {
		Some(c) => Err(Error::InvalidChar(c)),
		None => Ok(()),
	}
}

/**
Check whether a str is a valid XML 1.0 Name

# Example

```rust
use nsxml_validation::{validate_name, Error};

assert!(validate_name("foobar").is_ok());
assert!(validate_name("foo:bar").is_ok());
assert!(matches!(validate_name("foo bar"), Err(Error::InvalidChar(' '))));
assert!(matches!(validate_name(""), Err(Error::EmptyName)));
```
*/
pub fn validate_name(s: &str) -> Result<(), Error> {
	validate_with(s, chars::is_name_start, chars::is_name_char)
}

/**
Check whether a str is a valid XML 1.0 Name, without colons.

# Example

```rust
use nsxml_validation::{validate_ncname, Error};

assert!(validate_ncname("foobar").is_ok());
assert!(matches!(validate_ncname("foo:bar"), Err(Error::InvalidChar(':'))));
assert!(matches!(validate_ncname(""), Err(Error::EmptyName)));
```
*/
pub fn validate_ncname(s: &str) -> Result<(), Error> {
	validate_with(s, chars::is_ncname_start, chars::is_ncname_char)
}

/**
Check whether a str is valid XML 1.0 character data

# Example

```rust
use nsxml_validation::{validate_cdata, Error};

assert!(validate_cdata("foo bar baz <fnord!>").is_ok());
assert!(matches!(validate_cdata("\x01"), Err(Error::InvalidChar('\x01'))));
```
*/
pub fn validate_cdata(s: &str) -> Result<(), Error> {
	match s.chars().find(|&c| !chars::is_xml_char(c)) {
		Some(c) => Err(Error::InvalidChar(c)),
		None => Ok(()),
	}
}
