/*!
# Error types

This module holds the error types returned by the various functions of this
crate.

Errors fall into three groups:

* Fatal document errors ([`Error::NotWellFormed`],
  [`Error::NotNamespaceWellFormed`], [`Error::InvalidUtf8Byte`],
  [`Error::RestrictedXml`]) and fatal resource errors
  ([`Error::OutOfMemory`]), as well as [`Error::Aborted`]. These poison the
  parser: it enters [`ParsingStatus::Error`] and returns the same error until
  it is reset.
* Usage errors ([`Error::InvalidOperation`]). These are returned when an
  operation is not allowed in the current [`ParsingStatus`]; the parser state
  is left untouched.
* I/O errors ([`Error::IO`]) from drivers, which are passed through and may
  be retried.

   [`ParsingStatus`]: crate::ParsingStatus
   [`ParsingStatus::Error`]: crate::ParsingStatus::Error
*/
use std::error;
use std::fmt;
use std::io;
use std::ops::Deref;
use std::result::Result as StdResult;
use std::sync::Arc;

use smartstring::alias::String as SmartString;

use nsxml_validation::Error as ValidationError;

pub use crate::errctx::*;

/// Violation of a well-formedness constraint or the XML 1.0 grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum WFError {
	/// End-of-file encountered during a construct where more data was
	/// expected.
	///
	/// The contents are implementation details.
	InvalidEof(&'static str),

	/// Attempt to refer to an undeclared entity.
	///
	/// Only the five predefined entities of XML 1.0 are known.
	UndeclaredEntity,

	/// Unicode codepoint which is not allowed in XML 1.0 encountered.
	///
	/// The boolean indicates whether the codepoint was produced by a
	/// character reference.
	InvalidChar(&'static str, u32, bool),

	/// Unicode codepoint which was not expected at that point in the
	/// grammar.
	UnexpectedChar(&'static str, char, Option<&'static [&'static str]>),

	/// Generalized invalid syntactic construct which does not fit into any
	/// of the other categories.
	InvalidSyntax(&'static str),

	/// Token was not expected at that point in the grammar.
	UnexpectedToken(&'static str, &'static str, Option<&'static [&'static str]>),

	/// Attribute was declared multiple times in the same element.
	///
	/// Contains the raw name of the offending attribute.
	///
	/// **Note:** This will also be emitted for namespaced attributes which
	/// resolve to the same `(uri, localname)` pair after prefix resolution,
	/// even though that is technically a namespace-well-formedness
	/// constraint.
	DuplicateAttribute(SmartString),

	/// Ending tag name does not match opening tag.
	ElementMismatch {
		/// Raw name of the element which is open.
		open: SmartString,
		/// Raw name found in the end tag.
		end: SmartString,
	},
}

impl error::Error for WFError {}

impl ErrorWithContext for WFError {
	fn with_context(self, ctx: &'static str) -> WFError {
		match self {
			WFError::InvalidEof(_) => WFError::InvalidEof(ctx),
			WFError::InvalidChar(_, cp, fromref) => WFError::InvalidChar(ctx, cp, fromref),
			WFError::UnexpectedChar(_, ch, alt) => WFError::UnexpectedChar(ctx, ch, alt),
			WFError::UnexpectedToken(_, tok, alt) => WFError::UnexpectedToken(ctx, tok, alt),
			other => other,
		}
	}
}

fn write_alternatives(f: &mut fmt::Formatter, opts: &[&'static str]) -> fmt::Result {
	f.write_str(" (expected ")?;
	if opts.len() > 1 {
		f.write_str("one of: ")?;
	}
	for (i, opt) in opts.iter().enumerate() {
		if i > 0 {
			f.write_str(", ")?;
		}
		f.write_str(opt)?;
	}
	f.write_str(")")
}

impl fmt::Display for WFError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			WFError::InvalidEof(ctx) => write!(f, "invalid eof {}", ctx),
			WFError::UndeclaredEntity => write!(f, "use of undeclared entity"),
			WFError::InvalidChar(ctx, cp, false) => {
				write!(f, "invalid codepoint U+{:x} {}", cp, ctx)
			}
			WFError::InvalidChar(ctx, cp, true) => write!(
				f,
				"character reference expanded to invalid codepoint U+{:x} {}",
				cp, ctx
			),
			WFError::UnexpectedChar(ctx, ch, opts) => {
				write!(f, "U+{:x} not allowed {}", *ch as u32, ctx)?;
				match opts {
					Some(opts) if opts.len() > 0 => write_alternatives(f, opts),
					_ => Ok(()),
				}
			}
			WFError::InvalidSyntax(msg) => write!(f, "invalid syntax: {}", msg),
			WFError::UnexpectedToken(ctx, tok, opts) => {
				write!(f, "unexpected {} {}", tok, ctx)?;
				match opts {
					Some(opts) if opts.len() > 0 => write_alternatives(f, opts),
					_ => Ok(()),
				}
			}
			WFError::DuplicateAttribute(name) => write!(f, "duplicate attribute {}", name),
			WFError::ElementMismatch { open, end } => write!(
				f,
				"start and end tag do not match (open: {}, end: {})",
				open, end
			),
		}
	}
}

impl From<ValidationError> for WFError {
	fn from(other: ValidationError) -> Self {
		match other {
			ValidationError::EmptyName => Self::InvalidSyntax("Name must have at least one Char"),
			ValidationError::InvalidChar(ch) => Self::UnexpectedChar(ERRCTX_UNKNOWN, ch, None),
		}
	}
}

/// Violation of a namespace-well-formedness constraint or the Namespaces for
/// XML 1.0 grammar.
///
/// All variants carry the raw name (as it appeared in the document) of the
/// offending element or attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum NWFError {
	/// More than one colon encountered in a name.
	MultiColonName(&'static str, SmartString),

	/// One side of the colon in a name was empty.
	EmptyNamePart(&'static str, SmartString),

	/// Use of an undeclared namespace prefix.
	UndeclaredNamespacePrefix(&'static str, SmartString),

	/// Part of a name after the colon does not conform to the NCName
	/// production (e.g. it starts with a digit).
	InvalidLocalName(&'static str, SmartString),

	/// Attempt to declare the `xmlns` prefix or to bind the `xml` prefix to
	/// a namespace name other than [`XMLNS_XML`](crate::XMLNS_XML).
	ReservedNamespacePrefix(SmartString),

	/// Attempt to bind [`XMLNS_XML`](crate::XMLNS_XML) to a prefix other than
	/// `xml`, or to bind [`XMLNS_XMLNS`](crate::XMLNS_XMLNS) at all.
	ReservedNamespaceName(SmartString),

	/// Declared namespace URI for a prefix is empty
	EmptyNamespaceUri(SmartString),
}

impl error::Error for NWFError {}

impl ErrorWithContext for NWFError {
	fn with_context(self, ctx: &'static str) -> NWFError {
		match self {
			Self::MultiColonName(_, name) => Self::MultiColonName(ctx, name),
			Self::EmptyNamePart(_, name) => Self::EmptyNamePart(ctx, name),
			Self::UndeclaredNamespacePrefix(_, name) => Self::UndeclaredNamespacePrefix(ctx, name),
			Self::InvalidLocalName(_, name) => Self::InvalidLocalName(ctx, name),
			other => other,
		}
	}
}

impl fmt::Display for NWFError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::MultiColonName(ctx, name) => {
				write!(f, "more than one colon {} name {}", ctx, name)
			}
			Self::EmptyNamePart(ctx, name) => {
				write!(f, "empty string on one side of the colon {} name {}", ctx, name)
			}
			Self::UndeclaredNamespacePrefix(ctx, name) => {
				write!(f, "use of undeclared namespace prefix {} name {}", ctx, name)
			}
			Self::InvalidLocalName(ctx, name) => {
				write!(f, "local part is invalid {} name {}", ctx, name)
			}
			Self::ReservedNamespacePrefix(name) => {
				write!(f, "reserved namespace prefix in declaration {}", name)
			}
			Self::ReservedNamespaceName(name) => {
				write!(f, "reserved namespace name in declaration {}", name)
			}
			Self::EmptyNamespaceUri(name) => write!(f, "namespace URI is empty in declaration {}", name),
		}
	}
}

/// [`std::sync::Arc`]-based around [`std::io::Error`] to allow cloning.
#[derive(Clone)]
pub struct IOErrorWrapper(Arc<io::Error>);

impl IOErrorWrapper {
	fn wrap(e: io::Error) -> IOErrorWrapper {
		IOErrorWrapper(Arc::new(e))
	}
}

impl fmt::Debug for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(&**self, f)
	}
}

impl fmt::Display for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(&**self, f)
	}
}

impl PartialEq for IOErrorWrapper {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl Deref for IOErrorWrapper {
	type Target = io::Error;

	fn deref(&self) -> &io::Error {
		&*self.0
	}
}

/// Error types which may be returned from the parser, the lexer or the
/// drivers.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
	/// An I/O error was encountered while reading from a driver's source.
	///
	/// I/O errors are not fatal and may be retried.
	IO(IOErrorWrapper),

	/// An invalid UTF-8 byte was encountered during decoding.
	InvalidUtf8Byte(u8),

	/// A violation of the XML 1.0 grammar or a well-formedness constraint was
	/// encountered.
	NotWellFormed(WFError),

	/// A violation of the Namespaces in XML 1.0 grammar or a
	/// namespace-well-formedness constraint was encountered.
	NotNamespaceWellFormed(NWFError),

	/// A forbidden construct was encountered or a configured limit was
	/// exceeded.
	///
	/// The string indicates the context and should not be interpreted by user
	/// code.
	RestrictedXml(&'static str),

	/// Memory for a qualified name could not be allocated.
	OutOfMemory,

	/// The requested operation is not allowed in the current parsing status.
	///
	/// This error does not change the state of the parser.
	InvalidOperation(&'static str),

	/// A handler requested to abort parsing.
	Aborted,
}

pub type Result<T> = StdResult<T, Error>;

pub(crate) trait ErrorWithContext {
	fn with_context(self, ctx: &'static str) -> Self;
}

/// Attach an error context to the error of a result, if any.
pub(crate) fn add_context<T>(r: Result<T>, ctx: &'static str) -> Result<T> {
	r.map_err(|e| e.with_context(ctx))
}

impl Error {
	pub fn io(e: io::Error) -> Error {
		Error::IO(IOErrorWrapper::wrap(e))
	}

	pub(crate) fn wfeof(ctx: &'static str) -> Error {
		Error::NotWellFormed(WFError::InvalidEof(ctx))
	}

	/// Return true if the error poisons the parser which returned it.
	///
	/// This is the case for all errors except [`Error::IO`] and
	/// [`Error::InvalidOperation`].
	pub fn is_fatal(&self) -> bool {
		!matches!(self, Error::IO(_) | Error::InvalidOperation(_))
	}
}

impl ErrorWithContext for Error {
	fn with_context(self, ctx: &'static str) -> Self {
		match self {
			Self::NotWellFormed(wf) => Self::NotWellFormed(wf.with_context(ctx)),
			Self::NotNamespaceWellFormed(nwf) => {
				Self::NotNamespaceWellFormed(nwf.with_context(ctx))
			}
			other => other,
		}
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Error {
		Error::io(e)
	}
}

impl From<WFError> for Error {
	fn from(e: WFError) -> Error {
		Error::NotWellFormed(e)
	}
}

impl From<NWFError> for Error {
	fn from(e: NWFError) -> Error {
		Error::NotNamespaceWellFormed(e)
	}
}

impl From<ValidationError> for Error {
	fn from(e: ValidationError) -> Error {
		Error::NotWellFormed(e.into())
	}
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::NotWellFormed(e) => write!(f, "not-well-formed: {}", e),
			Error::NotNamespaceWellFormed(e) => write!(f, "not namespace-well-formed: {}", e),
			Error::RestrictedXml(msg) => write!(f, "restricted xml: {}", msg),
			Error::InvalidUtf8Byte(b) => write!(f, "invalid utf-8 byte: \\x{:02x}", b),
			Error::OutOfMemory => f.write_str("out of memory"),
			Error::InvalidOperation(msg) => write!(f, "invalid operation: {}", msg),
			Error::Aborted => f.write_str("parsing aborted by handler"),
			Error::IO(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl error::Error for Error {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match self {
			Error::IO(e) => Some(&**e),
			Error::NotWellFormed(e) => Some(e),
			Error::NotNamespaceWellFormed(e) => Some(e),
			Error::RestrictedXml(_)
			| Error::InvalidUtf8Byte(_)
			| Error::OutOfMemory
			| Error::InvalidOperation(_)
			| Error::Aborted => None,
		}
	}
}
