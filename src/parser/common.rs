#[cfg(not(feature = "mt"))]
use std::rc::Rc;
#[cfg(feature = "mt")]
use std::sync::Arc;

use crate::strings::CData;

use super::qname::QualifiedName;

/// Wrapper pointer around namespace URIs
///
/// In builds with the `mt` feature, this is a [`Arc`]. In non-`mt` builds,
/// this is a [`std::rc::Rc`]
#[cfg(feature = "mt")]
pub type RcPtr<T> = Arc<T>;
/// Wrapper pointer around namespace URIs
///
/// In builds with the `mt` feature, this is a [`std::sync::Arc`].
/// In non-`mt` builds, this is a [`Rc`].
#[cfg(not(feature = "mt"))]
pub type RcPtr<T> = Rc<T>;

/// Shared namespace URI
pub type NamespaceName = RcPtr<CData>;

/// XML core namespace URI (for the `xml:` prefix)
pub const XMLNS_XML: &'static str = "http://www.w3.org/XML/1998/namespace";
/// XML namespace URI (for the `xmlns:` prefix)
pub const XMLNS_XMLNS: &'static str = "http://www.w3.org/2000/xmlns/";

/**
# Status of a parser instance

The transitions are:

* `Uninitialized` → `Initialized` on construction and at the end of
  [`Parser::reset`](crate::Parser::reset),
* `Initialized` → `Parsing` on the first call to
  [`Parser::feed`](crate::Parser::feed),
* `Parsing` ↔ `Suspended` when a [`Handler`] returns [`Flow::Suspend`] and
  on [`Parser::resume`](crate::Parser::resume),
* `Parsing` → `Finished` once the final chunk has been processed,
* any → `Error` on a fatal error.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParsingStatus {
	/// The parser is being set up; never observed from the outside.
	Uninitialized,
	/// The parser has been set up (or reset) and has not seen any input.
	Initialized,
	/// The parser is consuming input.
	Parsing,
	/// The final chunk has been processed and the document was complete.
	Finished,
	/// A handler requested suspension; call
	/// [`Parser::resume`](crate::Parser::resume) to continue.
	Suspended,
	/// A fatal error occured; the parser returns it until it is reset.
	Error,
}

/// Instruction from a [`Handler`] to the parser on how to proceed.
///
/// The parser always finishes dispatching the token which triggered the
/// notification before it acts on the flow. If several notifications of one
/// token disagree, `Abort` wins over `Suspend` and `Suspend` wins over
/// `Continue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
	/// Keep parsing.
	Continue,
	/// Stop after the current token; the parser enters
	/// [`ParsingStatus::Suspended`].
	Suspend,
	/// Stop after the current token with [`Error::Aborted`](crate::Error::Aborted).
	Abort,
}

impl Flow {
	/// Combine the flows of two notifications of the same token.
	pub fn combine(self, other: Flow) -> Flow {
		match (self, other) {
			(Flow::Abort, _) | (_, Flow::Abort) => Flow::Abort,
			(Flow::Suspend, _) | (_, Flow::Suspend) => Flow::Suspend,
			_ => Flow::Continue,
		}
	}
}

impl Default for Flow {
	fn default() -> Self {
		Flow::Continue
	}
}

/// Attribute of an element as passed to [`Handler::start_element`].
///
/// Namespace declarations are not reported as attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
	/// Resolved name of the attribute.
	pub name: QualifiedName<'a>,
	/// Normalized value with references expanded.
	pub value: &'a str,
}

/**
# Receiver of parser notifications

All methods have default implementations which ignore the notification and
return [`Flow::Continue`], so that implementors only need to override what
they are interested in.

For each element, notifications are strictly ordered:
`start_namespace_decl`* → `start_element` → children → `end_element` →
`end_namespace_decl`*.

The name views passed to the handler borrow parser-owned buffers and are
only valid for the duration of the call; use
[`QualifiedName::as_str`] and [`ToOwned`] to keep a copy.
*/
pub trait Handler {
	/// An element has been opened.
	///
	/// `attributes` holds the attributes of the element in document order,
	/// without namespace declarations.
	fn start_element(&mut self, name: QualifiedName<'_>, attributes: &[Attribute<'_>]) -> Flow {
		let _ = (name, attributes);
		Flow::Continue
	}

	/// An element has been closed.
	///
	/// The name is byte-identical to the one passed to the matching
	/// [`Handler::start_element`].
	fn end_element(&mut self, name: QualifiedName<'_>) -> Flow {
		let _ = name;
		Flow::Continue
	}

	/// A namespace binding comes into scope.
	///
	/// `prefix` is `None` for the default namespace. `uri` is `None` if the
	/// default namespace is undeclared (`xmlns=''`).
	fn start_namespace_decl(&mut self, prefix: Option<&str>, uri: Option<&str>) -> Flow {
		let _ = (prefix, uri);
		Flow::Continue
	}

	/// A namespace binding goes out of scope.
	fn end_namespace_decl(&mut self, prefix: Option<&str>) -> Flow {
		let _ = prefix;
		Flow::Continue
	}

	/// Character data.
	///
	/// Text may be split over several notifications.
	fn text(&mut self, text: &str) -> Flow {
		let _ = text;
		Flow::Continue
	}
}

/// Handler which ignores everything.
impl Handler for () {}

impl<H: Handler + ?Sized> Handler for &mut H {
	fn start_element(&mut self, name: QualifiedName<'_>, attributes: &[Attribute<'_>]) -> Flow {
		(**self).start_element(name, attributes)
	}

	fn end_element(&mut self, name: QualifiedName<'_>) -> Flow {
		(**self).end_element(name)
	}

	fn start_namespace_decl(&mut self, prefix: Option<&str>, uri: Option<&str>) -> Flow {
		(**self).start_namespace_decl(prefix, uri)
	}

	fn end_namespace_decl(&mut self, prefix: Option<&str>) -> Flow {
		(**self).end_namespace_decl(prefix)
	}

	fn text(&mut self, text: &str) -> Flow {
		(**self).text(text)
	}
}
