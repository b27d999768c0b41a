/*!
# Namespace scope stack

One [`ScopeFrame`] per open element holds the namespace bindings declared on
that element. The outermost frame carries the built-in `xml` and `xmlns`
bindings and is never popped.
*/
use log::trace;

use crate::error::{NWFError, Result, WFError};
use crate::strings::{CData, NCName, Name};

use super::common::{NamespaceName, RcPtr, XMLNS_XML, XMLNS_XMLNS};

/// A prefix (or the default namespace) bound to a namespace URI.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceBinding {
	prefix: Option<NCName>,
	uri: NamespaceName,
}

impl NamespaceBinding {
	/// The bound prefix; `None` for the default namespace.
	pub fn prefix(&self) -> Option<&str> {
		self.prefix.as_ref().map(|x| x.as_str())
	}

	/// The bound URI; `None` if the default namespace is undeclared.
	pub fn uri(&self) -> Option<&str> {
		if self.uri.is_empty() {
			None
		} else {
			Some(self.uri.as_str())
		}
	}

	fn namespace_name(&self) -> Option<&NamespaceName> {
		if self.uri.is_empty() {
			None
		} else {
			Some(&self.uri)
		}
	}
}

/// Bindings introduced by a single element, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeFrame {
	bindings: Vec<NamespaceBinding>,
}

impl ScopeFrame {
	pub fn bindings(&self) -> &[NamespaceBinding] {
		&self.bindings[..]
	}

	pub fn is_empty(&self) -> bool {
		self.bindings.is_empty()
	}
}

/// Stack of [`ScopeFrame`]s.
#[derive(Debug)]
pub struct ScopeStack {
	frames: Vec<ScopeFrame>,
}

fn builtin(prefix: &str, uri: &str) -> NamespaceBinding {
	NamespaceBinding {
		prefix: Some(NCName::from_validated(prefix)),
		uri: RcPtr::new(CData::from_validated(uri)),
	}
}

impl ScopeStack {
	pub fn new() -> Self {
		Self {
			frames: vec![ScopeFrame {
				bindings: vec![builtin("xml", XMLNS_XML), builtin("xmlns", XMLNS_XMLNS)],
			}],
		}
	}

	/// Open a new, empty frame.
	pub fn push_frame(&mut self) {
		self.frames.push(ScopeFrame::default());
	}

	/// Close the innermost frame and return it.
	///
	/// The built-in frame is never popped; `None` is returned instead.
	pub fn pop_frame(&mut self) -> Option<ScopeFrame> {
		if self.frames.len() <= 1 {
			return None;
		}
		self.frames.pop()
	}

	/// The innermost frame.
	pub fn top(&self) -> &ScopeFrame {
		// the built-in frame is always present
		&self.frames[self.frames.len() - 1]
	}

	/// Number of frames above the built-in one.
	pub fn depth(&self) -> usize {
		self.frames.len() - 1
	}

	/// Drop every frame except the built-in one.
	pub fn clear(&mut self) {
		self.frames.truncate(1);
	}

	/// Add a binding to the innermost frame.
	///
	/// `raw` is the name of the declaring attribute, used in error messages.
	/// An empty `uri` undeclares the default namespace; for prefixes it is an
	/// error.
	pub fn declare(&mut self, prefix: Option<NCName>, uri: NamespaceName, raw: &Name) -> Result<()> {
		let uri_str = uri.as_str();
		match prefix.as_ref().map(|x| x.as_str()) {
			Some("xmlns") => {
				// Namespaces in XML 1.0
				// Namespace constraint: Reserved Prefixes and Namespace Names
				return Err(NWFError::ReservedNamespacePrefix(raw.as_str().into()).into());
			}
			Some("xml") => {
				if uri_str != XMLNS_XML {
					return Err(NWFError::ReservedNamespacePrefix(raw.as_str().into()).into());
				}
			}
			Some(_) if uri_str.is_empty() => {
				// Namespaces in XML 1.0
				// Namespace constraint: No Prefix Undeclaring
				return Err(NWFError::EmptyNamespaceUri(raw.as_str().into()).into());
			}
			_ => {
				if uri_str == XMLNS_XML {
					return Err(NWFError::ReservedNamespaceName(raw.as_str().into()).into());
				}
			}
		}
		if uri_str == XMLNS_XMLNS {
			return Err(NWFError::ReservedNamespaceName(raw.as_str().into()).into());
		}

		// the built-in frame is always present
		let depth = self.frames.len() - 1;
		let top = &mut self.frames[depth];
		if top.bindings.iter().any(|b| b.prefix == prefix) {
			// XML 1.0
			// Well-formedness constraint: Unique Att Spec
			return Err(WFError::DuplicateAttribute(raw.as_str().into()).into());
		}
		trace!(
			"namespace binding {:?} -> {:?} at depth {}",
			prefix.as_ref().map(|x| x.as_str()),
			uri_str,
			depth
		);
		top.bindings.push(NamespaceBinding { prefix, uri });
		Ok(())
	}

	/// Find the URI bound to `prefix` (or to the default namespace).
	///
	/// Returns `None` for unbound prefixes and for an absent or undeclared
	/// default namespace.
	pub fn resolve(&self, prefix: Option<&str>) -> Option<&NamespaceName> {
		for frame in self.frames.iter().rev() {
			for binding in frame.bindings.iter() {
				if binding.prefix.as_ref().map(|x| x.as_str()) == prefix {
					return binding.namespace_name();
				}
			}
		}
		None
	}
}

impl Default for ScopeStack {
	fn default() -> Self {
		Self::new()
	}
}

/// Recognize a namespace declaration attribute.
///
/// Returns `Ok(None)` for ordinary attributes, `Ok(Some(None))` for `xmlns`
/// and `Ok(Some(Some(prefix)))` for `xmlns:prefix`.
pub(crate) fn nsdecl_prefix(raw: &Name) -> Result<Option<Option<NCName>>> {
	if raw.as_str() == "xmlns" {
		return Ok(Some(None));
	}
	if !raw.starts_with("xmlns:") {
		return Ok(None);
	}
	let (_, local) = raw.split_name()?;
	Ok(Some(Some(local)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::convert::TryFrom;

	use crate::error::Error;

	fn uri(s: &str) -> NamespaceName {
		RcPtr::new(CData::try_from(s).unwrap())
	}

	fn ncname(s: &str) -> Option<NCName> {
		Some(NCName::try_from(s).unwrap())
	}

	fn raw(s: &str) -> Name {
		Name::try_from(s).unwrap()
	}

	#[test]
	fn builtin_prefixes_are_bound() {
		let stack = ScopeStack::new();
		assert_eq!(stack.resolve(Some("xml")).unwrap().as_str(), XMLNS_XML);
		assert_eq!(stack.resolve(Some("xmlns")).unwrap().as_str(), XMLNS_XMLNS);
		assert!(stack.resolve(None).is_none());
		assert_eq!(stack.depth(), 0);
	}

	#[test]
	fn builtin_frame_is_never_popped() {
		let mut stack = ScopeStack::new();
		assert!(stack.pop_frame().is_none());
		assert!(stack.resolve(Some("xml")).is_some());
	}

	#[test]
	fn inner_declaration_shadows_outer_until_popped() {
		let mut stack = ScopeStack::new();
		stack.push_frame();
		stack.declare(ncname("a"), uri("urn:outer"), &raw("xmlns:a")).unwrap();
		stack.push_frame();
		stack.declare(ncname("a"), uri("urn:inner"), &raw("xmlns:a")).unwrap();
		assert_eq!(stack.resolve(Some("a")).unwrap().as_str(), "urn:inner");
		let frame = stack.pop_frame().unwrap();
		assert_eq!(frame.bindings().len(), 1);
		assert_eq!(frame.bindings()[0].uri(), Some("urn:inner"));
		assert_eq!(stack.resolve(Some("a")).unwrap().as_str(), "urn:outer");
		stack.pop_frame().unwrap();
		assert!(stack.resolve(Some("a")).is_none());
	}

	#[test]
	fn empty_default_declaration_undeclares() {
		let mut stack = ScopeStack::new();
		stack.push_frame();
		stack.declare(None, uri("urn:x"), &raw("xmlns")).unwrap();
		stack.push_frame();
		stack.declare(None, uri(""), &raw("xmlns")).unwrap();
		assert!(stack.resolve(None).is_none());
		assert_eq!(stack.top().bindings()[0].uri(), None);
		stack.pop_frame();
		assert_eq!(stack.resolve(None).unwrap().as_str(), "urn:x");
	}

	#[test]
	fn declare_rejects_reserved_prefixes_and_names() {
		let mut stack = ScopeStack::new();
		stack.push_frame();
		match stack.declare(ncname("xmlns"), uri("urn:x"), &raw("xmlns:xmlns")) {
			Err(Error::NotNamespaceWellFormed(NWFError::ReservedNamespacePrefix(_))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		match stack.declare(ncname("xml"), uri("urn:x"), &raw("xmlns:xml")) {
			Err(Error::NotNamespaceWellFormed(NWFError::ReservedNamespacePrefix(_))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		match stack.declare(ncname("foo"), uri(XMLNS_XML), &raw("xmlns:foo")) {
			Err(Error::NotNamespaceWellFormed(NWFError::ReservedNamespaceName(_))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		match stack.declare(None, uri(XMLNS_XML), &raw("xmlns")) {
			Err(Error::NotNamespaceWellFormed(NWFError::ReservedNamespaceName(_))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		match stack.declare(ncname("foo"), uri(XMLNS_XMLNS), &raw("xmlns:foo")) {
			Err(Error::NotNamespaceWellFormed(NWFError::ReservedNamespaceName(_))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		assert!(stack.top().is_empty());
	}

	#[test]
	fn declare_accepts_xml_prefix_with_its_own_uri() {
		let mut stack = ScopeStack::new();
		stack.push_frame();
		stack.declare(ncname("xml"), uri(XMLNS_XML), &raw("xmlns:xml")).unwrap();
		assert_eq!(stack.top().bindings().len(), 1);
	}

	#[test]
	fn declare_rejects_empty_prefixed_uri() {
		let mut stack = ScopeStack::new();
		stack.push_frame();
		match stack.declare(ncname("p"), uri(""), &raw("xmlns:p")) {
			Err(Error::NotNamespaceWellFormed(NWFError::EmptyNamespaceUri(name))) => {
				assert_eq!(name.as_str(), "xmlns:p")
			}
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn declare_rejects_duplicates_on_one_frame() {
		let mut stack = ScopeStack::new();
		stack.push_frame();
		stack.declare(ncname("p"), uri("urn:a"), &raw("xmlns:p")).unwrap();
		match stack.declare(ncname("p"), uri("urn:b"), &raw("xmlns:p")) {
			Err(Error::NotWellFormed(WFError::DuplicateAttribute(name))) => {
				assert_eq!(name.as_str(), "xmlns:p")
			}
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn clear_keeps_builtin_frame() {
		let mut stack = ScopeStack::new();
		stack.push_frame();
		stack.declare(ncname("a"), uri("urn:a"), &raw("xmlns:a")).unwrap();
		stack.push_frame();
		stack.clear();
		assert_eq!(stack.depth(), 0);
		assert!(stack.resolve(Some("a")).is_none());
		assert!(stack.resolve(Some("xml")).is_some());
	}

	#[test]
	fn nsdecl_prefix_recognizes_declarations() {
		assert_eq!(nsdecl_prefix(&raw("xmlns")).unwrap(), Some(None));
		assert_eq!(nsdecl_prefix(&raw("xmlns:foo")).unwrap(), Some(ncname("foo")));
		assert_eq!(nsdecl_prefix(&raw("xmlnsfoo")).unwrap(), None);
		assert_eq!(nsdecl_prefix(&raw("foo:xmlns")).unwrap(), None);
		assert!(nsdecl_prefix(&raw("xmlns:a:b")).is_err());
	}
}
