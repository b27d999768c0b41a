/*!
# Qualified name resolution

Turns raw `prefix:local` names into rendered qualified names, using the
[`ScopeStack`] for prefix lookup and a [`NameBufferPool`] slot as storage.
*/
use std::fmt;
use std::ops::Range;

use log::trace;

use crate::errctx::{ERRCTX_ATTNAME, ERRCTX_NAME};
use crate::error::{add_context, Error, NWFError, Result};
use crate::strings::Name;

use super::pool::{NameBufferPool, SlotId};
use super::scope::ScopeStack;

/// Whether a name belongs to an element or to an attribute.
///
/// Unprefixed attribute names are never in a namespace, while unprefixed
/// element names are in the default namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
	Element,
	Attribute,
}

impl NameKind {
	fn errctx(self) -> &'static str {
		match self {
			NameKind::Element => ERRCTX_NAME,
			NameKind::Attribute => ERRCTX_ATTNAME,
		}
	}
}

/// A rendered qualified name stored in a pool slot.
///
/// The ranges index into the slot contents.
#[derive(Debug)]
pub struct ResolvedName {
	slot: SlotId,
	uri: Option<Range<usize>>,
	local: Range<usize>,
	prefix: Option<Range<usize>>,
}

impl ResolvedName {
	/// Borrow a view of the name from the pool which owns its slot.
	pub fn view<'a>(&self, pool: &'a NameBufferPool) -> QualifiedName<'a> {
		let rendered = pool.get(&self.slot);
		QualifiedName {
			rendered,
			uri: self.uri.clone().map(|r| &rendered[r]),
			local: &rendered[self.local.clone()],
			prefix: self.prefix.clone().map(|r| &rendered[r]),
		}
	}

	/// Give the slot back to the pool.
	pub fn release(self, pool: &mut NameBufferPool) {
		pool.release(self.slot);
	}
}

/**
# Resolved element or attribute name

The name is rendered with the configured namespace separator as
`uri<sep>local`, as `uri<sep>local<sep>prefix` in triplet mode if the raw
name carried a prefix, or as the bare `local` name if it is not in a
namespace.

```
use nsxml::{Handler, Flow, QualifiedName, Attribute, Parser};

#[derive(Default)]
struct Names(Vec<String>);

impl Handler for Names {
	fn start_element(&mut self, name: QualifiedName<'_>, _: &[Attribute<'_>]) -> Flow {
		assert_eq!(name.uri(), Some("urn:example"));
		assert_eq!(name.local(), "e");
		self.0.push(name.to_string());
		Flow::Continue
	}
}

let mut p = Parser::new(Names::default());
p.parse_str("<e xmlns='urn:example'/>").unwrap();
assert_eq!(p.get_handler().0, vec!["urn:example e".to_string()]);
```
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QualifiedName<'a> {
	rendered: &'a str,
	uri: Option<&'a str>,
	local: &'a str,
	prefix: Option<&'a str>,
}

impl<'a> QualifiedName<'a> {
	/// The rendered name.
	pub fn as_str(&self) -> &'a str {
		self.rendered
	}

	/// The namespace URI, if any.
	pub fn uri(&self) -> Option<&'a str> {
		self.uri
	}

	/// The local name.
	pub fn local(&self) -> &'a str {
		self.local
	}

	/// The prefix of the raw name.
	///
	/// This is only available for names rendered in triplet mode.
	pub fn prefix(&self) -> Option<&'a str> {
		self.prefix
	}
}

impl fmt::Display for QualifiedName<'_> {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.rendered)
	}
}

impl PartialEq<str> for QualifiedName<'_> {
	fn eq(&self, other: &str) -> bool {
		self.rendered == other
	}
}

impl PartialEq<&str> for QualifiedName<'_> {
	fn eq(&self, other: &&str) -> bool {
		self.rendered == *other
	}
}

/// Rendering options for [`resolve_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rendering {
	/// Append the prefix to names which have both a prefix and a URI.
	pub triplet: bool,
	/// Separator between the parts of a rendered name.
	pub separator: char,
	/// Longest rendered name accepted, in bytes.
	pub max_len: usize,
}

fn resolve_inner(
	pool: &mut NameBufferPool,
	scope: &ScopeStack,
	raw: &Name,
	kind: NameKind,
	rendering: Rendering,
) -> Result<ResolvedName> {
	let (prefix, local) = raw.split_name()?;
	if prefix.as_ref().map(|x| x.as_str()) == Some("xmlns") {
		// Namespaces in XML 1.0
		// Namespace constraint: Reserved Prefixes and Namespace Names
		return Err(NWFError::ReservedNamespacePrefix(raw.as_str().into()).into());
	}
	let uri = match (prefix.as_ref(), kind) {
		(None, NameKind::Attribute) => None,
		(None, NameKind::Element) => scope.resolve(None),
		(Some(prefix), _) => match scope.resolve(Some(prefix.as_str())) {
			Some(uri) => Some(uri),
			// Namespaces in XML 1.0
			// Namespace constraint: Prefix Declared
			None => {
				return Err(NWFError::UndeclaredNamespacePrefix(
					kind.errctx(),
					raw.as_str().into(),
				)
				.into())
			}
		},
	};
	let uri = uri.map(|x| x.as_str());
	let show_prefix = rendering.triplet && uri.is_some() && prefix.is_some();

	let sep_len = rendering.separator.len_utf8();
	let mut len = local.len();
	if let Some(uri) = uri {
		len += uri.len() + sep_len;
	}
	if show_prefix {
		len += sep_len + prefix.as_ref().map(|x| x.len()).unwrap_or(0);
	}
	if len > rendering.max_len {
		return Err(Error::RestrictedXml("qualified name too long"));
	}

	let slot = pool.allocate(len)?;
	let buf = pool.buf_mut(&slot);
	let uri_range = uri.map(|uri| {
		buf.push_str(uri);
		buf.push(rendering.separator);
		0..uri.len()
	});
	let local_start = buf.len();
	buf.push_str(&local);
	let local_range = local_start..buf.len();
	let prefix_range = match prefix.as_ref() {
		Some(prefix) if show_prefix => {
			buf.push(rendering.separator);
			let start = buf.len();
			buf.push_str(prefix);
			Some(start..buf.len())
		}
		_ => None,
	};
	trace!("resolved {} to {:?}", raw, buf);
	Ok(ResolvedName {
		slot,
		uri: uri_range,
		local: local_range,
		prefix: prefix_range,
	})
}

/// Resolve a raw element or attribute name against the scope stack.
///
/// The rendering is written into a fresh slot of `pool`. Fails with a
/// namespace-well-formedness error if the name is malformed or its prefix is
/// not bound, with [`Error::RestrictedXml`] if the rendering would exceed
/// the configured length and with [`Error::OutOfMemory`] if no slot can be
/// allocated.
pub fn resolve_name(
	pool: &mut NameBufferPool,
	scope: &ScopeStack,
	raw: &Name,
	kind: NameKind,
	rendering: Rendering,
) -> Result<ResolvedName> {
	add_context(resolve_inner(pool, scope, raw, kind, rendering), kind.errctx())
}
