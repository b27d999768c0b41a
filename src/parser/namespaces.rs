use log::{debug, trace};

use crate::context;
use crate::errctx;
use crate::error::{add_context, Result, WFError};
use crate::strings::*;

use super::common::{Attribute, Flow, Handler, RcPtr};
use super::pool::NameBufferPool;
use super::qname::{resolve_name, NameKind, Rendering, ResolvedName};
use super::scope::{nsdecl_prefix, ScopeStack};

struct OpenElement {
	raw: Name,
	name: ResolvedName,
	/// Triplet setting at the start tag; the end tag is rendered the same.
	triplet: bool,
}

/**
# Namespace/Attribute resolver

This struct sits between the tokenizer and the [`Handler`]. For each start
tag it opens a namespace scope, registers the `xmlns` declarations of the
tag, resolves the element and attribute names and notifies the handler. For
each end tag it replays the name resolved at the start tag and closes the
scope again.

Resolved names are kept in a [`NameBufferPool`]; the name of an open
element stays valid and unchanged until its end tag has been dispatched.

## Caveat

This struct does *not* validate that the sequence of tokens it is fed is a
well-formed XML document. For instance, it will happily forward text before
the first start tag. Document-level checks are done by
[`Parser`](crate::Parser).
*/
pub struct NamespaceResolver {
	ctx: RcPtr<context::Context>,
	scope: ScopeStack,
	pool: NameBufferPool,
	open: Vec<OpenElement>,
	triplet: bool,
	separator: char,
	max_name_length: usize,
}

impl NamespaceResolver {
	/// Create a new namespace resolver with its own (unshared)
	/// [`context::Context`].
	pub fn new() -> Self {
		Self::with_context(RcPtr::new(context::Context::new()))
	}

	/// Create a new namespace resolver with the given [`context::Context`].
	pub fn with_context(ctx: RcPtr<context::Context>) -> Self {
		Self {
			ctx,
			scope: ScopeStack::new(),
			pool: NameBufferPool::new(),
			open: Vec::new(),
			triplet: false,
			separator: ' ',
			max_name_length: 8192,
		}
	}

	/// Render names of elements opened from now on in triplet form.
	///
	/// Elements which are already open keep the form they were opened with.
	pub fn set_triplet(&mut self, triplet: bool) {
		self.triplet = triplet;
	}

	pub fn triplet(&self) -> bool {
		self.triplet
	}

	/// Set the separator between namespace URI, local name and prefix.
	pub fn set_separator(&mut self, separator: char) {
		self.separator = separator;
	}

	/// Set the length limit for rendered names, in bytes.
	pub fn set_max_name_length(&mut self, max: usize) {
		self.max_name_length = max;
	}

	fn rendering(&self) -> Rendering {
		Rendering {
			triplet: self.triplet,
			separator: self.separator,
			max_len: self.max_name_length,
		}
	}

	fn resolve(&mut self, raw: &Name, kind: NameKind) -> Result<ResolvedName> {
		let rendering = self.rendering();
		resolve_name(&mut self.pool, &self.scope, raw, kind, rendering)
	}

	fn release_all(&mut self, name: ResolvedName, attributes: Vec<(ResolvedName, CData)>) {
		for (attr, _) in attributes {
			attr.release(&mut self.pool);
		}
		name.release(&mut self.pool);
	}

	fn is_duplicate(&self, name: &ResolvedName, others: &[(ResolvedName, CData)]) -> bool {
		let view = name.view(&self.pool);
		others.iter().any(|(other, _)| {
			let other = other.view(&self.pool);
			other.uri() == view.uri() && other.local() == view.local()
		})
	}

	fn declare(&mut self, prefix: Option<NCName>, value: CData, raw: &Name) -> Result<()> {
		let uri = self.ctx.intern_cdata(value);
		add_context(self.scope.declare(prefix, uri, raw), errctx::ERRCTX_NSDECL)
	}

	/// Everything of a start tag which can fail, in a freshly pushed frame.
	fn resolve_start(
		&mut self,
		raw: &Name,
		attributes: Vec<(Name, CData)>,
	) -> Result<(ResolvedName, Vec<(ResolvedName, CData)>)> {
		// all declarations first, so that they are visible to every name of
		// the tag
		let mut others = Vec::with_capacity(attributes.len());
		for (attr, value) in attributes {
			match add_context(nsdecl_prefix(&attr), errctx::ERRCTX_NSDECL)? {
				Some(prefix) => self.declare(prefix, value, &attr)?,
				None => others.push((attr, value)),
			}
		}

		let name = self.resolve(raw, NameKind::Element)?;
		let mut resolved = Vec::with_capacity(others.len());
		for (attr, value) in others {
			let attr_name = match self.resolve(&attr, NameKind::Attribute) {
				Ok(v) => v,
				Err(e) => {
					self.release_all(name, resolved);
					return Err(e);
				}
			};
			if self.is_duplicate(&attr_name, &resolved) {
				// XML 1.0
				// Well-formedness constraint: Unique Att Spec
				// Namespaces in XML 1.0
				// Namespace constraint: Attributes Unique
				attr_name.release(&mut self.pool);
				self.release_all(name, resolved);
				return Err(WFError::DuplicateAttribute(attr.into_inner()).into());
			}
			resolved.push((attr_name, value));
		}
		Ok((name, resolved))
	}

	/// Process a start tag.
	///
	/// If the tag violates a namespace constraint, the error is returned and
	/// the handler is not called at all.
	pub fn start_element<H: Handler + ?Sized>(
		&mut self,
		raw: Name,
		attributes: Vec<(Name, CData)>,
		handler: &mut H,
	) -> Result<Flow> {
		self.scope.push_frame();
		let (name, resolved) = match self.resolve_start(&raw, attributes) {
			Ok(v) => v,
			Err(e) => {
				self.scope.pop_frame();
				debug!("start tag {} rejected: {}", raw, e);
				return Err(e);
			}
		};
		trace!(
			"start element {} with {} attributes at depth {}",
			raw,
			resolved.len(),
			self.open.len()
		);

		let mut flow = Flow::Continue;
		for binding in self.scope.top().bindings() {
			flow = flow.combine(handler.start_namespace_decl(binding.prefix(), binding.uri()));
		}
		{
			let attrs: Vec<Attribute<'_>> = resolved
				.iter()
				.map(|(name, value)| Attribute {
					name: name.view(&self.pool),
					value: value.as_str(),
				})
				.collect();
			flow = flow.combine(handler.start_element(name.view(&self.pool), &attrs[..]));
		}
		for (attr, _) in resolved {
			attr.release(&mut self.pool);
		}

		self.open.push(OpenElement {
			raw,
			name,
			triplet: self.triplet,
		});
		Ok(flow)
	}

	/// Process an end tag.
	///
	/// The name reported to the handler is the one resolved at the matching
	/// start tag.
	pub fn end_element<H: Handler + ?Sized>(&mut self, raw: &Name, handler: &mut H) -> Result<Flow> {
		let OpenElement {
			raw: open_raw,
			name,
			triplet,
		} = match self.open.pop() {
			Some(v) => v,
			None => {
				return Err(WFError::UnexpectedToken(
					errctx::ERRCTX_ELEMENT_FOOT,
					"end tag",
					None,
				)
				.into())
			}
		};
		if open_raw != *raw {
			// XML 1.0
			// Well-formedness constraint: Element Type Match
			self.scope.pop_frame();
			name.release(&mut self.pool);
			return Err(WFError::ElementMismatch {
				open: open_raw.into_inner(),
				end: raw.as_str().into(),
			}
			.into());
		}
		trace!("end element {} at depth {}", raw, self.open.len());

		let view = name.view(&self.pool);
		debug_assert_eq!(
			view.prefix().is_some(),
			triplet && view.uri().is_some() && open_raw.contains(':')
		);
		let mut flow = handler.end_element(view);
		for binding in self.scope.top().bindings().iter().rev() {
			flow = flow.combine(handler.end_namespace_decl(binding.prefix()));
		}
		self.scope.pop_frame();
		name.release(&mut self.pool);
		Ok(flow)
	}

	/// Forward character data.
	pub fn text<H: Handler + ?Sized>(&mut self, text: &CData, handler: &mut H) -> Flow {
		handler.text(text.as_str())
	}

	/// Number of open elements.
	pub fn depth(&self) -> usize {
		self.open.len()
	}

	/// Drop all open elements and their scopes.
	///
	/// The triplet setting is kept.
	pub fn reset(&mut self) {
		for open in self.open.drain(..) {
			open.name.release(&mut self.pool);
		}
		self.scope.clear();
		self.pool.reset();
	}

	/// Release all temporary buffers
	pub fn release_temporaries(&mut self) {
		self.pool.release_temporaries();
		self.ctx.release_temporaries();
	}

	/// Number of name buffers handed out to open elements.
	pub fn live_names(&self) -> usize {
		self.pool.live()
	}

	/// Access the inner context
	pub fn context(&self) -> &RcPtr<context::Context> {
		&self.ctx
	}
}

impl Default for NamespaceResolver {
	fn default() -> Self {
		Self::new()
	}
}
