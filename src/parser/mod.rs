/*!
# Namespace-aware XML parser

The [`Parser`] glues the [`Lexer`] to the [`NamespaceResolver`] and keeps
track of the [`ParsingStatus`]. Input is pushed with [`Parser::feed`];
notifications are delivered to the [`Handler`] owned by the parser.

The building blocks are public so that the namespace engine can be driven
with tokens from another source:

* [`NameBufferPool`] holds the rendered names.
* [`ScopeStack`] tracks the namespace bindings of the open elements.
* [`resolve_name`] turns a raw name into a [`QualifiedName`].
* [`NamespaceResolver`] dispatches start and end tags to a [`Handler`].
*/
use log::debug;

use crate::context;
use crate::errctx::*;
use crate::error::{Error, Result, WFError};
use crate::lexer::{Lexer, LexerOptions, Token};

mod common;
mod namespaces;
mod pool;
mod qname;
mod scope;

pub use common::{
	Attribute, Flow, Handler, NamespaceName, ParsingStatus, RcPtr, XMLNS_XML, XMLNS_XMLNS,
};
pub use namespaces::NamespaceResolver;
pub use pool::{NameBufferPool, SlotId};
pub use qname::{resolve_name, NameKind, QualifiedName, Rendering, ResolvedName};
pub use scope::{NamespaceBinding, ScopeFrame, ScopeStack};

/// Configuration of a [`Parser`].
///
/// ```
/// use nsxml::{ParserOptions, LexerOptions};
///
/// let opts = ParserOptions::default()
/// 	.triplet(true)
/// 	.separator('|')
/// 	.lexer(LexerOptions::default().max_token_length(1024));
/// assert_eq!(opts.max_name_length, 8192);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParserOptions {
	/// Render names in triplet form (`uri<sep>local<sep>prefix`).
	pub triplet: bool,
	/// Separator between the parts of a rendered name.
	pub separator: char,
	/// Longest rendered name accepted, in bytes.
	pub max_name_length: usize,
	/// Options of the tokenizer.
	pub lexer: LexerOptions,
}

impl ParserOptions {
	pub fn triplet(mut self, v: bool) -> Self {
		self.triplet = v;
		self
	}

	pub fn separator(mut self, v: char) -> Self {
		self.separator = v;
		self
	}

	pub fn max_name_length(mut self, v: usize) -> Self {
		self.max_name_length = v;
		self
	}

	pub fn lexer(mut self, v: LexerOptions) -> Self {
		self.lexer = v;
		self
	}
}

impl Default for ParserOptions {
	fn default() -> Self {
		Self {
			triplet: false,
			separator: ' ',
			max_name_length: 8192,
			lexer: LexerOptions::defaults(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocState {
	/// Before the root element.
	Prolog,
	/// Inside the root element.
	Root,
	/// After the root element.
	Epilog,
}

/**
# Push-based namespace-aware XML parser

```
use nsxml::{Parser, Handler, Flow, ParsingStatus, QualifiedName, Attribute};

#[derive(Default)]
struct Depth {
	max: usize,
	cur: usize,
}

impl Handler for Depth {
	fn start_element(&mut self, _: QualifiedName<'_>, _: &[Attribute<'_>]) -> Flow {
		self.cur += 1;
		self.max = self.max.max(self.cur);
		Flow::Continue
	}

	fn end_element(&mut self, _: QualifiedName<'_>) -> Flow {
		self.cur -= 1;
		Flow::Continue
	}
}

let mut p = Parser::new(Depth::default());
assert_eq!(p.feed(b"<a><b><c/></b>", false).unwrap(), ParsingStatus::Parsing);
assert_eq!(p.feed(b"</a>", true).unwrap(), ParsingStatus::Finished);
assert_eq!(p.get_handler().max, 3);
```

## Errors

Fatal errors poison the parser: it enters [`ParsingStatus::Error`] and any
further [`Parser::feed`] or [`Parser::resume`] returns the same error until
[`Parser::reset`] is called. Usage errors ([`Error::InvalidOperation`])
leave the parser untouched.
*/
pub struct Parser<H: Handler> {
	opts: ParserOptions,
	status: ParsingStatus,
	lexer: Lexer,
	resolver: NamespaceResolver,
	handler: H,
	doc: DocState,
	final_seen: bool,
	poison: Option<Error>,
}

impl<H: Handler> Parser<H> {
	/// Create a parser with default options.
	pub fn new(handler: H) -> Self {
		Self::with_options(ParserOptions::default(), handler)
	}

	/// Create a parser with the given options and its own (unshared)
	/// [`context::Context`].
	pub fn with_options(opts: ParserOptions, handler: H) -> Self {
		Self::with_context(RcPtr::new(context::Context::new()), opts, handler)
	}

	/// Create a parser which interns namespace URIs in a shared
	/// [`context::Context`].
	pub fn with_context(ctx: RcPtr<context::Context>, opts: ParserOptions, handler: H) -> Self {
		let mut result = Self {
			opts,
			status: ParsingStatus::Uninitialized,
			lexer: Lexer::with_options(opts.lexer),
			resolver: NamespaceResolver::with_context(ctx),
			handler,
			doc: DocState::Prolog,
			final_seen: false,
			poison: None,
		};
		result.configure();
		result
	}

	fn configure(&mut self) {
		self.resolver.set_triplet(self.opts.triplet);
		self.resolver.set_separator(self.opts.separator);
		self.resolver.set_max_name_length(self.opts.max_name_length);
		self.status = ParsingStatus::Initialized;
	}

	fn fail(&mut self, e: Error) -> Result<ParsingStatus> {
		debug!("parser entered error state: {}", e);
		self.status = ParsingStatus::Error;
		self.poison = Some(e.clone());
		Err(e)
	}

	fn check_poison(&self) -> Result<()> {
		if let Some(poison) = self.poison.as_ref() {
			return Err(poison.clone());
		}
		Ok(())
	}

	fn dispatch(&mut self, tok: Token) -> Result<Flow> {
		match tok {
			Token::StartTag {
				name,
				attributes,
				empty,
			} => {
				match self.doc {
					DocState::Prolog => self.doc = DocState::Root,
					DocState::Root => (),
					DocState::Epilog => {
						return Err(WFError::UnexpectedToken(ERRCTX_DOCEND, "start tag", None).into())
					}
				}
				let flow = if empty {
					let flow = self
						.resolver
						.start_element(name.clone(), attributes, &mut self.handler)?;
					flow.combine(self.resolver.end_element(&name, &mut self.handler)?)
				} else {
					self.resolver
						.start_element(name, attributes, &mut self.handler)?
				};
				if self.resolver.depth() == 0 {
					self.doc = DocState::Epilog;
				}
				Ok(flow)
			}
			Token::EndTag(name) => {
				let flow = self.resolver.end_element(&name, &mut self.handler)?;
				if self.resolver.depth() == 0 {
					self.doc = DocState::Epilog;
				}
				Ok(flow)
			}
			Token::Text(text) => {
				if self.resolver.depth() > 0 {
					return Ok(self.resolver.text(&text, &mut self.handler));
				}
				if text.chars().all(nsxml_validation::chars::is_space) {
					return Ok(Flow::Continue);
				}
				let ctx = match self.doc {
					DocState::Epilog => ERRCTX_DOCEND,
					_ => ERRCTX_DOCBEGIN,
				};
				Err(WFError::UnexpectedToken(ctx, "text", None).into())
			}
		}
	}

	fn run(&mut self) -> Result<ParsingStatus> {
		loop {
			let tok = match self.lexer.next_token() {
				Ok(Some(tok)) => tok,
				Ok(None) => break,
				Err(e) => return self.fail(e),
			};
			match self.dispatch(tok) {
				Ok(Flow::Continue) => (),
				Ok(Flow::Suspend) => {
					debug!("parser suspended by handler");
					self.status = ParsingStatus::Suspended;
					return Ok(self.status);
				}
				Ok(Flow::Abort) => return self.fail(Error::Aborted),
				Err(e) => return self.fail(e),
			}
		}
		if self.final_seen {
			if self.resolver.depth() > 0 {
				return self.fail(Error::wfeof(ERRCTX_ELEMENT));
			}
			if self.doc != DocState::Epilog {
				return self.fail(Error::wfeof(ERRCTX_DOCBEGIN));
			}
			debug!("parser finished");
			self.status = ParsingStatus::Finished;
		}
		Ok(self.status)
	}

	/// Feed a chunk of the document.
	///
	/// Pass `is_final` with the last chunk (which may be empty). Returns the
	/// status after processing: [`ParsingStatus::Parsing`] if more data is
	/// expected, [`ParsingStatus::Suspended`] if a handler asked for
	/// suspension and [`ParsingStatus::Finished`] after a complete document.
	///
	/// Feeding a suspended or finished parser is an
	/// [`Error::InvalidOperation`].
	pub fn feed(&mut self, data: &[u8], is_final: bool) -> Result<ParsingStatus> {
		match self.status {
			ParsingStatus::Error => {
				self.check_poison()?;
			}
			ParsingStatus::Finished => {
				return Err(Error::InvalidOperation("parsing has already finished"))
			}
			ParsingStatus::Suspended => {
				return Err(Error::InvalidOperation("parser is suspended"))
			}
			ParsingStatus::Uninitialized | ParsingStatus::Initialized => {
				debug!("parser started");
				self.status = ParsingStatus::Parsing;
			}
			ParsingStatus::Parsing => (),
		}
		self.lexer.push(data);
		if is_final {
			self.lexer.push_eof();
			self.final_seen = true;
		}
		self.run()
	}

	/// Parse a complete document.
	pub fn parse_str(&mut self, doc: &str) -> Result<ParsingStatus> {
		self.feed(doc.as_bytes(), true)
	}

	/// Continue after a handler returned [`Flow::Suspend`].
	///
	/// Processes the input buffered so far and returns the new status.
	pub fn resume(&mut self) -> Result<ParsingStatus> {
		self.check_poison()?;
		if self.status != ParsingStatus::Suspended {
			return Err(Error::InvalidOperation("parser is not suspended"));
		}
		debug!("parser resumed");
		self.status = ParsingStatus::Parsing;
		self.run()
	}

	/// Reset the parser to the state after construction.
	///
	/// Open elements, namespace scopes, buffered input and a pending error
	/// are dropped and the options given at construction (including the
	/// triplet setting) are restored. The handler is kept. Not allowed while
	/// parsing or suspended.
	pub fn reset(&mut self) -> Result<()> {
		match self.status {
			ParsingStatus::Parsing | ParsingStatus::Suspended => {
				return Err(Error::InvalidOperation("cannot reset while parsing"))
			}
			_ => (),
		}
		self.status = ParsingStatus::Uninitialized;
		self.lexer.reset();
		self.resolver.reset();
		self.doc = DocState::Prolog;
		self.final_seen = false;
		self.poison = None;
		self.configure();
		debug!("parser reset");
		Ok(())
	}

	/// Enable or disable triplet rendering for the next document.
	///
	/// Not allowed while parsing or suspended; the previous setting then stays
	/// in effect.
	pub fn set_triplet_mode(&mut self, triplet: bool) -> Result<()> {
		match self.status {
			ParsingStatus::Parsing | ParsingStatus::Suspended => Err(Error::InvalidOperation(
				"cannot change triplet mode while parsing",
			)),
			_ => {
				self.resolver.set_triplet(triplet);
				Ok(())
			}
		}
	}

	/// Return whether names are currently rendered in triplet form.
	pub fn triplet_mode(&self) -> bool {
		self.resolver.triplet()
	}

	pub fn status(&self) -> ParsingStatus {
		self.status
	}

	/// Number of currently open elements.
	pub fn depth(&self) -> usize {
		self.resolver.depth()
	}

	pub fn get_handler(&self) -> &H {
		&self.handler
	}

	pub fn get_handler_mut(&mut self) -> &mut H {
		&mut self.handler
	}

	/// Consume the parser and return the handler.
	pub fn into_handler(self) -> H {
		self.handler
	}

	/// Access the inner namespace resolver
	pub fn get_resolver(&self) -> &NamespaceResolver {
		&self.resolver
	}

	/// Release all temporary buffers
	///
	/// This is sensible to call when it is expected that no more data will be
	/// processed by the parser for a while and the memory is better used
	/// elsewhere.
	pub fn release_temporaries(&mut self) {
		self.lexer.release_temporaries();
		self.resolver.release_temporaries();
	}
}

impl<H: Handler + Default> Default for Parser<H> {
	fn default() -> Self {
		Self::new(H::default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Default)]
	struct Count {
		starts: usize,
		ends: usize,
		suspend_at: Option<usize>,
		abort_at: Option<usize>,
	}

	impl Handler for Count {
		fn start_element(&mut self, _: QualifiedName<'_>, _: &[Attribute<'_>]) -> Flow {
			self.starts += 1;
			if self.abort_at == Some(self.starts) {
				return Flow::Abort;
			}
			if self.suspend_at == Some(self.starts) {
				return Flow::Suspend;
			}
			Flow::Continue
		}

		fn end_element(&mut self, _: QualifiedName<'_>) -> Flow {
			self.ends += 1;
			Flow::Continue
		}
	}

	#[test]
	fn parser_starts_initialized() {
		let p = Parser::new(());
		assert_eq!(p.status(), ParsingStatus::Initialized);
	}

	#[test]
	fn parser_finishes_complete_document() {
		let mut p = Parser::new(Count::default());
		assert_eq!(p.feed(b"<a>", false).unwrap(), ParsingStatus::Parsing);
		assert_eq!(p.feed(b"</a>", false).unwrap(), ParsingStatus::Parsing);
		assert_eq!(p.feed(b"", true).unwrap(), ParsingStatus::Finished);
		assert_eq!(p.get_handler().starts, 1);
		assert_eq!(p.get_handler().ends, 1);
	}

	#[test]
	fn parser_rejects_feed_after_finish() {
		let mut p = Parser::new(());
		p.parse_str("<a/>").unwrap();
		match p.feed(b"", true) {
			Err(Error::InvalidOperation(_)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		assert_eq!(p.status(), ParsingStatus::Finished);
	}

	#[test]
	fn parser_rejects_unclosed_elements_at_eof() {
		let mut p = Parser::new(());
		match p.parse_str("<a><b></b>") {
			Err(Error::NotWellFormed(WFError::InvalidEof(_))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		assert_eq!(p.status(), ParsingStatus::Error);
	}

	#[test]
	fn parser_rejects_missing_root() {
		let mut p = Parser::new(());
		match p.parse_str("<!-- nothing -->  ") {
			Err(Error::NotWellFormed(WFError::InvalidEof(_))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn parser_rejects_second_root_and_text_outside_root() {
		let mut p = Parser::new(());
		match p.parse_str("<a/><b/>") {
			Err(Error::NotWellFormed(WFError::UnexpectedToken(ERRCTX_DOCEND, _, _))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		let mut p = Parser::new(());
		match p.parse_str("x<a/>") {
			Err(Error::NotWellFormed(WFError::UnexpectedToken(ERRCTX_DOCBEGIN, _, _))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		let mut p = Parser::new(());
		assert_eq!(p.parse_str("\n<a/>\n").unwrap(), ParsingStatus::Finished);
	}

	#[test]
	fn parser_returns_error_forever() {
		let mut p = Parser::new(());
		let err = p.feed(b"<a></b>", false).unwrap_err();
		assert_eq!(p.feed(b"</a>", true).unwrap_err(), err);
		assert_eq!(p.resume().unwrap_err(), err);
		assert_eq!(p.status(), ParsingStatus::Error);
	}

	#[test]
	fn parser_suspends_and_resumes() {
		let mut p = Parser::new(Count {
			suspend_at: Some(2),
			..Count::default()
		});
		assert_eq!(p.feed(b"<a><b/><c/></a>", true).unwrap(), ParsingStatus::Suspended);
		// the empty element is dispatched completely
		assert_eq!(p.get_handler().starts, 2);
		assert_eq!(p.get_handler().ends, 1);
		match p.feed(b"", true) {
			Err(Error::InvalidOperation(_)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		assert_eq!(p.resume().unwrap(), ParsingStatus::Finished);
		assert_eq!(p.get_handler().starts, 3);
		assert_eq!(p.get_handler().ends, 3);
	}

	#[test]
	fn parser_resume_requires_suspension() {
		let mut p = Parser::new(());
		match p.resume() {
			Err(Error::InvalidOperation(_)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		assert_eq!(p.status(), ParsingStatus::Initialized);
	}

	#[test]
	fn parser_abort_poisons() {
		let mut p = Parser::new(Count {
			abort_at: Some(1),
			..Count::default()
		});
		match p.parse_str("<a><b/></a>") {
			Err(Error::Aborted) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		assert_eq!(p.status(), ParsingStatus::Error);
		assert_eq!(p.get_handler().starts, 1);
	}

	#[test]
	fn parser_reset_is_rejected_while_parsing() {
		let mut p = Parser::new(());
		p.feed(b"<a>", false).unwrap();
		match p.reset() {
			Err(Error::InvalidOperation(_)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		assert_eq!(p.status(), ParsingStatus::Parsing);
		assert_eq!(p.depth(), 1);
	}

	#[test]
	fn parser_reset_is_rejected_while_suspended() {
		let mut p = Parser::new(Count {
			suspend_at: Some(1),
			..Count::default()
		});
		assert_eq!(p.feed(b"<a><b/></a>", true).unwrap(), ParsingStatus::Suspended);
		match p.reset() {
			Err(Error::InvalidOperation(_)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		assert_eq!(p.status(), ParsingStatus::Suspended);
		assert_eq!(p.depth(), 1);
		assert_eq!(p.resume().unwrap(), ParsingStatus::Finished);
		assert_eq!(p.get_handler().starts, 2);
		assert_eq!(p.get_handler().ends, 2);
	}

	#[test]
	fn parser_triplet_toggle_is_rejected_while_suspended() {
		let mut p = Parser::new(Count {
			suspend_at: Some(1),
			..Count::default()
		});
		assert_eq!(p.feed(b"<a><b/></a>", true).unwrap(), ParsingStatus::Suspended);
		match p.set_triplet_mode(true) {
			Err(Error::InvalidOperation(_)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		assert!(!p.triplet_mode());
		assert_eq!(p.status(), ParsingStatus::Suspended);
		assert_eq!(p.resume().unwrap(), ParsingStatus::Finished);
		assert_eq!(p.get_handler().ends, 2);
	}

	#[test]
	fn parser_reset_clears_error() {
		let mut p = Parser::new(());
		p.parse_str("<a></b>").unwrap_err();
		p.reset().unwrap();
		assert_eq!(p.status(), ParsingStatus::Initialized);
		assert_eq!(p.parse_str("<a/>").unwrap(), ParsingStatus::Finished);
	}

	#[test]
	fn parser_reset_restores_construction_options() {
		let mut p = Parser::with_options(ParserOptions::default().triplet(true), ());
		p.set_triplet_mode(false).unwrap();
		assert!(!p.triplet_mode());
		p.reset().unwrap();
		assert!(p.triplet_mode());
	}

	#[test]
	fn parser_triplet_toggle_is_rejected_while_parsing() {
		let mut p = Parser::new(());
		p.feed(b"<a>", false).unwrap();
		match p.set_triplet_mode(true) {
			Err(Error::InvalidOperation(_)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		assert!(!p.triplet_mode());
		assert_eq!(p.status(), ParsingStatus::Parsing);
	}

	#[test]
	fn parser_releases_names_after_document() {
		let mut p = Parser::new(());
		p.parse_str("<n:e xmlns:n='urn:n'><n:f a='1'/><n:g/></n:e>")
			.unwrap();
		assert_eq!(p.get_resolver().live_names(), 0);
		p.release_temporaries();
	}
}
