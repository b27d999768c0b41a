/*!
# Minimal incremental tokenizer

The [`Lexer`] turns UTF-8 byte chunks into [`Token`]s for the namespace
engine: start tags with their raw attributes, end tags and text. Comments,
processing instructions and the XML declaration are skipped; CDATA sections
are reported as text. Document type declarations are not supported.

Bytes are pushed with [`Lexer::push`]; [`Lexer::next_token`] returns
`Ok(None)` whenever the buffered data does not contain a complete token
yet. Chunks may be split at arbitrary byte positions.
*/
use std::convert::TryFrom;
use std::str;

use bytes::{Buf, BytesMut};
use log::trace;

use nsxml_validation::chars::{is_space, is_xml_char};

use crate::errctx::*;
use crate::error::{add_context, Error, Result, WFError};
use crate::strings::{CData, Name};

const BOM: &'static [u8] = b"\xef\xbb\xbf";
const COMMENT_START: &'static [u8] = b"<!--";
const CDATA_START: &'static [u8] = b"<![CDATA[";

/// A complete piece of markup or text.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
	/// `<name attr='value'>` or, with `empty` set, `<name/>`.
	///
	/// Attribute values have references expanded and whitespace
	/// normalized.
	StartTag {
		name: Name,
		attributes: Vec<(Name, CData)>,
		empty: bool,
	},
	/// `</name>`
	EndTag(Name),
	/// Character data, including the contents of CDATA sections.
	Text(CData),
}

/// Limits applied by the [`Lexer`].
#[derive(Debug, Clone, PartialEq, Copy)]
pub struct LexerOptions {
	/// Maximum number of bytes of a single piece of markup, and the chunk
	/// size in which text is emitted.
	pub max_token_length: usize,
}

impl LexerOptions {
	pub fn defaults() -> LexerOptions {
		LexerOptions {
			max_token_length: 8192,
		}
	}

	pub fn max_token_length(mut self, v: usize) -> LexerOptions {
		self.max_token_length = v;
		self
	}
}

impl Default for LexerOptions {
	fn default() -> Self {
		Self::defaults()
	}
}

enum Step {
	Emit(Token, usize),
	Skip(usize),
	NeedMore(&'static str),
}

fn decode(bytes: &[u8]) -> Result<&str> {
	str::from_utf8(bytes).map_err(|e| Error::InvalidUtf8Byte(bytes[e.valid_up_to()]))
}

fn find(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
	if haystack.len() < from + needle.len() {
		return None;
	}
	haystack[from..]
		.windows(needle.len())
		.position(|w| w == needle)
		.map(|p| p + from)
}

fn find_byte(haystack: &[u8], from: usize, needle: u8) -> Option<usize> {
	haystack
		.get(from..)?
		.iter()
		.position(|&b| b == needle)
		.map(|p| p + from)
}

/// Position of the `>` closing the tag which starts at `buf[0]`, ignoring
/// `>` inside quoted attribute values.
fn find_tag_end(buf: &[u8]) -> Option<usize> {
	let mut quote = None;
	for (i, &b) in buf.iter().enumerate().skip(1) {
		match quote {
			Some(q) if b == q => quote = None,
			Some(_) => (),
			None => match b {
				b'"' | b'\'' => quote = Some(b),
				b'>' => return Some(i),
				_ => (),
			},
		}
	}
	None
}

/// Largest prefix length of `buf` which does not end inside a UTF-8
/// sequence.
fn utf8_boundary(buf: &[u8]) -> usize {
	let len = buf.len();
	let mut start = len;
	while start > 0 && len - start < 4 {
		start -= 1;
		let b = buf[start];
		if b & 0xc0 != 0x80 {
			let need = if b < 0x80 {
				1
			} else if b & 0xe0 == 0xc0 {
				2
			} else if b & 0xf0 == 0xe0 {
				3
			} else if b & 0xf8 == 0xf0 {
				4
			} else {
				1
			};
			return if len - start < need { start } else { len };
		}
	}
	len
}

fn resolve_ref(name: &str, ctx: &'static str) -> Result<char> {
	match name {
		"lt" => return Ok('<'),
		"gt" => return Ok('>'),
		"amp" => return Ok('&'),
		"apos" => return Ok('\''),
		"quot" => return Ok('"'),
		_ => (),
	}
	let num = match name.strip_prefix('#') {
		Some(num) => num,
		// XML 1.0
		// Well-formedness constraint: Entity Declared
		None => return Err(WFError::UndeclaredEntity.into()),
	};
	let (digits, radix) = match num.strip_prefix('x') {
		Some(hex) => (hex, 16),
		None => (num, 10),
	};
	if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
		return Err(WFError::InvalidSyntax("malformed character reference").into());
	}
	let cp = u32::from_str_radix(digits, radix)
		.map_err(|_| WFError::InvalidSyntax("character reference out of range"))?;
	// XML 1.0
	// Well-formedness constraint: Legal Character
	match char::from_u32(cp) {
		Some(ch) if is_xml_char(ch) => Ok(ch),
		_ => Err(WFError::InvalidChar(ctx, cp, true).into()),
	}
}

/// Expand references and normalize line ends.
///
/// In attribute values (`attr`), line ends and tabs become spaces.
fn expand(raw: &str, ctx: &'static str, attr: bool) -> Result<CData> {
	let mut out = String::with_capacity(raw.len());
	let mut rest = raw;
	while let Some(pos) = rest.find(|c: char| c == '&' || c == '\r' || (attr && (c == '\t' || c == '\n'))) {
		out.push_str(&rest[..pos]);
		match rest.as_bytes()[pos] {
			b'&' => {
				let end = match rest[pos..].find(';') {
					Some(end) => pos + end,
					None => {
						return Err(WFError::InvalidSyntax("unterminated reference").into())
					}
				};
				out.push(resolve_ref(&rest[pos + 1..end], ctx)?);
				rest = &rest[end + 1..];
			}
			b'\r' => {
				out.push(if attr { ' ' } else { '\n' });
				rest = &rest[pos + 1..];
				if rest.starts_with('\n') {
					rest = &rest[1..];
				}
			}
			_ => {
				out.push(' ');
				rest = &rest[pos + 1..];
			}
		}
	}
	out.push_str(rest);
	add_context(CData::try_from(out).map_err(Error::from), ctx)
}

fn name_in(raw: &str, ctx: &'static str) -> Result<Name> {
	add_context(Name::try_from(raw).map_err(Error::from), ctx)
}

fn parse_start_tag(tag: &str) -> Result<Token> {
	let (tag, empty) = match tag.strip_suffix('/') {
		Some(tag) => (tag, true),
		None => (tag, false),
	};
	let name_end = tag.find(is_space).unwrap_or(tag.len());
	let name = name_in(&tag[..name_end], ERRCTX_NAME)?;
	let mut rest = &tag[name_end..];
	let mut attributes = Vec::new();
	loop {
		let trimmed = rest.trim_start_matches(is_space);
		if trimmed.is_empty() {
			break;
		}
		if trimmed.len() == rest.len() {
			let ch = trimmed.chars().next().unwrap_or(' ');
			return Err(WFError::UnexpectedChar(ERRCTX_ELEMENT, ch, Some(&["whitespace"])).into());
		}
		rest = trimmed;

		let name_end = match rest.find(|c: char| c == '=' || is_space(c)) {
			Some(p) => p,
			None => {
				return Err(WFError::UnexpectedToken(ERRCTX_ATTNAME, "end of tag", Some(&["="])).into())
			}
		};
		let attr_name = name_in(&rest[..name_end], ERRCTX_ATTNAME)?;
		rest = rest[name_end..].trim_start_matches(is_space);
		rest = match rest.strip_prefix('=') {
			Some(rest) => rest.trim_start_matches(is_space),
			None => {
				let ch = rest.chars().next().unwrap_or(' ');
				return Err(WFError::UnexpectedChar(ERRCTX_ATTNAME, ch, Some(&["="])).into());
			}
		};

		let quote = match rest.chars().next() {
			Some(q) if q == '\'' || q == '"' => q,
			Some(ch) => {
				return Err(WFError::UnexpectedChar(ERRCTX_ATTVAL, ch, Some(&["'", "\""])).into())
			}
			None => {
				return Err(WFError::UnexpectedToken(ERRCTX_ATTVAL, "end of tag", Some(&["'", "\""])).into())
			}
		};
		let body = &rest[1..];
		let close = match body.find(quote) {
			Some(p) => p,
			None => return Err(WFError::InvalidSyntax("unterminated attribute value").into()),
		};
		let raw_value = &body[..close];
		if raw_value.contains('<') {
			// XML 1.0
			// Well-formedness constraint: No < in Attribute Values
			return Err(WFError::UnexpectedChar(ERRCTX_ATTVAL, '<', None).into());
		}
		attributes.push((attr_name, expand(raw_value, ERRCTX_ATTVAL, true)?));
		rest = &body[close + 1..];
	}
	Ok(Token::StartTag {
		name,
		attributes,
		empty,
	})
}

/**
# Push-based XML tokenizer

```
use nsxml::{Lexer, Token};

let mut lexer = Lexer::new();
lexer.push(b"<a x='1'>hi</");
assert!(matches!(lexer.next_token().unwrap(), Some(Token::StartTag { .. })));
assert!(matches!(lexer.next_token().unwrap(), Some(Token::Text(_))));
// the end tag is incomplete
assert!(lexer.next_token().unwrap().is_none());
lexer.push(b"a>");
lexer.push_eof();
assert!(matches!(lexer.next_token().unwrap(), Some(Token::EndTag(_))));
assert!(lexer.next_token().unwrap().is_none());
```
*/
#[derive(Debug)]
pub struct Lexer {
	buf: BytesMut,
	eof: bool,
	started: bool,
	opts: LexerOptions,
}

impl Lexer {
	pub fn new() -> Lexer {
		Lexer::with_options(LexerOptions::defaults())
	}

	pub fn with_options(opts: LexerOptions) -> Lexer {
		Lexer {
			buf: BytesMut::new(),
			eof: false,
			started: false,
			opts,
		}
	}

	/// Append bytes to the input buffer.
	pub fn push(&mut self, data: &[u8]) {
		self.buf.extend_from_slice(data);
	}

	/// Mark the end of the input.
	pub fn push_eof(&mut self) {
		self.eof = true;
	}

	pub fn is_eof(&self) -> bool {
		self.eof
	}

	/// Number of bytes received but not yet turned into tokens.
	pub fn buffered(&self) -> usize {
		self.buf.len()
	}

	/// Discard all buffered input and the eof flag.
	pub fn reset(&mut self) {
		self.buf.clear();
		self.eof = false;
		self.started = false;
	}

	/// Release the input buffer memory if it is not in use.
	pub fn release_temporaries(&mut self) {
		if self.buf.is_empty() {
			self.buf = BytesMut::new();
		}
	}

	fn lex_text(&self) -> Result<Step> {
		let buf = &self.buf[..];
		let limit = buf.len().min(self.opts.max_token_length);
		let end = match find_byte(&buf[..limit], 0, b'<') {
			Some(p) => p,
			None if self.eof && limit == buf.len() => limit,
			None => {
				let mut end = limit;
				// keep an unterminated reference for the next round
				if let Some(amp) = buf[..end].iter().rposition(|&b| b == b'&') {
					if !buf[amp..end].contains(&b';') {
						end = amp;
					}
				}
				if end > 0 && buf[end - 1] == b'\r' {
					end -= 1;
				}
				// a `]]>` may straddle the cut
				let mut brackets = 0;
				while brackets < 2 && end > 0 && buf[end - 1] == b']' {
					end -= 1;
					brackets += 1;
				}
				utf8_boundary(&buf[..end])
			}
		};
		if end == 0 {
			return Ok(Step::NeedMore(ERRCTX_TEXT));
		}
		let raw = decode(&buf[..end])?;
		if raw.contains("]]>") {
			return Err(WFError::UnexpectedToken(ERRCTX_TEXT, "']]>'", None).into());
		}
		let text = expand(raw, ERRCTX_TEXT, false)?;
		Ok(Step::Emit(Token::Text(text), end))
	}

	fn lex_bang(&self) -> Result<Step> {
		let buf = &self.buf[..];
		if buf.starts_with(COMMENT_START) {
			return match find(buf, COMMENT_START.len(), b"--") {
				Some(p) => match buf.get(p + 2) {
					Some(b'>') => {
						decode(&buf[..p])?;
						Ok(Step::Skip(p + 3))
					}
					Some(_) => Err(WFError::InvalidSyntax("'--' in comment").into()),
					None => Ok(Step::NeedMore(ERRCTX_COMMENT)),
				},
				None => Ok(Step::NeedMore(ERRCTX_COMMENT)),
			};
		}
		if buf.starts_with(CDATA_START) {
			let start = CDATA_START.len();
			return match find(buf, start, b"]]>") {
				Some(p) if p == start => Ok(Step::Skip(p + 3)),
				Some(p) => {
					let raw = decode(&buf[start..p])?;
					let text = add_context(normalize_newlines(raw), ERRCTX_CDATA_SECTION)?;
					Ok(Step::Emit(Token::Text(text), p + 3))
				}
				None => Ok(Step::NeedMore(ERRCTX_CDATA_SECTION)),
			};
		}
		if COMMENT_START.starts_with(buf) || CDATA_START.starts_with(buf) {
			return Ok(Step::NeedMore(ERRCTX_UNKNOWN));
		}
		Err(Error::RestrictedXml("document type declarations are not supported"))
	}

	fn lex_markup(&self) -> Result<Step> {
		let buf = &self.buf[..];
		if buf.len() < 2 {
			return Ok(Step::NeedMore(ERRCTX_ELEMENT));
		}
		match buf[1] {
			b'?' => match find(buf, 2, b"?>") {
				Some(p) => {
					decode(&buf[..p])?;
					Ok(Step::Skip(p + 2))
				}
				None => Ok(Step::NeedMore(ERRCTX_PI)),
			},
			b'!' => self.lex_bang(),
			b'/' => match find_byte(buf, 2, b'>') {
				Some(p) => {
					let raw = decode(&buf[2..p])?.trim_end_matches(is_space);
					let name = name_in(raw, ERRCTX_ELEMENT_FOOT)?;
					Ok(Step::Emit(Token::EndTag(name), p + 1))
				}
				None => Ok(Step::NeedMore(ERRCTX_ELEMENT_FOOT)),
			},
			_ => match find_tag_end(buf) {
				Some(p) => {
					let tag = parse_start_tag(decode(&buf[1..p])?)?;
					Ok(Step::Emit(tag, p + 1))
				}
				None => Ok(Step::NeedMore(ERRCTX_ELEMENT)),
			},
		}
	}

	/// Skip a byte order mark at the start of the input.
	///
	/// Returns false if more data is needed to decide.
	fn skip_bom(&mut self) -> bool {
		if self.started {
			return true;
		}
		if !self.eof && self.buf.len() < BOM.len() && BOM.starts_with(&self.buf[..]) {
			return false;
		}
		if self.buf.starts_with(BOM) {
			self.buf.advance(BOM.len());
		}
		self.started = true;
		true
	}

	/// Return the next complete token.
	///
	/// `Ok(None)` is returned if more data is needed or, after
	/// [`Lexer::push_eof`], if all input has been consumed. Incomplete
	/// markup at the end of the input is an error.
	pub fn next_token(&mut self) -> Result<Option<Token>> {
		if !self.skip_bom() {
			return Ok(None);
		}
		loop {
			if self.buf.is_empty() {
				return Ok(None);
			}
			let step = if self.buf[0] == b'<' {
				self.lex_markup()?
			} else {
				self.lex_text()?
			};
			match step {
				Step::Emit(tok, n) => {
					if n > self.opts.max_token_length && !matches!(tok, Token::Text(_)) {
						return Err(Error::RestrictedXml("token too long"));
					}
					self.buf.advance(n);
					trace!("token {:?} ({} bytes)", tok, n);
					return Ok(Some(tok));
				}
				Step::Skip(n) => {
					self.buf.advance(n);
				}
				Step::NeedMore(ctx) => {
					if self.eof {
						return Err(Error::wfeof(ctx));
					}
					if self.buf.len() > self.opts.max_token_length {
						return Err(Error::RestrictedXml("token too long"));
					}
					return Ok(None);
				}
			}
		}
	}
}

impl Default for Lexer {
	fn default() -> Self {
		Self::new()
	}
}

fn normalize_newlines(raw: &str) -> Result<CData> {
	if !raw.contains('\r') {
		return Ok(CData::try_from(raw)?);
	}
	Ok(CData::try_from(raw.replace("\r\n", "\n").replace('\r', "\n"))?)
}
