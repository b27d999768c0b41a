use std::io;

use log::trace;

use crate::error::{Error, Result};
use crate::parser::{Handler, Parser, ParserOptions, ParsingStatus};

/**
# Blocking driver for parsers

This is a blocking pull-based driver which reads a [`io::BufRead`] to its end
and feeds the data to a [`Parser`].

I/O errors from the source are passed on as [`Error::IO`] and do not poison
the parser; the call may be retried. All other errors are fatal.

## Example

```
use nsxml::{PullDriver, Handler, Flow, ParsingStatus};

#[derive(Default)]
struct Text(String);

impl Handler for Text {
	fn text(&mut self, text: &str) -> Flow {
		self.0.push_str(text);
		Flow::Continue
	}
}

let doc = &b"<?xml version='1.0'?><hello>World!</hello>"[..];
let mut driver = PullDriver::new(doc, Text::default());
assert_eq!(driver.parse_all().unwrap(), ParsingStatus::Finished);
assert_eq!(driver.get_parser().get_handler().0, "World!");
```
*/
pub struct PullDriver<T: io::BufRead, H: Handler> {
	parser: Parser<H>,
	inner: T,
}

impl<T: io::BufRead, H: Handler> PullDriver<T, H> {
	/// Create a new driver with a default-configured parser, wrapping the
	/// given reader.
	pub fn new(inner: T, handler: H) -> Self {
		Self::with_options(inner, ParserOptions::default(), handler)
	}

	/// Create a new driver while configuring the parser with the given
	/// options.
	pub fn with_options(inner: T, options: ParserOptions, handler: H) -> Self {
		Self::wrap(inner, Parser::with_options(options, handler))
	}

	/// Create a driver from an existing parser.
	pub fn wrap(inner: T, parser: Parser<H>) -> Self {
		Self { parser, inner }
	}

	/// Read and process data until the document is finished, a handler
	/// suspends parsing or an error occurs.
	///
	/// If the parser is suspended, it is resumed first.
	pub fn parse_all(&mut self) -> Result<ParsingStatus> {
		if self.parser.status() == ParsingStatus::Suspended {
			match self.parser.resume()? {
				ParsingStatus::Parsing => (),
				other => return Ok(other),
			}
		}
		loop {
			let buf = match self.inner.fill_buf() {
				Ok(buf) => buf,
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(Error::io(e)),
			};
			let n = buf.len();
			trace!("read {} bytes", n);
			let status = self.parser.feed(buf, n == 0)?;
			self.inner.consume(n);
			match status {
				ParsingStatus::Parsing => (),
				other => return Ok(other),
			}
		}
	}

	/// Access the inner BufRead
	pub fn get_inner(&self) -> &T {
		&self.inner
	}

	/// Access the inner BufRead, mutably
	pub fn get_inner_mut(&mut self) -> &mut T {
		&mut self.inner
	}

	/// Access the parser
	pub fn get_parser(&self) -> &Parser<H> {
		&self.parser
	}

	/// Access the parser, mutably
	pub fn get_parser_mut(&mut self) -> &mut Parser<H> {
		&mut self.parser
	}

	/// Consume the driver and return the reader and the parser.
	pub fn into_inner(self) -> (T, Parser<H>) {
		(self.inner, self.parser)
	}
}
