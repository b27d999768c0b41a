/*!
# Namespace-aware qualified name resolution for streaming XML

This crate provides a push-based XML 1.0 parser which resolves element and
attribute names according to Namespaces in XML 1.0 and reports them through
a SAX-like [`Handler`].

## Features

* Qualified names rendered as `uri<sep>local`, or with triplet mode as
  `uri<sep>local<sep>prefix`, with a configurable separator
* Namespace declaration notifications, strictly nested around the element
  notifications
* Rendered names kept in reusable buffers, stable from the start to the end
  of an element
* Cooperative suspension and abort through the [`Flow`] returned by the
  handler
* Parser reset to parse the next document with the same handler
* Push-based ([`Parser::feed`]) and pull-based ([`PullDriver`]) usage
* UTF-8 input only, no DTDs

## Example

```
use nsxml::{Parser, Handler, Flow, QualifiedName, Attribute, ParserOptions};

#[derive(Default)]
struct Log(Vec<String>);

impl Handler for Log {
	fn start_element(&mut self, name: QualifiedName<'_>, attrs: &[Attribute<'_>]) -> Flow {
		self.0.push(format!("start {}", name));
		for attr in attrs {
			self.0.push(format!("attr {}={}", attr.name, attr.value));
		}
		Flow::Continue
	}

	fn end_element(&mut self, name: QualifiedName<'_>) -> Flow {
		self.0.push(format!("end {}", name));
		Flow::Continue
	}
}

let doc = "<foo:e xmlns:foo='http://example.org/' foo:a='12'/>";
let mut p = Parser::with_options(ParserOptions::default().triplet(true), Log::default());
p.parse_str(doc).unwrap();
assert_eq!(p.get_handler().0, vec![
	"start http://example.org/ e foo",
	"attr http://example.org/ a foo=12",
	"end http://example.org/ e foo",
]);
```

## Driving the namespace engine directly

The [`parser::NamespaceResolver`] can be fed with start and end tags from any
tokenizer; the bundled [`Lexer`] is only one possible source.
*/
pub mod error;
pub mod lexer;
pub mod parser;
pub mod strings;
mod context;
mod driver;
mod errctx;


#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use lexer::{Lexer, LexerOptions, Token};
#[doc(inline)]
pub use parser::{
	Attribute, Flow, Handler, NamespaceName, NamespaceResolver, Parser, ParserOptions,
	ParsingStatus, QualifiedName, RcPtr, XMLNS_XML, XMLNS_XMLNS,
};
pub use strings::{CData, NCName, Name};
pub use context::Context;
pub use driver::PullDriver;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
