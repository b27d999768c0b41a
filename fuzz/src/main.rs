#[macro_use]
extern crate afl;
extern crate nsxml;

#[derive(Default)]
struct Collect(Vec<String>);

impl nsxml::Handler for Collect {
	fn start_element(&mut self, name: nsxml::QualifiedName<'_>, attrs: &[nsxml::Attribute<'_>]) -> nsxml::Flow {
		self.0.push(format!("start {}", name));
		for attr in attrs {
			self.0.push(format!("attr {} {}", attr.name, attr.value));
		}
		nsxml::Flow::Continue
	}

	fn end_element(&mut self, name: nsxml::QualifiedName<'_>) -> nsxml::Flow {
		self.0.push(format!("end {}", name));
		nsxml::Flow::Continue
	}

	fn text(&mut self, text: &str) -> nsxml::Flow {
		match self.0.last_mut() {
			Some(last) if last.starts_with("text ") => last.push_str(text),
			_ => self.0.push(format!("text {}", text)),
		}
		nsxml::Flow::Continue
	}
}

fn parse_chunked<'c, 'cc>(chunks: &'c [&'cc [u8]]) -> nsxml::Result<Vec<String>> {
	let mut parser = nsxml::Parser::new(Collect::default());

	for chunk in chunks {
		match parser.feed(*chunk, false)? {
			nsxml::ParsingStatus::Parsing => (),
			other => panic!("unexpected status before eof: {:?}", other),
		}
	}

	parser.feed(b"", true)?;
	Ok(parser.into_handler().0)
}

fn main() {
    fuzz!(|data: &[u8]| {
		let mut chunks = Vec::<&[u8]>::new();
		let zero = &b"\0"[..];
		for chunk in data.split(|b| { *b == b'\0' }) {
			if chunk.len() == 0 {
				chunks.push(zero)
			} else {
				chunks.push(chunk)
			}
		}
		let chunked = parse_chunked(&chunks);
		let buf = chunks.join(&b""[..]);
		let whole = parse_chunked(&[&buf]);

		match (chunked, whole) {
			(Ok(a), Ok(b)) => {
				if a != b {
					panic!("output depends on chunking")
				}
			}
			(Err(_), Err(_)) => (),
			_ => panic!("error state depends on chunking"),
		}
    });
}
