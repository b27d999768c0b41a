use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nsxml::{Attribute, Flow, Handler, Parser, ParserOptions, ParsingStatus, PullDriver, QualifiedName};

static SHORT_DOCUMENT: &'static [u8] = b"<?xml version='1.0'?><iq xmlns='jabber:client' type='get' id='1'><query xmlns='jabber:iq:roster'/></iq>";

#[derive(Default)]
struct Counter {
	elements: usize,
	attributes: usize,
	bytes: usize,
}

impl Handler for Counter {
	fn start_element(&mut self, name: QualifiedName<'_>, attrs: &[Attribute<'_>]) -> Flow {
		self.elements += 1;
		self.attributes += attrs.len();
		self.bytes += name.as_str().len();
		Flow::Continue
	}

	fn text(&mut self, text: &str) -> Flow {
		self.bytes += text.len();
		Flow::Continue
	}
}

fn namespaced_document(nchildren: usize) -> Vec<u8> {
	let mut doc = String::from(
		"<?xml version='1.0'?><stream:stream xmlns='jabber:client' \
		 xmlns:stream='http://etherx.jabber.org/streams' to='example.com'>",
	);
	for i in 0..nchildren {
		doc.push_str(&format!(
			"<message xmlns:j='urn:xmpp:jingle:1' id='m{}' type='chat'>\
			 <j:jingle j:action='session-initiate' sid='{}'>\
			 <j:content creator='initiator' name='audio'>\
			 <description xmlns='urn:xmpp:jingle:apps:rtp:1' media='audio'>\
			 <payload-type id='111' name='opus' clockrate='48000'/>\
			 </description></j:content></j:jingle>\
			 <body>hello &amp; welcome</body></message>",
			i, i
		));
	}
	doc.push_str("</stream:stream>");
	doc.into_bytes()
}

fn short_document(c: &mut Criterion) {
	c.bench_function("short_document", |bench| {
		bench.iter(|| {
			let mut doc = &SHORT_DOCUMENT[..];
			let mut driver = PullDriver::new(black_box(&mut doc), Counter::default());
			assert_eq!(driver.parse_all().unwrap(), ParsingStatus::Finished);
		});
	});
}

fn huge_document(c: &mut Criterion) {
	let doc = namespaced_document(512);
	let mut group = c.benchmark_group("huge_document");

	group.bench_function("singleuse", |b| {
		b.iter(|| {
			let mut p = Parser::new(Counter::default());
			assert_eq!(p.feed(black_box(&doc[..]), true).unwrap(), ParsingStatus::Finished);
		});
	});

	group.bench_function("triplet", |b| {
		b.iter(|| {
			let mut p = Parser::with_options(ParserOptions::default().triplet(true), Counter::default());
			assert_eq!(p.feed(black_box(&doc[..]), true).unwrap(), ParsingStatus::Finished);
		});
	});

	group.bench_function("reused", |b| {
		let mut p = Parser::new(Counter::default());
		b.iter(|| {
			p.reset().unwrap();
			assert_eq!(p.feed(black_box(&doc[..]), true).unwrap(), ParsingStatus::Finished);
		});
	});

	group.bench_function("chunked", |b| {
		b.iter(|| {
			let mut p = Parser::new(Counter::default());
			for chunk in doc.chunks(1024) {
				p.feed(black_box(chunk), false).unwrap();
			}
			assert_eq!(p.feed(b"", true).unwrap(), ParsingStatus::Finished);
		});
	});
}

criterion_group!{
	name = benches;
	config = Criterion::default().sample_size(300);
	targets = short_document, huge_document
}
criterion_main!(benches);
