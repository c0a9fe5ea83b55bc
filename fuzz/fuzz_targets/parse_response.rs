#![no_main]
use libfuzzer_sys::fuzz_target;

use h1_incremental::{ParsedMessage, Parser, Status};

fn run<'a>(pieces: impl IntoIterator<Item = &'a [u8]>) -> Option<(Vec<ParsedMessage>, Vec<u8>)> {
    let mut parser = Parser::new();
    let mut messages = Vec::new();
    let mut body = Vec::new();
    for piece in pieces {
        parser.feed(piece);
        loop {
            match parser.parse(|data| body.extend_from_slice(data)).ok()? {
                Status::NeedMoreData => break,
                Status::HeadersReady(_) => {}
                Status::MessageComplete(message) => messages.push(message),
            }
        }
    }
    if let Some(message) = parser.finish(|data| body.extend_from_slice(data)).ok()? {
        messages.push(message);
    }
    Some((messages, body))
}

fuzz_target!(|input: &[u8]| {
    let whole = run(std::iter::once(input));
    let split = input.len() / 2;
    let halves = run(vec![&input[..split], &input[split..]]);
    if let (Some((a, body_a)), Some((b, body_b))) = (whole, halves) {
        assert_eq!(a.len(), b.len());
        assert_eq!(body_a, body_b);
    }
});
