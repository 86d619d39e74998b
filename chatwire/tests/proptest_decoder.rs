//! Property-based tests: chunk boundaries never change what is decoded.

use chatwire::{DONE_MARKER, ERROR_MARKER, Event, StreamDecoder};
use proptest::prelude::*;

/// Text biased towards marker fragments and multi-byte characters.
fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z \\[\\]DONER_é世🦀]{0,64}",
        any::<String>(),
    ]
    .prop_filter("no markers, no leading BOM", |t| {
        !t.contains(DONE_MARKER) && !t.contains(ERROR_MARKER) && !t.starts_with('\u{feff}')
    })
}

fn arb_cuts() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(any::<usize>(), 0..8)
}

/// Split `bytes` at the given offsets (taken modulo the length).
fn chunked(bytes: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
    points.push(0);
    points.push(bytes.len());
    points.sort_unstable();
    points.windows(2).map(|w| bytes[w[0]..w[1]].to_vec()).collect()
}

fn decode(chunks: &[Vec<u8>], finalize: bool) -> Vec<Event> {
    let mut decoder = StreamDecoder::new();
    let mut events: Vec<Event> = chunks.iter().flat_map(|c| decoder.feed(c)).collect();
    if finalize {
        events.extend(decoder.finalize());
    }
    events
}

fn token_text(events: &[Event]) -> String {
    events.iter().filter_map(Event::as_token).collect()
}

proptest! {
    #[test]
    fn marker_free_text_survives_any_chunking(text in arb_text(), cuts in arb_cuts()) {
        let events = decode(&chunked(text.as_bytes(), &cuts), true);

        prop_assert_eq!(token_text(&events), text);
        prop_assert!(events.iter().all(|e| matches!(e, Event::Token(t) if !t.is_empty())));
    }

    #[test]
    fn split_matches_unsplit(text in arb_text(), at in any::<usize>()) {
        let bytes = text.as_bytes();
        let whole = decode(&[bytes.to_vec()], true);
        let split = decode(&chunked(bytes, &[at]), true);

        prop_assert_eq!(token_text(&whole), token_text(&split));
    }

    #[test]
    fn done_marker_found_across_any_chunking(
        prefix in arb_text(),
        suffix in arb_text(),
        cuts in arb_cuts(),
    ) {
        let body = format!("{prefix}{DONE_MARKER}{suffix}");
        let events = decode(&chunked(body.as_bytes(), &cuts), false);

        prop_assert_eq!(token_text(&events), prefix);
        prop_assert_eq!(events.last(), Some(&Event::Done));
        prop_assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    #[test]
    fn error_marker_found_across_any_chunking(
        prefix in arb_text(),
        message in arb_text(),
        cuts in arb_cuts(),
    ) {
        let body = format!("{prefix}{ERROR_MARKER}{message}");
        let events = decode(&chunked(body.as_bytes(), &cuts), false);

        prop_assert_eq!(token_text(&events), prefix);
        match events.last() {
            Some(Event::Error(received)) => {
                prop_assert!(received.starts_with(ERROR_MARKER));
                prop_assert!(message.starts_with(&received[ERROR_MARKER.len()..]));
            }
            other => prop_assert!(false, "expected trailing error, got {:?}", other),
        }
        prop_assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }
}
