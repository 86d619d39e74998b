//! The byte-to-event state machine.
//!
//! The wire format has no framing besides two sentinels:
//!
//! ```text
//! Hello, how can I help[DONE]
//! partial answer[ERROR]upstream model overloaded
//! ```
//!
//! Everything before a sentinel is content. `[ERROR]` wins over `[DONE]`
//! when both are present in the same decoded unit.
//!
//! Markers may be split over any number of reads. The decoder holds back
//! the longest tail of decoded text that could still grow into a marker
//! and prepends it to the next read, so `"partial[ERR"` + `"OR]failed"`
//! yields `Token("partial")` then `Error("[ERROR]failed")`. Held-back text
//! is released as soon as it stops looking like a marker, or on
//! [`StreamDecoder::finalize`].

use encoding_rs::{CoderResult, Decoder, Encoding, UTF_8};

use crate::event::{DecoderState, Event};

/// Success terminator.
pub const DONE_MARKER: &str = "[DONE]";

/// Failure terminator. The message is the marker plus whatever follows it.
pub const ERROR_MARKER: &str = "[ERROR]";

const MARKERS: [&str; 2] = [ERROR_MARKER, DONE_MARKER];

/// Incremental decoder for one chat stream.
///
/// Feed it every chunk in order with [`feed`](Self::feed); call
/// [`finalize`](Self::finalize) if the body ends before a marker arrives.
pub struct StreamDecoder {
    decoder: Decoder,
    /// Decoded text that is a proper prefix of a marker.
    held: String,
    state: DecoderState,
    /// The text decoder has been flushed and must not be used again.
    flushed: bool,
}

impl StreamDecoder {
    /// A UTF-8 decoder. A leading byte order mark is dropped.
    #[must_use]
    pub fn new() -> Self {
        Self::with_encoding(UTF_8)
    }

    /// A decoder for the given character encoding.
    #[must_use]
    pub fn with_encoding(encoding: &'static Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder_with_bom_removal(),
            held: String::new(),
            state: DecoderState::Active,
            flushed: false,
        }
    }

    /// A decoder for a `charset` label such as `"utf-8"` or `"gbk"`.
    ///
    /// Unknown labels fall back to UTF-8.
    #[must_use]
    pub fn for_label(label: &str) -> Self {
        let encoding = Encoding::for_label(label.trim().as_bytes()).unwrap_or_else(|| {
            tracing::warn!(label, "unknown charset label, decoding as UTF-8");
            UTF_8
        });
        Self::with_encoding(encoding)
    }

    /// The character encoding in use.
    pub fn encoding(&self) -> &'static Encoding {
        self.decoder.encoding()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Whether a terminal marker has been seen.
    pub fn is_terminated(&self) -> bool {
        self.state == DecoderState::Terminated
    }

    /// Decode the next chunk and classify what it completes.
    ///
    /// Returns no events for an empty chunk, or for a chunk that only
    /// extends a partial character or a partial marker. A terminal event,
    /// if any, is always last; after it the decoder ignores further input.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Event> {
        if self.is_terminated() || self.flushed {
            tracing::warn!(len = chunk.len(), "chunk fed to a finished decoder, ignoring");
            return Vec::new();
        }

        let decoded = self.decode(chunk, false);
        if decoded.is_empty() {
            return Vec::new();
        }

        let mut text = std::mem::take(&mut self.held);
        text.push_str(&decoded);
        self.classify(text)
    }

    /// Flush the decoder at natural end of stream.
    ///
    /// Emits remaining content as one [`Event::Token`] if there is any. A
    /// trailing partial character becomes U+FFFD. No terminal event is
    /// produced: a body that ends without a marker is an implicit success
    /// for the caller to report.
    pub fn finalize(&mut self) -> Vec<Event> {
        if self.is_terminated() || self.flushed {
            return Vec::new();
        }

        let mut text = std::mem::take(&mut self.held);
        let tail = self.decode(&[], true);
        self.flushed = true;
        text.push_str(&tail);

        if text.is_empty() {
            Vec::new()
        } else {
            vec![Event::Token(text)]
        }
    }

    /// Release text held back as a possible marker start, as a token.
    ///
    /// For streams that end early on a read failure or cancellation. A
    /// partial character still inside the text decoder is not flushed.
    pub fn take_held(&mut self) -> Option<Event> {
        if self.held.is_empty() {
            None
        } else {
            Some(Event::Token(std::mem::take(&mut self.held)))
        }
    }

    /// Classify a whole body at once, for transports that cannot stream.
    ///
    /// Same rules as streaming, except that a body without any marker
    /// ends with [`Event::Done`] and a body containing `[ERROR]` yields
    /// only the [`Event::Error`], without the content before it.
    pub fn decode_complete(mut self, body: &[u8]) -> Vec<Event> {
        let mut events = self.feed(body);
        if matches!(events.last(), Some(Event::Error(_))) {
            events.retain(Event::is_terminal);
        } else if !self.is_terminated() {
            events.extend(self.finalize());
            events.push(Event::Done);
        }
        events
    }

    fn decode(&mut self, mut input: &[u8], last: bool) -> String {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(input.len())
            .unwrap_or(input.len());
        let mut out = String::with_capacity(capacity);

        loop {
            let (result, read, replaced) = self.decoder.decode_to_string(input, &mut out, last);
            if replaced {
                tracing::trace!("replaced malformed byte sequence");
            }
            input = &input[read..];
            match result {
                CoderResult::InputEmpty => return out,
                CoderResult::OutputFull => {
                    let more = self
                        .decoder
                        .max_utf8_buffer_length(input.len())
                        .unwrap_or(input.len());
                    out.reserve(more.max(4));
                }
            }
        }
    }

    fn classify(&mut self, mut text: String) -> Vec<Event> {
        let mut events = Vec::with_capacity(2);

        if let Some(idx) = text.find(ERROR_MARKER) {
            let message = text.split_off(idx);
            if !text.is_empty() {
                events.push(Event::Token(text));
            }
            tracing::debug!(message = %message, "error marker received");
            events.push(Event::Error(message));
            self.state = DecoderState::Terminated;
            return events;
        }

        if let Some(idx) = text.find(DONE_MARKER) {
            text.truncate(idx);
            if !text.is_empty() {
                events.push(Event::Token(text));
            }
            tracing::debug!("done marker received");
            events.push(Event::Done);
            self.state = DecoderState::Terminated;
            return events;
        }

        let keep = partial_marker_len(&text);
        self.held = text.split_off(text.len() - keep);
        if !text.is_empty() {
            events.push(Event::Token(text));
        }
        events
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StreamDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamDecoder")
            .field("encoding", &self.encoding().name())
            .field("held", &self.held)
            .field("state", &self.state)
            .finish()
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of a
/// marker. Markers are ASCII, so the split point is a char boundary.
fn partial_marker_len(text: &str) -> usize {
    MARKERS
        .iter()
        .filter_map(|marker| (1..marker.len()).rev().find(|&n| text.ends_with(&marker[..n])))
        .max()
        .unwrap_or(0)
}

/// Classify a UTF-8 body that was read in one piece.
///
/// See [`StreamDecoder::decode_complete`].
pub fn decode_complete(body: &str) -> Vec<Event> {
    StreamDecoder::new().decode_complete(body.as_bytes())
}
