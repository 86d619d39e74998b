//! # chatwire: incremental decoder for sentinel-terminated chat streams
//!
//! A chat backend streams its answer as an unframed chunked HTTP body:
//! plain text is content, the literal `[DONE]` ends the stream successfully
//! and the literal `[ERROR]` ends it with the server's error text. Chunks
//! arrive at arbitrary byte boundaries, so a multi-byte character or a
//! marker may be split across reads.
//!
//! ## The Pieces
//!
//! | Piece | Type | What it does |
//! |-------|------|-------------|
//! | Decoder | [`StreamDecoder`] | Bytes in, classified [`Event`]s out |
//! | Source | [`ByteSource`] | Where chunks come from (HTTP body, test fixture) |
//! | Sink | [`EventSink`], [`Handlers`] | Where events go (`on_token`, `on_done`, `on_error`) |
//! | Driving loop | [`pump()`], [`events()`], [`Pump`] | Read, decode, dispatch, cancel |
//!
//! ## Guarantees
//!
//! - Tokens are delivered in arrival order and are never empty.
//! - Exactly one terminal callback (`on_done` or `on_error`) fires per
//!   stream, and nothing fires after it.
//! - Malformed bytes are replaced with U+FFFD; they never abort a stream.
//! - A marker is recognised however many reads it is split across.
//!
//! ```no_run
//! use chatwire::{Handlers, StreamDecoder, pump};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run(source: impl chatwire::ByteSource) {
//! let mut answer = String::new();
//! let mut handlers = Handlers::new()
//!     .with_token(|t| answer.push_str(t))
//!     .with_error(|e| eprintln!("stream failed: {e}"));
//! pump(source, StreamDecoder::new(), &mut handlers, &CancellationToken::new()).await;
//! # }
//! ```

#![deny(missing_docs)]

pub mod decoder;
pub mod error;
pub mod event;
pub mod pump;
pub mod sink;
pub mod source;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports for convenience
pub use decoder::{DONE_MARKER, ERROR_MARKER, StreamDecoder, decode_complete};
pub use error::StreamError;
pub use event::{DecoderState, Event};
pub use pump::{Outcome, Pump, events, pump};
pub use sink::{EventSink, Handlers};
pub use source::{ByteSource, StreamSource};
