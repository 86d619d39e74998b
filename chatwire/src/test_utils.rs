//! In-memory sources and sinks for tests without a network.
//!
//! Available under `#[cfg(test)]` and with the `test-utils` feature.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;

use crate::error::StreamError;
use crate::sink::EventSink;
use crate::source::ByteSource;

/// A [`ByteSource`] that replays canned reads.
pub struct ChunkSource {
    reads: VecDeque<Result<Bytes, StreamError>>,
    hang: bool,
    cancelled: bool,
    probe: SourceProbe,
}

impl ChunkSource {
    /// Replay `chunks` in order, then report end of stream.
    pub fn new<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            reads: chunks.into_iter().map(|c| Ok(c.into())).collect(),
            hang: false,
            cancelled: false,
            probe: SourceProbe::default(),
        }
    }

    /// Fail the read after the queued chunks.
    #[must_use]
    pub fn fail_with(mut self, message: &str) -> Self {
        self.reads.push_back(Err(StreamError::read_failed(message)));
        self
    }

    /// Suspend forever instead of reporting end of stream.
    #[must_use]
    pub fn hang(mut self) -> Self {
        self.hang = true;
        self
    }

    /// A handle that keeps counting after the source is moved.
    pub fn probe(&self) -> SourceProbe {
        self.probe.clone()
    }
}

impl ByteSource for ChunkSource {
    fn read_next(&mut self) -> impl Future<Output = Result<Option<Bytes>, StreamError>> + Send {
        async move {
            if self.cancelled {
                return Ok(None);
            }
            self.probe.reads.fetch_add(1, Ordering::SeqCst);
            match self.reads.pop_front() {
                Some(read) => read.map(Some),
                None if self.hang => std::future::pending().await,
                None => Ok(None),
            }
        }
    }

    fn cancel(&mut self) -> impl Future<Output = ()> + Send {
        self.cancelled = true;
        self.probe.cancels.fetch_add(1, Ordering::SeqCst);
        std::future::ready(())
    }
}

/// Read and cancel counters shared with a [`ChunkSource`].
#[derive(Clone, Default)]
pub struct SourceProbe {
    reads: Arc<AtomicUsize>,
    cancels: Arc<AtomicUsize>,
}

impl SourceProbe {
    /// Number of `read_next` calls made before cancellation.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `cancel` calls.
    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

/// One callback received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `on_token`.
    Token(String),
    /// `on_done`.
    Done,
    /// `on_error`.
    Error(StreamError),
}

/// An [`EventSink`] that records every call.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Calls in the order they arrived.
    pub calls: Vec<Call>,
}

impl RecordingSink {
    /// All token text, concatenated.
    pub fn text(&self) -> String {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Token(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// How many `on_done` / `on_error` calls were made.
    pub fn terminal_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Done | Call::Error(_)))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn on_token(&mut self, text: &str) {
        self.calls.push(Call::Token(text.to_string()));
    }

    fn on_done(&mut self) {
        self.calls.push(Call::Done);
    }

    fn on_error(&mut self, error: StreamError) {
        self.calls.push(Call::Error(error));
    }
}
