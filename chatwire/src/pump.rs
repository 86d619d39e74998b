//! The read-decode-dispatch loop.
//!
//! One read is in flight at a time. The loop stops on the first terminal
//! event, on a read failure, on natural end of stream or when the caller's
//! [`CancellationToken`] fires, and cancels the source on every early stop.

use futures_util::Stream;
use tokio_util::sync::CancellationToken;

use crate::decoder::StreamDecoder;
use crate::error::StreamError;
use crate::event::Event;
use crate::sink::EventSink;
use crate::source::ByteSource;

/// How a pumped stream ended.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `[DONE]` arrived, or the body ended without any marker.
    Completed,
    /// `[ERROR]` arrived, or reading failed.
    Failed,
    /// The cancellation token fired first.
    Cancelled,
}

/// A byte source paired with its decoder.
///
/// [`step`](Self::step) performs one read. Use [`pump()`] for callback
/// delivery or [`events()`] for a lazy stream; both are built on it.
pub struct Pump<S> {
    source: S,
    decoder: StreamDecoder,
    cancel: CancellationToken,
    finished: bool,
    /// Error to report after held text has been released.
    pending: Option<StreamError>,
}

impl<S: ByteSource> Pump<S> {
    /// Pump `source` through `decoder`, stopping early if `cancel` fires.
    pub fn new(source: S, decoder: StreamDecoder, cancel: CancellationToken) -> Self {
        Self {
            source,
            decoder,
            cancel,
            finished: false,
            pending: None,
        }
    }

    /// Whether a terminal event or error has been produced.
    pub fn is_finished(&self) -> bool {
        self.finished && self.pending.is_none()
    }

    /// Perform one read and return what it produced.
    ///
    /// `Ok` events are in delivery order; if one is terminal it is last.
    /// Natural end of stream yields the flushed content followed by
    /// [`Event::Done`]. `Err` is terminal: a read failure or cancellation.
    /// Text held back as a possible marker start is returned as a token
    /// by the step before such an `Err`. Once finished, every call returns `Ok` with no events.
    pub async fn step(&mut self) -> Result<Vec<Event>, StreamError> {
        if let Some(err) = self.pending.take() {
            return Err(err);
        }
        if self.finished {
            return Ok(Vec::new());
        }
        if self.cancel.is_cancelled() {
            let err = self.abort().await;
            return self.fail(err);
        }

        let read = tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            read = self.source.read_next() => Some(read),
        };

        match read {
            None => {
                let err = self.abort().await;
                self.fail(err)
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, "byte source read failed");
                self.finished = true;
                self.source.cancel().await;
                self.fail(err)
            }
            Some(Ok(None)) => {
                self.finished = true;
                let mut events = self.decoder.finalize();
                tracing::debug!("body ended without a terminal marker, treating as done");
                events.push(Event::Done);
                Ok(events)
            }
            Some(Ok(Some(chunk))) => {
                tracing::trace!(len = chunk.len(), "chunk received");
                let events = self.decoder.feed(&chunk);
                if self.decoder.is_terminated() {
                    self.finished = true;
                    self.source.cancel().await;
                }
                Ok(events)
            }
        }
    }

    /// End with `err`, first releasing any text held as a marker prefix.
    fn fail(&mut self, err: StreamError) -> Result<Vec<Event>, StreamError> {
        match self.decoder.take_held() {
            Some(token) => {
                self.pending = Some(err);
                Ok(vec![token])
            }
            None => Err(err),
        }
    }

    async fn abort(&mut self) -> StreamError {
        tracing::debug!("stream cancelled by caller");
        self.finished = true;
        self.source.cancel().await;
        StreamError::Cancelled
    }
}

/// Drive `source` to completion, delivering every event to `sink`.
///
/// Exactly one of `on_done` / `on_error` is called, last. A cancellation
/// that arrives while the stream is live is reported as
/// [`StreamError::Cancelled`]; one that arrives after the terminal callback
/// is never observed.
pub async fn pump<S, K>(
    source: S,
    decoder: StreamDecoder,
    sink: &mut K,
    cancel: &CancellationToken,
) -> Outcome
where
    S: ByteSource,
    K: EventSink + ?Sized,
{
    let mut pump = Pump::new(source, decoder, cancel.clone());
    loop {
        match pump.step().await {
            Ok(events) => {
                for event in events {
                    match event {
                        Event::Token(text) => sink.on_token(&text),
                        Event::Done => {
                            sink.on_done();
                            return Outcome::Completed;
                        }
                        Event::Error(message) => {
                            sink.on_error(StreamError::Protocol(message));
                            return Outcome::Failed;
                        }
                    }
                }
            }
            Err(StreamError::Cancelled) => {
                sink.on_error(StreamError::Cancelled);
                return Outcome::Cancelled;
            }
            Err(err) => {
                sink.on_error(err);
                return Outcome::Failed;
            }
        }
    }
}

/// Lazy counterpart of [`pump()`].
///
/// Yields tokens in order and ends with exactly one [`Event::Done`] or
/// [`Event::Error`]. Read failures and cancellation surface as
/// [`Event::Error`] carrying the error's message.
pub fn events<S: ByteSource>(mut pump: Pump<S>) -> impl Stream<Item = Event> + Send {
    async_stream::stream! {
        loop {
            match pump.step().await {
                Ok(events) => {
                    for event in events {
                        let terminal = event.is_terminal();
                        yield event;
                        if terminal {
                            return;
                        }
                    }
                }
                Err(err) => {
                    yield Event::Error(err.to_string());
                    return;
                }
            }
        }
    }
}
