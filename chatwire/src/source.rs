//! Byte sources the driving loop pulls from.
//!
//! The [`ByteSource`] trait uses RPITIT (return-position `impl Trait` in
//! traits) and is intentionally NOT object-safe. Sources are consumed by the
//! generic [`Pump`](crate::Pump).

use std::fmt::Display;
use std::future::Future;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use crate::error::StreamError;

/// An already-established response body, read one chunk at a time.
pub trait ByteSource: Send {
    /// Read the next chunk. `Ok(None)` is natural end of stream.
    ///
    /// Chunks may be empty and may split characters or markers.
    fn read_next(&mut self) -> impl Future<Output = Result<Option<Bytes>, StreamError>> + Send;

    /// Stop the transport early.
    ///
    /// Must be safe to call more than once and after end of stream.
    fn cancel(&mut self) -> impl Future<Output = ()> + Send;
}

/// Adapts any fallible byte [`Stream`], e.g. `reqwest::Response::bytes_stream`.
///
/// Cancelling drops the inner stream, which closes the connection.
pub struct StreamSource<S> {
    inner: Option<S>,
}

impl<S> StreamSource<S> {
    /// Wrap a byte stream.
    pub fn new(stream: S) -> Self {
        Self {
            inner: Some(stream),
        }
    }

    /// Whether the stream has ended or was cancelled.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl<S, E> ByteSource for StreamSource<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin + Send,
    E: Display,
{
    fn read_next(&mut self) -> impl Future<Output = Result<Option<Bytes>, StreamError>> + Send {
        async move {
            let Some(stream) = self.inner.as_mut() else {
                return Ok(None);
            };
            match stream.next().await {
                Some(Ok(chunk)) => Ok(Some(chunk)),
                Some(Err(err)) => {
                    self.inner = None;
                    Err(StreamError::read_failed(err))
                }
                None => {
                    self.inner = None;
                    Ok(None)
                }
            }
        }
    }

    fn cancel(&mut self) -> impl Future<Output = ()> + Send {
        if self.inner.take().is_some() {
            tracing::debug!("byte stream cancelled");
        }
        std::future::ready(())
    }
}
