//! Response body as a [`ByteSource`].

use std::future::Future;

use bytes::Bytes;
use chatwire::{ByteSource, Event, Pump, StreamDecoder, StreamError};
use futures_util::Stream;
use reqwest::Response;
use tokio_util::sync::CancellationToken;

/// Reads a successful response body chunk by chunk.
///
/// Cancelling drops the response, which closes the connection.
pub struct ResponseSource {
    response: Option<Response>,
}

impl ResponseSource {
    /// Wrap an already-validated response.
    pub fn new(response: Response) -> Self {
        Self {
            response: Some(response),
        }
    }

    /// Read the whole remaining body at once.
    pub async fn read_to_end(mut self) -> Result<Bytes, StreamError> {
        match self.response.take() {
            Some(response) => response.bytes().await.map_err(StreamError::read_failed),
            None => Ok(Bytes::new()),
        }
    }
}

impl ByteSource for ResponseSource {
    fn read_next(&mut self) -> impl Future<Output = Result<Option<Bytes>, StreamError>> + Send {
        async move {
            let Some(response) = self.response.as_mut() else {
                return Ok(None);
            };
            match response.chunk().await {
                Ok(Some(chunk)) => Ok(Some(chunk)),
                Ok(None) => {
                    self.response = None;
                    Ok(None)
                }
                Err(err) => {
                    self.response = None;
                    Err(StreamError::read_failed(err))
                }
            }
        }
    }

    fn cancel(&mut self) -> impl Future<Output = ()> + Send {
        if self.response.take().is_some() {
            tracing::debug!("response body closed early");
        }
        std::future::ready(())
    }
}

/// An accepted chat response, ready to decode.
///
/// The decoder uses the charset named by the response's `Content-Type`,
/// falling back to UTF-8.
pub struct ChatStream {
    source: ResponseSource,
    decoder: StreamDecoder,
}

impl ChatStream {
    pub(crate) fn new(response: Response) -> Self {
        let decoder = match charset(&response) {
            Some(label) => StreamDecoder::for_label(&label),
            None => StreamDecoder::new(),
        };
        Self {
            source: ResponseSource::new(response),
            decoder,
        }
    }

    /// Name of the character encoding the body is decoded with.
    pub fn encoding_name(&self) -> &'static str {
        self.decoder.encoding().name()
    }

    /// The body and its decoder, for driving with [`chatwire::pump()`].
    pub fn into_parts(self) -> (ResponseSource, StreamDecoder) {
        (self.source, self.decoder)
    }

    /// Step-by-step driver over the body.
    pub fn into_pump(self, cancel: CancellationToken) -> Pump<ResponseSource> {
        Pump::new(self.source, self.decoder, cancel)
    }

    /// Lazy event stream over the body; see [`chatwire::events()`].
    pub fn into_events(self, cancel: CancellationToken) -> impl Stream<Item = Event> + Send {
        chatwire::events(self.into_pump(cancel))
    }
}

/// The `charset` parameter of the `Content-Type` header.
fn charset(response: &Response) -> Option<String> {
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)?
        .to_str()
        .ok()?;
    charset_param(content_type)
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_param_parsing() {
        assert_eq!(
            charset_param("text/event-stream; charset=utf-8").as_deref(),
            Some("utf-8")
        );
        assert_eq!(
            charset_param("text/plain;Charset=\"GBK\"").as_deref(),
            Some("GBK")
        );
        assert_eq!(
            charset_param("text/plain; format=flowed; charset=big5").as_deref(),
            Some("big5")
        );
        assert_eq!(charset_param("text/event-stream"), None);
        assert_eq!(charset_param("text/plain; charset="), None);
    }
}
