//! Chat client struct and builder.

use chatwire::{Event, EventSink, Outcome, StreamError};
use tokio_util::sync::CancellationToken;

use crate::body::ChatStream;
use crate::config::{ClientConfig, ConfigError};
use crate::error::classify_failure;
use crate::types::ChatRequest;

/// Client for a sentinel-terminated streaming chat endpoint.
///
/// # Example
///
/// ```no_run
/// use chatwire_client::ChatClient;
///
/// let client = ChatClient::new()
///     .base_url("http://127.0.0.1:10086")
///     .chat_path("/chat");
/// ```
pub struct ChatClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl ChatClient {
    /// Create a client for the default local backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from a validated configuration.
    pub fn from_config(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Create a client configured from the environment; see
    /// [`ClientConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_config(ClientConfig::from_env()?)
    }

    /// Override the backend address.
    ///
    /// Useful for testing with a local mock server. The value is checked
    /// when a request is opened.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Override the chat endpoint path. Checked like [`base_url`](Self::base_url).
    #[must_use]
    pub fn chat_path(mut self, path: impl Into<String>) -> Self {
        self.config.chat_path = path.into();
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `request` and return the accepted body, undecoded.
    ///
    /// Fails with [`StreamError::InvalidRequest`] if the endpoint
    /// configuration is invalid, with [`StreamError::Transport`] if the
    /// request cannot be sent and with [`StreamError::Response`] on a
    /// non-2xx status.
    pub async fn open(&self, request: &ChatRequest) -> Result<ChatStream, StreamError> {
        self.config
            .validate()
            .map_err(|e| StreamError::InvalidRequest(e.to_string()))?;
        let url = self.config.chat_url();
        tracing::debug!(url = %url, "sending streaming chat request");

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&request.to_wire())
            .send()
            .await
            .map_err(StreamError::network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok();
            let err = classify_failure(status.as_u16(), body.as_deref());
            tracing::warn!(status = status.as_u16(), error = %err, "chat request rejected");
            return Err(err);
        }

        Ok(ChatStream::new(response))
    }

    /// Send `request` and stream the answer into `sink`.
    ///
    /// Every failure, including a rejected request, ends in exactly one
    /// `on_error` call; success ends in exactly one `on_done` call.
    pub async fn stream_chat<K>(
        &self,
        request: &ChatRequest,
        sink: &mut K,
        cancel: &CancellationToken,
    ) -> Outcome
    where
        K: EventSink + ?Sized,
    {
        let opened = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(StreamError::Cancelled),
            opened = self.open(request) => opened,
        };

        match opened {
            Ok(stream) => {
                let (source, decoder) = stream.into_parts();
                chatwire::pump(source, decoder, sink, cancel).await
            }
            Err(StreamError::Cancelled) => {
                sink.on_error(StreamError::Cancelled);
                Outcome::Cancelled
            }
            Err(err) => {
                sink.on_error(err);
                Outcome::Failed
            }
        }
    }

    /// Send `request` and read the whole answer before returning it.
    ///
    /// For callers that cannot consume a stream. `[DONE]` and anything
    /// after it are dropped; `[ERROR]` becomes [`StreamError::Protocol`].
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, StreamError> {
        let (source, decoder) = self.open(request).await?.into_parts();
        let body = source.read_to_end().await?;
        tracing::debug!(len = body.len(), "buffered chat body received");

        let mut answer = String::new();
        for event in decoder.decode_complete(&body) {
            match event {
                Event::Token(text) => answer.push_str(&text),
                Event::Done => break,
                Event::Error(message) => return Err(StreamError::Protocol(message)),
            }
        }
        Ok(answer)
    }
}

impl Default for ChatClient {
    fn default() -> Self {
        Self::new()
    }
}
