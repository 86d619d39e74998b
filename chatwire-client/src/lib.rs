#![deny(missing_docs)]
//! HTTP client for sentinel-terminated chat streams.
//!
//! Posts a [`ChatRequest`] to the chat endpoint, classifies non-2xx
//! answers before any body bytes are decoded, and hands the body to
//! [`chatwire`] for incremental decoding.
//!
//! ```no_run
//! use chatwire::Handlers;
//! use chatwire_client::{ChatClient, ChatRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() {
//! let client = ChatClient::new().base_url("http://127.0.0.1:10086");
//! let request = ChatRequest::new("Hello").system_message("You are a helpful assistant.");
//!
//! let mut handlers = Handlers::new()
//!     .with_token(|t| print!("{t}"))
//!     .with_done(|| println!())
//!     .with_error(|e| eprintln!("\nchat failed: {e}"));
//! let _ = client
//!     .stream_chat(&request, &mut handlers, &CancellationToken::new())
//!     .await;
//! # }
//! ```

mod body;
mod client;
mod config;
mod error;
mod types;

pub use body::{ChatStream, ResponseSource};
pub use client::ChatClient;
pub use config::{ClientConfig, ConfigError};
pub use types::ChatRequest;

// Re-export chatwire for convenience
pub use chatwire::{Event, EventSink, Outcome, StreamError};
