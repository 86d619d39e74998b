//! Streaming example: print tokens as they arrive.
//!
//! Start a chat backend (default `http://127.0.0.1:10086/chat`) and run:
//!   cargo run --example stream -p chatwire-client -- "Write a haiku about Rust"
//!
//! `CHATWIRE_BASE_URL` / `CHATWIRE_CHAT_PATH` point it elsewhere and
//! `RUST_LOG=chatwire=debug` shows the stream lifecycle. Ctrl+C cancels.

use std::io::Write;

use chatwire::Handlers;
use chatwire_client::{ChatClient, ChatRequest, Outcome};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let message = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if message.is_empty() {
        eprintln!("usage: stream <message>");
        std::process::exit(2);
    }

    let client = ChatClient::from_env()?;
    let mut request = ChatRequest::new(message);
    if let Ok(system) = std::env::var("CHATWIRE_SYSTEM_MESSAGE") {
        request = request.system_message(system);
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let mut handlers = Handlers::new()
        .with_token(|text| {
            print!("{text}");
            let _ = std::io::stdout().flush();
        })
        .with_done(|| println!())
        .with_error(|err| eprintln!("\nStream error: {err}"));

    let outcome = client.stream_chat(&request, &mut handlers, &cancel).await;
    if outcome != Outcome::Completed {
        std::process::exit(1);
    }

    Ok(())
}
