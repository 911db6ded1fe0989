//! Follow a fine-tune job's event stream.
//!
//! Prints every event until the job finishes, Ctrl-C is pressed, or the
//! subscription's one-hour deadline passes.
//!
//! Run with: `OPENAI_API_KEY=sk-... cargo run -p jobstream --example follow_job -- ft-abc123`
//!
//! Set `RUST_LOG=jobstream=debug` to watch reconnects.

use futures_util::StreamExt;
use jobstream::{EventClient, StreamMessage};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct FineTuneEvent {
    #[serde(default)]
    level: String,
    message: String,
    created_at: i64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let job_id = std::env::args()
        .nth(1)
        .ok_or("usage: follow_job <fine-tune id>")?;
    let token = std::env::var("OPENAI_API_KEY")?;

    let client = EventClient::openai(token)?;
    let cancel = CancellationToken::new();
    let mut stream = client.fine_tune_events(&job_id)?.stream(cancel.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    while let Some(message) = stream.next().await {
        match message {
            StreamMessage::Event(event) => match event.json::<FineTuneEvent>() {
                Ok(ev) => println!("[{}] {:>5} {}", ev.created_at, ev.level, ev.message),
                Err(_) => println!("{event}"),
            },
            StreamMessage::Error(err) => eprintln!("stream error: {err}"),
        }
    }

    Ok(())
}
