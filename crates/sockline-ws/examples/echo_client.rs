//! Minimal echo client driving the engine on a 50ms cadence.
//!
//! Usage: `cargo run --example echo_client -- <host> <port> <path>`
//! Defaults to `ws://127.0.0.1:9001/`.

use std::time::{Duration, Instant};

use sockline_ws::{ConnectionEngine, EngineState, EventHandler, EventKind};

struct Printer;

impl EventHandler for Printer {
    fn on_event(&mut self, kind: EventKind, payload: Option<&str>) {
        match payload {
            Some(text) => println!("[{}] {}", kind, text),
            None => println!("[{}]", kind),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port: u16 = args.next().as_deref().unwrap_or("9001").parse()?;
    let path = args.next().unwrap_or_else(|| "/".to_string());

    let mut engine = ConnectionEngine::new();
    engine.set_connection_parameters(&host, port, &path)?;
    engine.set_timeout(10);
    engine.set_ping_interval(20);
    engine.initialize(Box::new(Printer))?;
    engine.connect()?;

    let mut sent = false;
    let started = Instant::now();
    while started.elapsed() < Duration::from_secs(30) {
        engine.service_tick(50).await;

        if engine.state() == EngineState::Connected && !sent {
            let bytes = engine.send_message("hello from sockline", true).await?;
            println!("sent {bytes} bytes");
            sent = true;
        }
        if engine.state() == EngineState::Closed {
            break;
        }
    }

    engine.teardown();
    Ok(())
}
