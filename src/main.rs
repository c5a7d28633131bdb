//! CLI for PeerLink
//!
//! Subcommands:
//! - `server`: run the matchmaking and signaling server
//! - `client`: join a topic and print what the server says (smoke test)

use std::sync::{Arc, Mutex};

use clap::Parser;
use peerlink::Hub;
use peerlink::config::{Settings, load_config, load_config_from};
use peerlink::transport::start_websocket_server;
use peerlink::utils::logging;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "peerlink", version, about)]
enum Command {
    /// Start the WebSocket server
    Server {
        /// Configuration file; defaults to config/default.* when present
        #[arg(long, short)]
        config: Option<String>,
    },
    /// Join a topic, print server messages, leave once matched
    Client {
        /// WebSocket server URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8080")]
        url: String,
        /// Topic to queue under
        #[arg(long, default_value = "chat")]
        topic: String,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    match Command::parse() {
        Command::Server { config } => {
            let loaded = match &config {
                Some(path) => load_config_from(path),
                None => load_config(),
            };
            let settings = match loaded {
                Ok(settings) => settings,
                Err(e) => {
                    logging::init("info");
                    error!("Failed to load configuration: {e}");
                    std::process::exit(1);
                }
            };
            logging::init(&settings.logging.level);
            if let Err(e) = run_server(settings).await {
                error!("Server failed: {e}");
                std::process::exit(1);
            }
        }
        Command::Client { url, topic } => {
            logging::init("info");
            if let Err(e) = run_client(&url, &topic).await {
                error!("Client failed: {e}");
                std::process::exit(1);
            }
        }
    }
}

async fn run_server(settings: Settings) -> peerlink::utils::Result<()> {
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let hub = Arc::new(Mutex::new(Hub::new(&settings.matchmaker)));

    tokio::select! {
        res = start_websocket_server(addr, hub) => res,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
            Ok(())
        }
    }
}

async fn run_client(url: &str, topic: &str) -> Result<(), Box<dyn std::error::Error>> {
    use futures_util::{SinkExt, StreamExt};
    use peerlink::transport::{ClientMessage, ServerMessage};
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let (mut ws_stream, _response) = connect_async(url).await?;

    let join = ClientMessage::JoinQueue {
        topic: Some(topic.to_string()),
    };
    ws_stream
        .send(WsMessage::text(serde_json::to_string(&join)?))
        .await?;

    while let Some(frame) = ws_stream.next().await {
        let WsMessage::Text(text) = frame? else {
            continue;
        };
        println!("{text}");
        match serde_json::from_str::<ServerMessage>(text.as_str())? {
            ServerMessage::Matched { .. } => {
                let leave = serde_json::to_string(&ClientMessage::LeaveQueue)?;
                ws_stream.send(WsMessage::text(leave)).await?;
            }
            ServerMessage::LeftQueue => break,
            _ => {}
        }
    }

    ws_stream.close(None).await?;
    Ok(())
}
