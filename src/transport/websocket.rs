//! WebSocket transport
//!
//! This file implements the WebSocket server that turns protocol frames into
//! hub calls. Responsibilities:
//! - Accept TCP/WebSocket connections
//! - Create a `Client` for each connection and register it with the `Hub`
//! - Feed every text frame through `Hub::handle_text` and dispatch the result
//! - Run the hub's disconnect cleanup exactly once when the socket goes away,
//!   whichever side notices first

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::client::Client;
use crate::hub::Hub;
use crate::transport::message::ServerMessage;
use crate::utils::Result;

/// Binds `addr` and serves until the listener fails.
pub async fn start_websocket_server(addr: String, hub: Arc<Mutex<Hub>>) -> Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("signaling server listening on ws://{}", listener.local_addr()?);
    serve(listener, hub).await
}

/// Accepts connections on an already bound listener.
pub async fn serve(listener: TcpListener, hub: Arc<Mutex<Hub>>) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        spawn(handle_connection(stream, peer, hub.clone()));
    }
}

/// Takes the hub lock. A panic in another connection task must not wedge
/// every other participant, so a poisoned lock is recovered.
pub fn lock(hub: &Mutex<Hub>) -> MutexGuard<'_, Hub> {
    hub.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, hub: Arc<Mutex<Hub>>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, "WebSocket handshake error: {e}");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let client_id = client.id.clone();

    let connected = lock(&hub).connect(client);
    if let Err(e) = connected {
        let refusal = ServerMessage::validation_error(&e);
        if let Ok(json) = serde_json::to_string(&refusal) {
            let _ = ws_sender.send(WsMessage::text(json)).await;
        }
        let _ = ws_sender.close().await;
        return;
    }
    debug!(connection = %client_id, %peer, "accepted");

    let cleanup_called = Arc::new(AtomicBool::new(false));

    let do_cleanup = {
        let hub = hub.clone();
        let client_id = client_id.clone();
        let cleanup_called = cleanup_called.clone();

        move || {
            if !cleanup_called.swap(true, Ordering::SeqCst) {
                let mut hub = lock(&hub);
                let deliveries = hub.disconnect(&client_id);
                hub.dispatch(deliveries);
            }
        }
    };

    {
        let client_id = client_id.clone();
        let do_cleanup = do_cleanup.clone();

        spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = ws_sender.send(msg).await {
                    debug!(connection = %client_id, "failed to send: {e}");
                    break;
                }
            }

            do_cleanup();
            debug!(connection = %client_id, "send loop closed");
        });
    }

    while let Some(frame) = ws_receiver.next().await {
        // the writer already tore this connection down
        if cleanup_called.load(Ordering::SeqCst) {
            break;
        }
        let msg = match frame {
            Ok(msg) => msg,
            Err(e) => {
                debug!(connection = %client_id, "read error: {e}");
                break;
            }
        };
        match msg {
            WsMessage::Text(text) => {
                let mut hub = lock(&hub);
                let deliveries = hub.handle_text(&client_id, text.as_str());
                hub.dispatch(deliveries);
            }
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    do_cleanup();
}
