use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex, RwLock};
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

use crate::error::FrameError;
use crate::messages::ClientEvent;
use crate::relay::{Outbound, Relay};

type SharedRelay = Arc<Mutex<Relay>>;
type Connections = Arc<RwLock<HashMap<String, mpsc::UnboundedSender<Message>>>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub users: usize,
    pub messages: usize,
    pub uptime: f64,
}

/// Owns the relay state and the outbound channel of every live socket.
///
/// All relay mutations and the fan-out they produce happen under one lock, so
/// events are applied one at a time and every client sees them in the same order.
#[derive(Clone)]
pub struct Server {
    relay: SharedRelay,
    connections: Connections,
    started_at: Instant,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    pub fn new() -> Self {
        Self::with_relay(Relay::new())
    }

    pub fn with_relay(relay: Relay) -> Self {
        Server {
            relay: Arc::new(Mutex::new(relay)),
            connections: Arc::new(RwLock::new(HashMap::new())),
            started_at: Instant::now(),
        }
    }

    pub async fn health(&self) -> Health {
        let stats = self.relay.lock().await.stats();
        Health {
            status: "ok".to_string(),
            users: stats.users,
            messages: stats.messages,
            uptime: self.started_at.elapsed().as_secs_f64(),
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn handle_connection(&self, ws: WebSocket) {
        let conn_id = Uuid::new_v4().to_string();
        let (mut ws_tx, mut ws_rx) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel();

        {
            let mut connections = self.connections.write().await;
            connections.insert(conn_id.clone(), tx);
        }
        debug!("Connection opened: {}", conn_id);

        let relay = self.relay.clone();
        let connections = self.connections.clone();
        let reader_id = conn_id.clone();

        tokio::spawn(async move {
            while let Some(result) = ws_rx.next().await {
                match result {
                    Ok(msg) => match Self::decode(&msg) {
                        Ok(Some(event)) => {
                            Self::handle_client_event(event, &reader_id, &relay, &connections)
                                .await;
                        }
                        Ok(None) => {
                            if msg.is_close() {
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping frame from {}: {}", reader_id, e),
                    },
                    Err(e) => {
                        warn!("WebSocket error on {}: {}", reader_id, e);
                        break;
                    }
                }
            }

            Self::handle_disconnect(&reader_id, &relay, &connections).await;
        });

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = ws_tx.send(message).await {
                    warn!("Failed to send to {}: {}", conn_id, e);
                    break;
                }
            }
        });
    }

    /// `Ok(None)` for control frames (ping, pong, close).
    fn decode(msg: &Message) -> Result<Option<ClientEvent>, FrameError> {
        if let Ok(text) = msg.to_str() {
            return ClientEvent::from_frame(text).map(Some);
        }
        if msg.is_binary() {
            return Err(FrameError::Binary);
        }
        Ok(None)
    }

    async fn handle_client_event(
        event: ClientEvent,
        conn_id: &str,
        relay: &SharedRelay,
        connections: &Connections,
    ) {
        let mut relay = relay.lock().await;
        let outbound = relay.handle(conn_id, event);
        Self::deliver(outbound, connections).await;
    }

    async fn handle_disconnect(conn_id: &str, relay: &SharedRelay, connections: &Connections) {
        let mut relay = relay.lock().await;
        {
            let mut connections_lock = connections.write().await;
            connections_lock.remove(conn_id);
        }
        let outbound = relay.disconnect(conn_id);
        Self::deliver(outbound, connections).await;
        debug!("Connection closed: {}", conn_id);
    }

    async fn deliver(outbound: Vec<Outbound>, connections: &Connections) {
        if outbound.is_empty() {
            return;
        }
        let connections_lock = connections.read().await;
        for Outbound { audience, event } in outbound {
            let frame = match event.to_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Failed to encode outbound event: {}", e);
                    continue;
                }
            };
            for (conn_id, sender) in connections_lock.iter() {
                if !audience.includes(conn_id) {
                    continue;
                }
                if sender.send(Message::text(frame.clone())).is_err() {
                    debug!("Connection {} already closed, dropping event", conn_id);
                }
            }
        }
    }
}
