pub mod config;

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use chat_shared::{CHAT_PATH, ChatMessage};
use std::{collections::HashSet, path::Path, sync::Arc};
use tokio::sync::{Mutex, broadcast};
use tower_http::{services::ServeDir, trace::TraceLayer};
use uuid::Uuid;

pub const BROADCAST_CAPACITY: usize = 100;

/// Relay state: who is connected and the fan-out channel every inbound
/// message is pushed through.
pub struct AppState
{
    clients: Mutex<HashSet<Uuid>>,
    broadcast_tx: broadcast::Sender<ChatMessage>,
}

impl Default for AppState
{
    fn default() -> Self
    {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self
        {
            clients: Mutex::new(HashSet::new()),
            broadcast_tx,
        }
    }
}

impl AppState
{
    pub async fn client_count(&self) -> usize
    {
        self.clients.lock().await.len()
    }
}

pub fn app(state: Arc<AppState>, static_dir: &Path) -> Router
{
    let client_serve_dir = ServeDir::new(static_dir)
        .append_index_html_on_directories(true);

    Router::new()
        .route(CHAT_PATH, get(ws_handler))
        .fallback_service(client_serve_dir)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse
{
    // Subscribe before the handshake completes so nothing sent after it is missed.
    let broadcast_rx = state.broadcast_tx.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, state, broadcast_rx))
}

async fn send_chat(socket: &mut WebSocket, msg: &ChatMessage) -> anyhow::Result<()>
{
    let frame = msg.to_frame()?;
    socket.send(Message::Text(frame)).await?;
    Ok(())
}

async fn handle_socket(
    mut socket: WebSocket,
    state: Arc<AppState>,
    mut broadcast_rx: broadcast::Receiver<ChatMessage>,
)
{
    let client_id = Uuid::new_v4();
    {
        let mut clients_guard = state.clients.lock().await;
        clients_guard.insert(client_id);
        tracing::info!("[Client {}] Subscribed. Total clients: {}", client_id, clients_guard.len());
    }

    loop
    {
        tokio::select!
        {
            msg_option = socket.recv() =>
            {
                match msg_option
                {
                    Some(Ok(Message::Text(text))) =>
                    {
                        match ChatMessage::from_frame(&text)
                        {
                            Ok(msg) =>
                            {
                                tracing::debug!("[Client {}] Received {}", client_id, msg);
                                if let Err(e) = state.broadcast_tx.send(msg)
                                {
                                    tracing::warn!("[Server] Broadcast error: {}", e);
                                }
                            }
                            Err(e) =>
                            {
                                tracing::warn!("[Client {}] Failed to read message: {}, raw: {}", client_id, e, text);
                            }
                        }
                    }
                    Some(Ok(Message::Binary(bin))) =>
                    {
                        tracing::debug!("[Client {}] Ignoring binary frame (len: {})", client_id, bin.len());
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) =>
                    {
                        tracing::trace!("[Client {}] WebSocket ping/pong", client_id);
                    }
                    Some(Ok(Message::Close(_))) =>
                    {
                        tracing::info!("[Client {}] Sent close frame.", client_id);
                        break;
                    }
                    Some(Err(e)) =>
                    {
                        tracing::error!("[Client {}] WebSocket error: {}", client_id, e);
                        break;
                    }
                    None =>
                    {
                        tracing::info!("[Client {}] Connection closed by peer.", client_id);
                        break;
                    }
                }
            }

            recv_result = broadcast_rx.recv() =>
            {
                match recv_result
                {
                    Ok(msg) =>
                    {
                        if let Err(e) = send_chat(&mut socket, &msg).await
                        {
                            tracing::warn!("[Client {}] Failed to send message: {}. Disconnecting.", client_id, e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) =>
                    {
                        tracing::warn!("[Client {}] Lagging behind, skipped {} messages.", client_id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) =>
                    {
                        tracing::warn!("[Client {}] Broadcast channel closed.", client_id);
                        break;
                    }
                }
            }
        }
    }

    {
        let mut clients_guard = state.clients.lock().await;
        clients_guard.remove(&client_id);
        tracing::info!("[Client {}] Unsubscribed. Total clients: {}", client_id, clients_guard.len());
    }
}
