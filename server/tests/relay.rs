use chat_server::{AppState, app};
use chat_shared::ChatMessage;
use futures_util::{SinkExt, StreamExt};
use std::{net::SocketAddr, path::Path, sync::Arc};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Duration, sleep, timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> (SocketAddr, Arc<AppState>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let addr = listener.local_addr().expect("No local addr");
    let state = Arc::new(AppState::default());
    let router = app(Arc::clone(&state), Path::new("./does-not-exist"));

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server stopped");
    });

    (addr, state)
}

async fn join(addr: SocketAddr) -> Client {
    let (ws_stream, _) = connect_async(format!("ws://{}/chat", addr))
        .await
        .expect("Failed to connect to the chat socket");
    ws_stream
}

async fn say(client: &mut Client, nick: &str, message: &str) {
    let frame = ChatMessage::new(nick, message).to_frame().unwrap();
    client.send(Message::Text(frame)).await.expect("Failed to send");
}

async fn next_chat(client: &mut Client) -> ChatMessage {
    loop {
        let frame = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Stream ended")
            .expect("WebSocket error");
        if let Message::Text(text) = frame {
            return ChatMessage::from_frame(&text).expect("Server sent a malformed frame");
        }
    }
}

#[tokio::test]
async fn message_reaches_every_client_including_sender() {
    let (addr, _state) = start_server().await;
    let mut alice = join(addr).await;
    let mut bob = join(addr).await;

    say(&mut alice, "alice", "hello").await;

    assert_eq!(next_chat(&mut alice).await, ChatMessage::new("alice", "hello"));
    assert_eq!(next_chat(&mut bob).await, ChatMessage::new("alice", "hello"));
}

#[tokio::test]
async fn messages_keep_arrival_order() {
    let (addr, _state) = start_server().await;
    let mut alice = join(addr).await;
    let mut carol = join(addr).await;

    for i in 0..10 {
        say(&mut alice, "alice", &format!("msg {}", i)).await;
    }

    for i in 0..10 {
        assert_eq!(next_chat(&mut carol).await.message, format!("msg {}", i));
    }
}

#[tokio::test]
async fn malformed_frame_is_skipped_and_connection_survives() {
    let (addr, _state) = start_server().await;
    let mut alice = join(addr).await;
    let mut bob = join(addr).await;

    alice.send(Message::Text("not json".to_string())).await.unwrap();
    alice.send(Message::Text(r#"{"nick":"alice"}"#.to_string())).await.unwrap();
    say(&mut alice, "alice", "still here").await;

    assert_eq!(next_chat(&mut bob).await, ChatMessage::new("alice", "still here"));
}

#[tokio::test]
async fn closed_client_is_dropped_from_registry() {
    let (addr, state) = start_server().await;
    let mut alice = join(addr).await;
    let mut bob = join(addr).await;

    // Round-trip a message so both sockets are known to be registered.
    say(&mut alice, "alice", "ping").await;
    next_chat(&mut alice).await;
    next_chat(&mut bob).await;
    assert_eq!(state.client_count().await, 2);

    bob.close(None).await.unwrap();

    let mut remaining = state.client_count().await;
    for _ in 0..50 {
        if remaining == 1 {
            break;
        }
        sleep(Duration::from_millis(100)).await;
        remaining = state.client_count().await;
    }
    assert_eq!(remaining, 1);

    say(&mut alice, "alice", "anyone?").await;
    assert_eq!(next_chat(&mut alice).await, ChatMessage::new("alice", "anyone?"));
}
