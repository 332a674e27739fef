//! WebSocket endpoint tests against a served application.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite, MaybeTlsStream, WebSocketStream};

use crate::common::spawn_app;
use webchat::infrastructure::relay::MemoryBroker;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Next text frame as JSON.
async fn next_json(client: &mut Client) -> serde_json::Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .expect("socket error");
        if let tungstenite::Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn next_json_until(
    client: &mut Client,
    predicate: impl Fn(&serde_json::Value) -> bool,
) -> serde_json::Value {
    loop {
        let json = next_json(client).await;
        if predicate(&json) {
            return json;
        }
    }
}

#[tokio::test]
async fn test_client_receives_greeting_and_own_messages() {
    let broker = MemoryBroker::new();
    let (addr, _server) = spawn_app(&broker).await;

    let (mut client, _) = connect_async(format!("ws://{addr}/chat/")).await.unwrap();

    let motd = next_json(&mut client).await;
    assert_eq!(motd["sender"], "TestChat");
    assert_eq!(motd["data"], "Welcome!");

    let joined = next_json(&mut client).await;
    assert_eq!(joined["priority"], "muted");
    assert_eq!(joined["channel"], "default");
    let name = joined["data"]
        .as_str()
        .unwrap()
        .trim_end_matches(" joined the channel")
        .to_string();

    client
        .send(tungstenite::Message::text("hello"))
        .await
        .unwrap();

    let echo = next_json_until(&mut client, |m| m["data"] == "hello").await;
    assert_eq!(
        echo,
        serde_json::json!({
            "sender": name,
            "data": "hello",
            "priority": "",
            "channel": "default",
            "media": "",
        })
    );
}

#[tokio::test]
async fn test_both_paths_accept_connections() {
    let broker = MemoryBroker::new();
    let (addr, server) = spawn_app(&broker).await;

    let (mut first, _) = connect_async(format!("ws://{addr}/chat")).await.unwrap();
    let (mut second, _) = connect_async(format!("ws://{addr}/chat/")).await.unwrap();
    // Greeting, then the client's own join notice
    for client in [&mut first, &mut second] {
        next_json(client).await;
        next_json(client).await;
    }

    assert_eq!(server.session_count(), 2);
}

#[tokio::test]
async fn test_closing_socket_leaves_channel() {
    let broker = MemoryBroker::new();
    let (addr, server) = spawn_app(&broker).await;

    let (mut watcher, _) = connect_async(format!("ws://{addr}/chat")).await.unwrap();
    next_json(&mut watcher).await;
    next_json(&mut watcher).await;

    let (mut leaver, _) = connect_async(format!("ws://{addr}/chat")).await.unwrap();
    next_json(&mut leaver).await;
    let joined = next_json_until(&mut watcher, |m| {
        m["data"].as_str().is_some_and(|d| d.ends_with(" joined the channel"))
    })
    .await;
    let name = joined["data"]
        .as_str()
        .unwrap()
        .trim_end_matches(" joined the channel")
        .to_string();

    leaver.close(None).await.unwrap();

    let left = next_json_until(&mut watcher, |m| {
        m["data"].as_str().is_some_and(|d| d.ends_with(" left the channel"))
    })
    .await;
    assert_eq!(left["data"], format!("{name} left the channel"));
    assert_eq!(server.session_count(), 1);
}
