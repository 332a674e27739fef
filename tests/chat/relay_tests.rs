//! Traffic between instances sharing one broker.

use std::time::Duration;

use pretty_assertions::assert_eq;

use crate::common::{test_settings, TestClient, TestCluster};
use webchat::application::Server;
use webchat::domain::Message;

#[tokio::test]
async fn test_message_crosses_instances() {
    let cluster = TestCluster::new();
    let settings = test_settings("");
    let east = cluster.server("east", &settings).await;
    let west = cluster.server("west", &settings).await;

    let mut alice = TestClient::connect_quietly(&east, "Alice").await;
    let mut bob = TestClient::connect_quietly(&west, "Bob").await;
    alice
        .recv_until(|m| m.data == "Bob joined the channel")
        .await;

    alice.say("hello west");

    let expected = Message::chat("Alice", "hello west").with_channel("default");
    assert_eq!(bob.recv().await, expected);
    assert_eq!(alice.recv().await, expected);
    assert_eq!(east.session_count(), 1);
    assert_eq!(west.session_count(), 1);
}

#[tokio::test]
async fn test_channel_unknown_to_instance_is_dropped() {
    let cluster = TestCluster::new();
    let east = Server::builder()
        .name("TestChat")
        .text_interval(Duration::ZERO)
        .main_channel("secret")
        .build();
    cluster.attach("east", &east).await;
    let west = cluster.server("west", &test_settings("")).await;

    let mut bob = TestClient::connect_quietly(&west, "Bob").await;
    let mut alice = TestClient::connect_quietly(&east, "Alice").await;

    alice.say("psst");

    assert_eq!(
        alice.recv().await,
        Message::chat("Alice", "psst").with_channel("secret")
    );
    bob.assert_quiet().await;
    assert!(west.channel("secret").is_none());
}

#[tokio::test]
async fn test_consumer_resubscribes_after_broken_stream() {
    let cluster = TestCluster::new();
    let server = cluster.server("one", &test_settings("")).await;
    let mut alice = TestClient::connect_quietly(&server, "Alice").await;

    cluster.broker.sever();
    tokio::time::timeout(Duration::from_secs(2), async {
        while cluster.broker.subscriber_count() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("consumer must resubscribe");

    alice.say("back online");

    assert_eq!(alice.recv().await.data, "back online");
}
