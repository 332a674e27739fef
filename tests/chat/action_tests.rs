//! Built-in and configured actions.

use pretty_assertions::assert_eq;

use crate::common::{test_settings, TestClient, TestCluster};
use webchat::domain::{Message, Priority};

const ACTIONS: &str = r#"
[[chat.actions]]
tag = "rules"
type = "private"
data = "Be excellent to each other."

[[chat.actions]]
tag = "party"
type = "broadcast"
media = "image"
data = "https://example.com/party.gif"

[[chat.actions.middleware]]
type = "limit"
interval = 60
message = "The party is over."
"#;

#[tokio::test]
async fn test_help_lists_actions_privately() {
    let cluster = TestCluster::new();
    let server = cluster.server("one", &test_settings(ACTIONS)).await;
    let mut alice = TestClient::connect_quietly(&server, "Alice").await;
    let mut bob = TestClient::connect_quietly(&server, "Bob").await;
    alice
        .recv_until(|m| m.data == "Bob joined the channel")
        .await;

    alice.say("!help");

    let help = alice.recv().await;
    assert_eq!(
        help,
        Message::notice(
            "TestChat",
            "Available actions are !channels, !help, !party, !rules, !users."
        )
        .with_channel("default")
    );
    assert_eq!(help.priority, Priority::Low);
    bob.assert_quiet().await;
}

#[tokio::test]
async fn test_private_action_replies_to_invoker_only() {
    let cluster = TestCluster::new();
    let server = cluster.server("one", &test_settings(ACTIONS)).await;
    let mut alice = TestClient::connect_quietly(&server, "Alice").await;
    let mut bob = TestClient::connect_quietly(&server, "Bob").await;
    alice
        .recv_until(|m| m.data == "Bob joined the channel")
        .await;

    bob.say("!rules please");

    assert_eq!(
        bob.recv().await,
        Message::chat("TestChat", "Be excellent to each other.").with_channel("default")
    );
    alice.assert_quiet().await;
}

#[tokio::test]
async fn test_broadcast_action_is_rate_limited_across_users() {
    let cluster = TestCluster::new();
    let server = cluster.server("one", &test_settings(ACTIONS)).await;
    let mut alice = TestClient::connect_quietly(&server, "Alice").await;
    let mut bob = TestClient::connect_quietly(&server, "Bob").await;
    alice
        .recv_until(|m| m.data == "Bob joined the channel")
        .await;

    alice.say("!party");

    let party = Message::chat("Alice", "https://example.com/party.gif")
        .with_media("image")
        .with_channel("default");
    assert_eq!(alice.recv().await, party);
    assert_eq!(bob.recv().await, party);

    // One shared window: Bob is throttled by Alice's use
    bob.say("!party");

    assert_eq!(
        bob.recv().await,
        Message::notice("TestChat", "The party is over.").with_channel("default")
    );
    alice.assert_quiet().await;
}

#[tokio::test]
async fn test_users_and_channels() {
    let cluster = TestCluster::new();
    let settings = test_settings("[chat]\nchannels = [\"default\", \"random\"]");
    let server = cluster.server("one", &settings).await;
    let mut bob = TestClient::connect_quietly(&server, "Bob").await;
    let _alice = TestClient::connect_quietly(&server, "Alice").await;
    bob.recv_until(|m| m.data == "Alice joined the channel")
        .await;

    bob.say("!users");
    assert_eq!(bob.recv().await.data, "Users in default: Alice, Bob.");

    bob.say("!channels");
    assert_eq!(
        bob.recv().await.data,
        "Channels are default (active), random."
    );
}

#[tokio::test]
async fn test_unknown_command_is_plain_text() {
    let cluster = TestCluster::new();
    let server = cluster.server("one", &test_settings("")).await;
    let mut alice = TestClient::connect_quietly(&server, "Alice").await;

    alice.say("!dance now");

    assert_eq!(
        alice.recv().await,
        Message::chat("Alice", "!dance now").with_channel("default")
    );
}
