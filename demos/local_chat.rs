//! End-to-end demo against the in-process transport
//!
//! Joins the matchmaking queue, gets matched into a room, exchanges a few
//! messages and tears down. The server side is played by a [`LocalServer`],
//! so this runs without any network. Set `RUST_LOG=debug` to watch the
//! lifecycle.
//!
//! ```sh
//! cargo run --example local_chat
//! ```

use std::sync::Arc;
use std::time::Duration;

use matchchat_rs::codec::topics;
use matchchat_rs::transport::LocalTransport;
use matchchat_rs::{
    ClientConfig, ConnectionManager, QueueClient, QueueEvent, RoomChannel, SubscriptionRegistry,
};
use tracing_subscriber::EnvFilter;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::main]
async fn main() -> matchchat_rs::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let (transport, server) = LocalTransport::pair();
    let registry = Arc::new(SubscriptionRegistry::new());
    let config = ClientConfig::new("https://chat.example.com/")
        .auth_token("demo-token")
        .sender_id("demo_user");
    let manager = Arc::new(ConnectionManager::new(
        Arc::new(transport),
        Arc::clone(&registry),
        config,
    ));

    let queue = QueueClient::new(Arc::clone(&manager), Arc::clone(&registry));
    queue.on_queue_event(|event| {
        if let QueueEvent::Matched { room_id } = event {
            tracing::info!(room = %room_id, "Matched into room");
        }
    });

    queue.join(7, "demo").await?;
    settle().await;

    // The fake server answers with a status snapshot, then a match.
    server.push(
        topics::QUEUE_TOPIC,
        r#"{"type":"QUEUE_STATUS","members":[{"memberId":7,"nickname":"demo"}]}"#,
    );
    server.push(topics::QUEUE_TOPIC, r#"{"type":"MATCHED","roomId":"42"}"#);
    settle().await;
    tracing::info!(waiting = queue.members().len(), "Queue status mirrored");

    let room = RoomChannel::new(Arc::clone(&manager), Arc::clone(&registry));
    room.bind("42").await?;
    room.send_message("hello from the demo")?;
    settle().await;

    server.push(
        "/sub/chat/room/42",
        r#"{"type":"message","id":"m1","senderId":"peer","content":"welcome"}"#,
    );
    settle().await;

    for message in room.messages() {
        tracing::info!(
            sender = message.sender_id.as_deref().unwrap_or("?"),
            content = message.content.as_deref().unwrap_or(""),
            "Room message"
        );
    }

    room.unbind();
    queue.close();
    manager.disconnect();
    settle().await;

    tracing::info!(frames = server.sent().len(), "Demo finished");
    Ok(())
}
