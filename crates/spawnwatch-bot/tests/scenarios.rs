//! End-to-end scenarios for spawnwatch-bot: chat messages in, replies and
//! board messages out, through the local gateway.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio_test::assert_ok;

use spawnwatch_bot::gateway::local::BOT_USER_ID;
use spawnwatch_bot::gateway::{LocalGateway, MessagingGateway};
use spawnwatch_bot::protocol::Dispatcher;
use spawnwatch_bot::services::Services;
use spawnwatch_bot::session::{GroupRegistry, SharedSession};
use spawnwatch_bot::transport::framing;
use spawnwatch_bot::types::{Author, Content, InboundMessage};

const GROUP: u64 = 7;
const COMMAND_CHANNEL: u64 = 11;
const BOARD_CHANNEL: u64 = 20;

// ─────────────────────── helpers ───────────────────────

fn start_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-01T06:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// A dispatcher over a temp state file and a gateway with a frozen clock.
fn bot(dir: &tempfile::TempDir) -> (Dispatcher, Arc<LocalGateway>) {
    let gateway = Arc::new(LocalGateway::new());
    gateway.set_time(start_time());
    let registry = GroupRegistry::open(dir.path().join("state.json"), 0.0).unwrap();
    let services = Services::new(gateway.clone(), Arc::new(registry));
    (Dispatcher::new(services), gateway)
}

fn manager() -> Author {
    Author {
        id: 1,
        name: "keele".to_string(),
        manage_group: true,
    }
}

fn member() -> Author {
    Author {
        id: 2,
        name: "hixxy".to_string(),
        manage_group: false,
    }
}

/// Post `content` as `author` in the command channel; returns the replies.
async fn say(
    dispatcher: &Dispatcher,
    gateway: &LocalGateway,
    author: Author,
    content: &str,
) -> Vec<String> {
    let message = InboundMessage {
        group: GROUP,
        channel: COMMAND_CHANNEL,
        author,
        content: content.to_string(),
        timestamp: gateway.current_timestamp(),
    };
    gateway.record_inbound(&message);
    assert_ok!(dispatcher.handle_message(&message).await)
}

/// Post and expect exactly one reply.
async fn say_one(
    dispatcher: &Dispatcher,
    gateway: &LocalGateway,
    author: Author,
    content: &str,
) -> String {
    let mut replies = say(dispatcher, gateway, author, content).await;
    assert_eq!(replies.len(), 1, "expected one reply to {content:?}, got {replies:?}");
    replies.remove(0)
}

/// Point the group's board at the board channel.
async fn with_board(dispatcher: &Dispatcher, gateway: &LocalGateway) {
    let reply = say_one(dispatcher, gateway, manager(), "!track-channel <#20>").await;
    assert_eq!(reply, "Tracking channel now set to <#20>");
}

fn group(dispatcher: &Dispatcher) -> SharedSession {
    dispatcher.services().registry.get(GROUP).unwrap().expect("group exists")
}

/// Everything on the board, as JSON text for substring checks.
fn board_text(gateway: &LocalGateway) -> String {
    gateway
        .messages(BOARD_CHANNEL)
        .iter()
        .map(|(_, content)| serde_json::to_string(content).unwrap())
        .collect::<Vec<_>>()
        .join("\n")
}

// ═══════════════════════════════════════════════════════
// ROUTING
// ═══════════════════════════════════════════════════════

/// Test 1: chatter, unknown commands and the bot's own posts get no reply.
#[tokio::test]
async fn test_01_ignores_non_commands() {
    let dir = tempfile::tempdir().unwrap();
    let (dispatcher, gateway) = bot(&dir);

    assert!(say(&dispatcher, &gateway, member(), "hello there").await.is_empty());
    assert!(say(&dispatcher, &gateway, member(), "!dance").await.is_empty());
    assert!(say(&dispatcher, &gateway, member(), "3").await.is_empty());
    let bot_author = Author {
        id: BOT_USER_ID,
        name: "spawnwatch".to_string(),
        manage_group: false,
    };
    assert!(say(&dispatcher, &gateway, bot_author, "!t-help").await.is_empty());
}

/// Test 1b: a stray selection in a group the bot never saw creates nothing.
#[tokio::test]
async fn test_01b_selection_in_unknown_group() {
    let dir = tempfile::tempdir().unwrap();
    let (dispatcher, gateway) = bot(&dir);

    assert!(say(&dispatcher, &gateway, member(), "5").await.is_empty());
    assert!(say(&dispatcher, &gateway, member(), "1,3-4").await.is_empty());
    let registry = &dispatcher.services().registry;
    assert!(registry.get(GROUP).unwrap().is_none());
    assert_eq!(registry.count(), 0);
    assert!(!dir.path().join("state.json").exists());
}

/// Test 2: tracking needs a board channel.
#[tokio::test]
async fn test_02_track_requires_channel() {
    let dir = tempfile::tempdir().unwrap();
    let (dispatcher, gateway) = bot(&dir);

    let reply = say_one(&dispatcher, &gateway, member(), "!t amon").await;
    assert_eq!(
        reply,
        "Failed to track boss: Tracking channel not configured. Use !track-channel to set the tracking channel."
    );
}

/// Test 3: a sighting is confirmed and shows up on the board.
#[tokio::test]
async fn test_03_track_posts_board() {
    let dir = tempfile::tempdir().unwrap();
    let (dispatcher, gateway) = bot(&dir);
    with_board(&dispatcher, &gateway).await;

    let reply = say_one(&dispatcher, &gateway, member(), "!t amon 5").await;
    assert!(reply.starts_with("Now tracking Amon Ra (died at "), "{reply}");
    assert!(board_text(&gateway).contains("Amon Ra"));
    assert_eq!(group(&dispatcher).lock().await.tracker.store().len(), 1);

    let reply = say_one(&dispatcher, &gateway, member(), "!t").await;
    assert_eq!(reply, "Tracking info refreshed");
}

/// Test 4: an ambiguous name prompts; bad picks are ignored, a good pick
/// resumes the command.
#[tokio::test]
async fn test_04_prompt_and_pick() {
    let dir = tempfile::tempdir().unwrap();
    let (dispatcher, gateway) = bot(&dir);
    with_board(&dispatcher, &gateway).await;

    let prompt = say_one(&dispatcher, &gateway, member(), "!t orc_hero").await;
    assert!(prompt.starts_with("Which spawn was it?"), "{prompt}");
    assert!(prompt.contains("1) Orc Hero (Geffen Field)"));
    assert!(prompt.contains("2) Orc Hero (Orc Village)"));

    // Out of range: ignored, prompt stays.
    assert!(say(&dispatcher, &gateway, member(), "5").await.is_empty());
    // Someone else's number is not a pick.
    assert!(say(&dispatcher, &gateway, manager(), "2").await.is_empty());

    let reply = say_one(&dispatcher, &gateway, member(), "2").await;
    assert!(reply.starts_with("Now tracking Orc Hero (Orc Village) (died at "), "{reply}");
    assert!(!group(&dispatcher).lock().await.prompts.is_awaiting(&2));
}

/// Test 5: a trailing range selector tracks several spawns at once.
#[tokio::test]
async fn test_05_batch_selector() {
    let dir = tempfile::tempdir().unwrap();
    let (dispatcher, gateway) = bot(&dir);
    with_board(&dispatcher, &gateway).await;

    let reply = say_one(&dispatcher, &gateway, member(), "!t orc_hero 10 1-2").await;
    assert_eq!(reply.lines().count(), 2);
    assert!(reply.lines().all(|line| line.starts_with("Now tracking Orc Hero (")));
    assert_eq!(group(&dispatcher).lock().await.tracker.store().len(), 2);

    let reply = say_one(&dispatcher, &gateway, member(), "!t orc_hero 1-3").await;
    assert_eq!(
        reply,
        "Failed to track boss: 3 greater than number of options to choose from"
    );
}

// ═══════════════════════════════════════════════════════
// PERMISSIONS AND CONFIGURATION
// ═══════════════════════════════════════════════════════

/// Test 6: editor commands need an editor; display forms do not.
#[tokio::test]
async fn test_06_editor_permissions() {
    let dir = tempfile::tempdir().unwrap();
    let (dispatcher, gateway) = bot(&dir);

    let reply = say_one(&dispatcher, &gateway, member(), "!t-add Foo_Bar prontera 10 20").await;
    assert_eq!(reply, "!track-add failed: hixxy is not an editor");

    let reply = say_one(&dispatcher, &gateway, member(), "!t-expire").await;
    assert!(reply.starts_with("Expiration time is "), "{reply}");

    let reply = say_one(&dispatcher, &gateway, manager(), "!t-add-editor <@2>").await;
    assert_eq!(reply, "Successfully added <@2> as an editor");

    let reply = say_one(&dispatcher, &gateway, member(), "!t-add Foo_Bar prontera 10 20").await;
    assert!(reply.starts_with("Successfully added enemy: "), "{reply}");
    assert!(group(&dispatcher)
        .lock()
        .await
        .tracker
        .catalog()
        .contains("Foo Bar"));

    let reply = say_one(&dispatcher, &gateway, manager(), "!t-remove-editor <@1>").await;
    assert_eq!(
        reply,
        "Failed to remove editor: <@1> is a server manager and may not be removed"
    );
}

/// Test 7: settings are shown and changed.
#[tokio::test]
async fn test_07_settings() {
    let dir = tempfile::tempdir().unwrap();
    let (dispatcher, gateway) = bot(&dir);

    let reply = say_one(&dispatcher, &gateway, manager(), "!t-utc-offset -04:00").await;
    assert!(reply.starts_with("Server time UTC offset set to "), "{reply}");
    assert_eq!(group(&dispatcher).lock().await.config.utc_offset, -240);

    let reply = say_one(&dispatcher, &gateway, manager(), "!t-utc-offset 4").await;
    assert_eq!(reply, "Failed to set UTC offset: 4 not formatted as HH:MM or -HH:MM");

    let reply = say_one(&dispatcher, &gateway, manager(), "!t-expire -5").await;
    assert_eq!(reply, "Failed to set expire time: expire time must not be negative");

    let reply = say_one(&dispatcher, &gateway, manager(), "!t-auto-refresh 0").await;
    assert_eq!(reply, "Auto-refresh disabled");
    assert!(!group(&dispatcher).lock().await.has_refresh_task());

    let reply = say_one(&dispatcher, &gateway, manager(), "!t-auto-refresh 5").await;
    assert!(reply.starts_with("Updated auto-refresh time to "), "{reply}");
    assert!(group(&dispatcher).lock().await.has_refresh_task());
}

/// Test 8: alerts are added, listed and removed.
#[tokio::test]
async fn test_08_alert_rules() {
    let dir = tempfile::tempdir().unwrap();
    let (dispatcher, gateway) = bot(&dir);

    let reply = say_one(&dispatcher, &gateway, manager(), "!t-alert prob > 0.5").await;
    assert_eq!(reply, "Successfully added alert");
    let reply = say_one(&dispatcher, &gateway, manager(), "!t-alert").await;
    assert_eq!(reply, "```\nConfigured alerts:\nprob > 0.5\n```");

    let reply = say_one(&dispatcher, &gateway, manager(), "!t-alert import os").await;
    assert!(reply.starts_with("Failed to add alert: "), "{reply}");

    let nested = format!("!t-alert {}prob > 0{}", "(".repeat(100), ")".repeat(100));
    let reply = say_one(&dispatcher, &gateway, manager(), &nested).await;
    assert!(reply.contains("nested too deeply"), "{reply}");
    let long = format!("!t-alert prob > 0{}", " or prob > 0".repeat(500));
    let reply = say_one(&dispatcher, &gateway, manager(), &long).await;
    assert!(reply.starts_with("Failed to add alert: "), "{reply}");
    assert_eq!(group(&dispatcher).lock().await.tracker.rules().iter().count(), 1);

    let reply = say_one(&dispatcher, &gateway, manager(), "!t-remove-alert").await;
    assert_eq!(reply, "Successfully removed alert: prob > 0.5");
    let reply = say_one(&dispatcher, &gateway, manager(), "!t-remove-alert").await;
    assert_eq!(reply, "Failed to remove alert: No alerts to remove");
}

// ═══════════════════════════════════════════════════════
// CANCELLING
// ═══════════════════════════════════════════════════════

/// Test 9: cancelling by name, and when nothing is tracked.
#[tokio::test]
async fn test_09_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let (dispatcher, gateway) = bot(&dir);
    with_board(&dispatcher, &gateway).await;
    say_one(&dispatcher, &gateway, member(), "!t amon").await;

    let reply = say_one(&dispatcher, &gateway, member(), "!t-cancel amon").await;
    assert_eq!(reply, "Successfully cancelled Amon Ra");
    assert!(!board_text(&gateway).contains("Amon Ra"));

    let reply = say_one(&dispatcher, &gateway, member(), "!t-cancel amon").await;
    assert_eq!(reply, "Failed to cancel: nothing is being tracked");
}

/// Test 10: an ambiguous cancel prompts, and only takes a single pick.
#[tokio::test]
async fn test_10_cancel_prompt_rejects_batch() {
    let dir = tempfile::tempdir().unwrap();
    let (dispatcher, gateway) = bot(&dir);
    with_board(&dispatcher, &gateway).await;
    say_one(&dispatcher, &gateway, member(), "!t orc_hero 1-2").await;

    let prompt = say_one(&dispatcher, &gateway, member(), "!t-cancel orc_hero").await;
    assert!(prompt.starts_with("Which spawn should be cancelled?"), "{prompt}");

    assert!(say(&dispatcher, &gateway, member(), "1-2").await.is_empty());
    let reply = say_one(&dispatcher, &gateway, member(), "1").await;
    assert_eq!(reply, "Successfully cancelled Orc Hero (Geffen Field)");
    assert_eq!(group(&dispatcher).lock().await.tracker.store().len(), 1);
}

// ═══════════════════════════════════════════════════════
// OUTPUT AND PERSISTENCE
// ═══════════════════════════════════════════════════════

/// Test 11: long replies are split into fenced chunks under the cap.
#[tokio::test]
async fn test_11_long_reply_is_chunked() {
    let dir = tempfile::tempdir().unwrap();
    let (dispatcher, gateway) = bot(&dir);

    let replies = say(&dispatcher, &gateway, member(), "!t-conf").await;
    assert!(replies.len() > 1);
    for reply in &replies {
        assert!(reply.chars().count() <= 2000);
        assert!(reply.starts_with("```\n") && reply.ends_with("\n```"));
    }
    let sent: Vec<_> = gateway
        .messages(COMMAND_CHANNEL)
        .into_iter()
        .filter(|(_, content)| matches!(content, Content::Text { text } if text.starts_with("```")))
        .collect();
    assert_eq!(sent.len(), replies.len());
}

/// Test 12: state survives a restart.
#[tokio::test]
async fn test_12_state_reloads() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (dispatcher, gateway) = bot(&dir);
        with_board(&dispatcher, &gateway).await;
        say_one(&dispatcher, &gateway, member(), "!t amon 5").await;
        say_one(&dispatcher, &gateway, manager(), "!t-alert now - min > 2").await;
    }

    let registry = GroupRegistry::open(dir.path().join("state.json"), 0.0).unwrap();
    let session = registry.get(GROUP).unwrap().expect("group was saved");
    let session = session.lock().await;
    assert_eq!(session.config.channel, Some(BOARD_CHANNEL));
    assert_eq!(session.tracker.store().len(), 1);
    assert_eq!(session.tracker.rules().iter().count(), 1);
}

/// Test 13: alerts fire on the board once their rule holds.
#[tokio::test]
async fn test_13_alert_fires_on_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let (dispatcher, gateway) = bot(&dir);
    with_board(&dispatcher, &gateway).await;
    say_one(&dispatcher, &gateway, manager(), "!t-alert now - min > 2").await;
    say_one(&dispatcher, &gateway, member(), "!t amon").await;
    assert!(!board_text(&gateway).contains("now - min > 2"));

    gateway.advance(Duration::minutes(65));
    say_one(&dispatcher, &gateway, member(), "!t").await;
    assert!(board_text(&gateway).contains("Amon Ra: now - min > 2"));
}

/// Test 14: a framed event line drives the dispatcher.
#[tokio::test]
async fn test_14_framed_event() {
    let dir = tempfile::tempdir().unwrap();
    let (dispatcher, gateway) = bot(&dir);

    let line = r#"{"group":7,"channel":11,"author":{"id":1,"name":"keele","manage_group":true},"content":"!t-expire 45","timestamp":"2024-03-01T06:00:00Z"}"#;
    let message = assert_ok!(framing::parse_event(line));
    gateway.record_inbound(&message);
    let replies = assert_ok!(dispatcher.handle_message(&message).await);
    assert_eq!(replies.len(), 1);
    assert_eq!(group(&dispatcher).lock().await.config.expire, 45);
}
