use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use verdant_test_model::{PresetReply, TestModelProvider};

use super::*;
use crate::conversation::ChatRole;

async fn temp_image(name: &str) -> PathBuf {
    let path = std::env::temp_dir()
        .join(format!("verdant-app-{}-{name}", std::process::id()));
    tokio::fs::write(&path, b"\xff\xd8\xff fake jpeg").await.unwrap();
    path
}

/// Pumps completion events until the controller goes idle.
async fn drive(app: &mut App, event_rx: &mut UnboundedReceiver<AppEvent>) {
    while app.is_busy() {
        let event = timeout(Duration::from_millis(500), event_rx.recv())
            .await
            .unwrap()
            .unwrap();
        app.handle_event(event);
    }
}

fn identified_provider() -> TestModelProvider {
    let mut provider = TestModelProvider::default();
    provider.add_user_turn_step();
    provider.add_assistant_reply_step(PresetReply::with_text(
        "Ficus care guide…",
    ));
    provider
}

#[tokio::test]
async fn test_identify_success() {
    let (mut app, mut event_rx) =
        App::new(ConversationClient::new(identified_provider()));

    app.select_image(temp_image("leaf.jpg").await);
    app.identify();
    assert!(app.is_busy());
    drive(&mut app, &mut event_rx).await;

    assert_eq!(app.screen(), Screen::Chatting);
    assert!(app.has_conversation());
    assert_eq!(app.error(), None);
    assert_eq!(app.transcript().len(), 1);
    assert_eq!(app.transcript()[0].role, ChatRole::Assistant);
    assert_eq!(app.transcript()[0].text, "Ficus care guide…");
}

#[tokio::test]
async fn test_identify_service_failure() {
    let mut provider = TestModelProvider::default();
    provider.add_user_turn_step();
    provider.add_assistant_reply_step(
        PresetReply::with_text("never").with_failures(0),
    );
    let (mut app, mut event_rx) = App::new(ConversationClient::new(provider));

    app.select_image(temp_image("sad-leaf.jpg").await);
    app.identify();
    drive(&mut app, &mut event_rx).await;

    assert_eq!(app.screen(), Screen::Welcome);
    assert!(!app.has_conversation());
    assert!(app.error().is_some());
    assert!(app.transcript().is_empty());
}

#[tokio::test]
async fn test_identify_encoding_failure() {
    let (mut app, mut event_rx) =
        App::new(ConversationClient::new(identified_provider()));

    app.select_image(PathBuf::from("/definitely/not/here.jpg"));
    app.identify();
    drive(&mut app, &mut event_rx).await;

    assert_eq!(app.screen(), Screen::Welcome);
    assert!(app.error().is_some());
    assert!(app.transcript().is_empty());
}

#[tokio::test]
async fn test_identify_without_image() {
    let (mut app, _event_rx) =
        App::new(ConversationClient::new(identified_provider()));

    app.identify();

    assert!(!app.is_busy());
    assert_eq!(app.error(), Some("Please select an image first."));
}

#[tokio::test]
async fn test_followup_success() {
    let mut provider = identified_provider();
    provider.add_user_turn_step();
    provider.add_assistant_reply_step(PresetReply::with_text(
        "Every 7 days.",
    ));
    let (mut app, mut event_rx) = App::new(ConversationClient::new(provider));

    app.select_image(temp_image("watered-leaf.jpg").await);
    app.identify();
    drive(&mut app, &mut event_rx).await;

    app.send_followup("How often should I water it?");
    drive(&mut app, &mut event_rx).await;

    let transcript = app.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1].role, ChatRole::User);
    assert_eq!(transcript[1].text, "How often should I water it?");
    assert_eq!(transcript[2].role, ChatRole::Assistant);
    assert_eq!(transcript[2].text, "Every 7 days.");
}

#[tokio::test]
async fn test_followup_failure_rolls_back() {
    let mut provider = identified_provider();
    provider.add_user_turn_step();
    provider.add_assistant_reply_step(
        PresetReply::with_text("Every 7 days.").with_failures(1),
    );
    let (mut app, mut event_rx) = App::new(ConversationClient::new(provider));

    app.select_image(temp_image("thirsty-leaf.jpg").await);
    app.identify();
    drive(&mut app, &mut event_rx).await;

    app.send_followup("How often should I water it?");
    drive(&mut app, &mut event_rx).await;

    // The optimistic user turn has been rolled back.
    assert_eq!(app.transcript().len(), 1);
    assert!(app.error().is_some());

    // The conversation handle survived the failed turn; a retry works.
    app.send_followup("How often should I water it?");
    drive(&mut app, &mut event_rx).await;
    assert_eq!(app.transcript().len(), 3);
    assert_eq!(app.error(), None);
}

#[tokio::test]
async fn test_followup_guards() {
    let mut provider = identified_provider();
    provider.add_user_turn_step();
    provider.add_assistant_reply_step(PresetReply::with_text(
        "Every 7 days.",
    ));
    provider.set_delay(Duration::from_millis(20));
    let (mut app, mut event_rx) = App::new(ConversationClient::new(provider));

    // Without a conversation, sending is a no-op.
    app.send_followup("hello?");
    assert!(!app.is_busy());
    assert!(app.transcript().is_empty());

    app.select_image(temp_image("guarded-leaf.jpg").await);
    app.identify();
    drive(&mut app, &mut event_rx).await;

    // Whitespace-only input is a no-op.
    app.send_followup("   \n");
    assert!(!app.is_busy());

    // A second submission while busy is ignored.
    app.send_followup("How often should I water it?");
    assert!(app.is_busy());
    assert!(app.is_composing());
    app.send_followup("Are you still there?");
    drive(&mut app, &mut event_rx).await;

    assert_eq!(app.transcript().len(), 3);
    assert!(!app.is_composing());
}

#[tokio::test]
async fn test_start_over_resets_everything() {
    let mut provider = identified_provider();
    provider.add_user_turn_step();
    provider.add_assistant_reply_step(
        PresetReply::with_text("never").with_failures(0),
    );
    let (mut app, mut event_rx) = App::new(ConversationClient::new(provider));

    app.select_image(temp_image("reset-leaf.jpg").await);
    app.identify();
    drive(&mut app, &mut event_rx).await;
    app.send_followup("Some question");
    drive(&mut app, &mut event_rx).await;
    assert!(app.error().is_some());

    app.start_over();

    assert_eq!(app.screen(), Screen::Welcome);
    assert!(app.transcript().is_empty());
    assert_eq!(app.selected_image(), None);
    assert_eq!(app.error(), None);
    assert!(!app.is_busy());
    assert!(!app.has_conversation());
}

#[tokio::test]
async fn test_stale_response_is_dropped() {
    let mut provider = identified_provider();
    provider.set_delay(Duration::from_millis(20));
    let (mut app, mut event_rx) = App::new(ConversationClient::new(provider));

    app.select_image(temp_image("stale-leaf.jpg").await);
    app.identify();

    // Reset while the identification is still in flight.
    app.start_over();

    // The response still arrives, but it belongs to a discarded
    // generation and must not touch the fresh session.
    let event = timeout(Duration::from_millis(500), event_rx.recv())
        .await
        .unwrap()
        .unwrap();
    app.handle_event(event);

    assert_eq!(app.screen(), Screen::Welcome);
    assert!(app.transcript().is_empty());
    assert!(!app.has_conversation());
    assert!(!app.is_busy());
    assert_eq!(app.error(), None);
}
