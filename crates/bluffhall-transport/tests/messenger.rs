//! Integration tests for the bundled messengers.

use bluffhall_protocol::{ChannelId, PlayerId};
use bluffhall_transport::{ConsoleMessenger, Image, Messenger, RecordingMessenger, Sent};

#[tokio::test]
async fn test_recording_messenger_keeps_order() {
    let m = RecordingMessenger::new();
    let general = ChannelId::new("general");
    let alice = PlayerId::new("alice");

    m.send_to_channel(&general, "room opened").await.unwrap();
    m.send_to_player(&alice, "your hand", Some(&Image::png(vec![7])))
        .await
        .unwrap();
    m.send_to_channel(&general, "alice joined").await.unwrap();

    let sent = m.sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[1].text(), "your hand");
    assert_eq!(m.channel_texts(&general), vec!["room opened", "alice joined"]);

    let dms = m.player_messages(&alice);
    assert_eq!(dms.len(), 1);
    assert_eq!(dms[0].1, Some(Image::png(vec![7])));
}

#[tokio::test]
async fn test_blocked_player_fails_and_is_not_recorded() {
    let m = RecordingMessenger::new();
    let bob = PlayerId::new("bob");
    m.block_player(bob.clone());

    let result = m.send_to_player(&bob, "hello", None).await;

    assert!(result.is_err());
    assert!(m.sent().is_empty());
}

#[tokio::test]
async fn test_probe_uses_private_send() {
    let m = RecordingMessenger::new();
    let alice = PlayerId::new("alice");
    let bob = PlayerId::new("bob");
    m.block_player(bob.clone());

    assert!(m.probe_player(&alice).await);
    assert!(!m.probe_player(&bob).await);
    assert!(matches!(&m.sent()[0], Sent::Player { player, .. } if *player == alice));
}

#[tokio::test]
async fn test_clear_forgets_history() {
    let m = RecordingMessenger::new();
    m.send_to_channel(&ChannelId::new("g"), "x").await.unwrap();
    m.clear();
    assert!(m.sent().is_empty());
}

#[tokio::test]
async fn test_console_messenger_writes_both_scopes() {
    let m = ConsoleMessenger::new();
    m.send_to_channel(&ChannelId::new("general"), "room opened")
        .await
        .unwrap();
    m.send_to_player(&PlayerId::new("alice"), "your hand", Some(&Image::png(vec![1, 2])))
        .await
        .unwrap();
    assert!(m.probe_player(&PlayerId::new("alice")).await);
}
