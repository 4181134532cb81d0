//! End-to-end tests: chat messages in, messenger traffic out.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bluffhall::{
    BarConfig, ChannelId, Handled, Image, Inbound, PlayerId, PlayerTag, RecordingMessenger,
    RenderError, Renderer, Tavern, TavernBuilder,
};
use bluffhall_protocol::Card;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Draws placeholder images and counts how often it was asked to.
#[derive(Default)]
struct FakeRenderer {
    hands: AtomicUsize,
    stages: AtomicUsize,
    broken: bool,
}

impl FakeRenderer {
    fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    fn hands(&self) -> usize {
        self.hands.load(Ordering::SeqCst)
    }
}

impl Renderer for FakeRenderer {
    fn render_hand(&self, cards: &[Card], width: u32) -> Result<Image, RenderError> {
        if self.broken {
            return Err(RenderError::Failed("no fonts".into()));
        }
        self.hands.fetch_add(1, Ordering::SeqCst);
        Ok(Image::png(format!("hand {} {width}", cards.len()).into_bytes()))
    }

    fn render_penalty_stage(&self, slots: usize) -> Result<Image, RenderError> {
        if self.broken {
            return Err(RenderError::Failed("no fonts".into()));
        }
        self.stages.fetch_add(1, Ordering::SeqCst);
        Ok(Image::png(format!("bomb {slots}").into_bytes()))
    }
}

type Bar = Tavern<RecordingMessenger, FakeRenderer>;

fn seeded() -> BarConfig {
    BarConfig {
        rng_seed: Some(7),
        ..BarConfig::default()
    }
}

async fn open_bar(config: BarConfig, renderer: FakeRenderer) -> (Bar, Arc<FakeRenderer>) {
    let renderer = Arc::new(renderer);
    let bar = TavernBuilder::new()
        .config(config)
        .in_memory()
        .build(Arc::new(RecordingMessenger::new()), Arc::clone(&renderer))
        .await
        .unwrap();
    (bar, renderer)
}

fn alice() -> PlayerTag {
    PlayerTag::new("u1", "Alice")
}

fn bob() -> PlayerTag {
    PlayerTag::new("u2", "Bob")
}

fn cara() -> PlayerTag {
    PlayerTag::new("u3", "Cara")
}

fn general() -> ChannelId {
    ChannelId::new("general")
}

async fn say(bar: &Bar, who: PlayerTag, text: &str) -> Handled {
    bar.handle(Inbound::group(general(), who, text)).await
}

async fn whisper(bar: &Bar, who: PlayerTag, text: &str) -> Handled {
    bar.handle(Inbound::private(who, text)).await
}

/// Lets the delivery task catch up.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

fn channel_log(bar: &Bar) -> String {
    bar.messenger().channel_texts(&general()).join("\n---\n")
}

fn private_log(bar: &Bar, who: &PlayerTag) -> Vec<(String, Option<Image>)> {
    bar.messenger().player_messages(&who.id)
}

async fn seat_three(bar: &Bar) {
    assert_eq!(say(bar, alice(), "/bar create").await, Handled::Applied);
    assert_eq!(say(bar, bob(), "/bar join").await, Handled::Applied);
    assert_eq!(say(bar, cara(), "/bar join").await, Handled::Applied);
}

async fn start_three(bar: &Bar) {
    seat_three(bar).await;
    assert_eq!(say(bar, alice(), "/bar start").await, Handled::Applied);
    settle().await;
}

// ---------------------------------------------------------------------------
// Lobby and start
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_full_lobby_to_first_round() {
    let (bar, renderer) = open_bar(seeded(), FakeRenderer::default()).await;
    start_three(&bar).await;

    let log = channel_log(&bar);
    assert!(log.contains("Alice opened a Liar's Bar room (up to 5 players)."));
    assert!(log.contains("Bob joined the room. Seated: 2/5."));
    assert!(log.contains("Alice can send /bar start."));
    assert!(log.contains("Liar's Bar rules"));
    assert!(log.contains("Sun x5, Moon x5, Star x4, Joker x1 (15 cards)"));
    assert!(log.contains("Round 1. Target:"));
    assert!(log.contains("Alice opens."));

    for who in [alice(), bob(), cara()] {
        let messages = private_log(&bar, &who);
        assert!(messages.iter().any(|(t, _)| t.contains("connectivity check")));
        let (hand, image) = messages
            .iter()
            .find(|(t, _)| t.contains("Your hand:"))
            .expect("hand delivered");
        assert!(hand.contains("1:"));
        assert!(hand.contains("5:"));
        assert!(image.is_some());
    }
    assert!(renderer.hands() >= 1);
}

#[tokio::test(start_paused = true)]
async fn test_status_reports_turn_and_seats() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;
    start_three(&bar).await;
    bar.messenger().clear();

    assert_eq!(say(&bar, cara(), "/bar status").await, Handled::Applied);
    let log = channel_log(&bar);
    assert!(log.contains("Room in general: awaiting play"));
    assert!(log.contains("Waiting on: Alice"));
    assert!(log.contains("- Bob: 5 card(s), bomb stage 1"));
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_player_blocks_start() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;
    seat_three(&bar).await;
    bar.messenger().block_player(PlayerId::new("u3"));

    assert_eq!(say(&bar, alice(), "/bar start").await, Handled::Rejected);
    settle().await;
    let log = channel_log(&bar);
    assert!(log.contains("These players can't receive private messages: u3."));

    bar.messenger().clear();
    say(&bar, alice(), "/bar status").await;
    assert!(channel_log(&bar).contains("waiting for players"));
}

#[tokio::test(start_paused = true)]
async fn test_start_is_checked_before_probing() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;
    seat_three(&bar).await;
    bar.messenger().clear();

    assert_eq!(say(&bar, bob(), "/bar start").await, Handled::Rejected);
    assert!(channel_log(&bar).contains("Only the room owner or an admin can do that."));
    assert!(private_log(&bar, &alice()).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_probe_can_be_turned_off() {
    let config = BarConfig {
        require_dm_reachable_before_start: false,
        ..seeded()
    };
    let (bar, _) = open_bar(config, FakeRenderer::default()).await;
    seat_three(&bar).await;
    assert_eq!(say(&bar, alice(), "/bar start").await, Handled::Applied);
    settle().await;

    let messages = private_log(&bar, &bob());
    assert!(!messages.iter().any(|(t, _)| t.contains("connectivity check")));
    assert!(messages.iter().any(|(t, _)| t.contains("Your hand:")));
}

#[tokio::test(start_paused = true)]
async fn test_too_few_players() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;
    say(&bar, alice(), "/bar create").await;
    say(&bar, bob(), "/bar join").await;

    assert_eq!(say(&bar, alice(), "/bar start").await, Handled::Rejected);
    assert!(channel_log(&bar).contains("At least 3 players are needed; 2 seated."));
}

#[tokio::test(start_paused = true)]
async fn test_player_cannot_sit_in_two_rooms() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;
    say(&bar, alice(), "/bar create").await;

    let other = ChannelId::new("lounge");
    let handled = bar
        .handle(Inbound::group(other.clone(), alice(), "/bar create"))
        .await;
    assert_eq!(handled, Handled::Rejected);
    let texts = bar.messenger().channel_texts(&other).join("\n");
    assert!(texts.contains("You are already in the room in general."));
}

// ---------------------------------------------------------------------------
// Parsing, scopes and dedup
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_scope_hints() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;

    assert_eq!(say(&bar, alice(), "/bar play 1 2").await, Handled::Rejected);
    assert!(channel_log(&bar).contains("`play` only works in a private chat."));

    assert_eq!(whisper(&bar, alice(), "/bar join").await, Handled::Rejected);
    let private = private_log(&bar, &alice());
    assert!(private[0].0.contains("`join` only works in a group channel."));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_command_gets_help_hint() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;
    assert_eq!(say(&bar, alice(), "/bar dance").await, Handled::Rejected);
    assert_eq!(
        channel_log(&bar),
        "Unknown bar command.\n\nNext: send /bar help for usage."
    );
}

#[tokio::test(start_paused = true)]
async fn test_help_differs_by_scope() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;
    assert_eq!(say(&bar, alice(), "/bar").await, Handled::Applied);
    assert_eq!(whisper(&bar, alice(), "/bar help").await, Handled::Applied);

    assert!(channel_log(&bar).contains("Liar's Bar commands (group):"));
    assert!(private_log(&bar, &alice())[0].0.contains("Liar's Bar commands (private):"));
}

#[tokio::test(start_paused = true)]
async fn test_redelivered_message_is_dropped() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;
    let create = Inbound::group(general(), alice(), "/bar create").with_message_id("m-1");

    assert_eq!(bar.handle(create.clone()).await, Handled::Applied);
    assert_eq!(bar.handle(create.clone()).await, Handled::Duplicate);

    // same id in another scope is a different message
    let help = Inbound::private(alice(), "/bar help").with_message_id("m-1");
    assert_eq!(bar.handle(help).await, Handled::Applied);

    tokio::time::sleep(Duration::from_secs(31)).await;
    // outside the window it is handled again (and rejected: room exists)
    assert_eq!(bar.handle(create).await, Handled::Rejected);
}

#[tokio::test(start_paused = true)]
async fn test_guide_mode_off_drops_hints() {
    let config = BarConfig {
        guide_mode: false,
        ..seeded()
    };
    let (bar, _) = open_bar(config, FakeRenderer::default()).await;
    say(&bar, alice(), "/bar create").await;
    say(&bar, alice(), "/bar create").await;
    settle().await;

    let log = channel_log(&bar);
    assert!(log.contains("Alice opened a Liar's Bar room"));
    assert!(log.contains("This channel already has a room."));
    assert!(!log.contains("Next:"));
}

// ---------------------------------------------------------------------------
// Play
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_play_challenge_and_cut() {
    let (bar, renderer) = open_bar(seeded(), FakeRenderer::default()).await;
    start_three(&bar).await;

    assert_eq!(whisper(&bar, alice(), "/bar play 1").await, Handled::Applied);
    settle().await;
    let log = channel_log(&bar);
    assert!(log.contains("Alice played 1 card(s), claiming all are"));
    assert!(log.contains("Next: Bob: /bar challenge here"));
    assert!(private_log(&bar, &alice())
        .iter()
        .any(|(t, _)| t.contains("You played:") && t.contains("4 card(s) left")));

    assert_eq!(say(&bar, bob(), "/bar challenge").await, Handled::Applied);
    settle().await;
    let log = channel_log(&bar);
    assert!(log.contains("Bob challenged Alice. Revealed:"));
    assert!(log.contains("must cut a wire."));
    assert!(log.contains("Wires: red(1) blue(2) yellow(3)."));
    assert_eq!(renderer.stages.load(Ordering::SeqCst), 1);

    // exactly one of them is facing the bomb
    let prompted: Vec<PlayerTag> = [alice(), bob()]
        .into_iter()
        .filter(|p| {
            private_log(&bar, p)
                .iter()
                .any(|(t, img)| t.contains("You must cut a wire (stage 1)") && img.is_some())
        })
        .collect();
    assert_eq!(prompted.len(), 1);
    let loser = prompted[0].clone();
    let other = if loser.id == alice().id { bob() } else { alice() };

    assert_eq!(say(&bar, other.clone(), "/bar cut red").await, Handled::Rejected);
    assert_eq!(say(&bar, loser.clone(), "/bar cut red").await, Handled::Applied);
    settle().await;
    let log = channel_log(&bar);
    assert!(log.contains(&format!("{} cut the red wire", loser.name)));
}

#[tokio::test(start_paused = true)]
async fn test_out_of_turn_play_is_explained_privately() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;
    start_three(&bar).await;

    assert_eq!(whisper(&bar, bob(), "/bar play 1").await, Handled::Rejected);
    let last = private_log(&bar, &bob()).pop().unwrap();
    assert!(last.0.contains("It is u1's turn."));
}

#[tokio::test(start_paused = true)]
async fn test_bad_positions_are_rejected() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;
    start_three(&bar).await;

    assert_eq!(whisper(&bar, alice(), "/bar play 9").await, Handled::Rejected);
    let last = private_log(&bar, &alice()).pop().unwrap();
    assert!(last.0.contains("Those card positions don't work"));

    // nothing changed: Alice may still play
    assert_eq!(whisper(&bar, alice(), "/bar play 1 2").await, Handled::Applied);
}

#[tokio::test(start_paused = true)]
async fn test_hand_outside_any_room() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;
    assert_eq!(whisper(&bar, alice(), "/bar hand").await, Handled::Rejected);
    assert!(private_log(&bar, &alice())[0].0.contains("You are not in any bar room."));
}

#[tokio::test(start_paused = true)]
async fn test_play_timeout_is_announced() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;
    start_three(&bar).await;

    tokio::time::sleep(Duration::from_secs(121)).await;
    settle().await;
    let log = channel_log(&bar);
    assert!(log.contains("Alice did not play within 120s and is eliminated."));
    assert!(log.contains("Bob's turn to play."));
}

#[tokio::test(start_paused = true)]
async fn test_end_frees_the_channel() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;
    start_three(&bar).await;

    assert_eq!(say(&bar, bob(), "/bar end").await, Handled::Rejected);
    assert_eq!(say(&bar, alice(), "/bar end").await, Handled::Applied);
    settle().await;
    assert!(channel_log(&bar).contains("Alice closed the room."));
    assert_eq!(bar.room_count().await, 0);

    assert_eq!(say(&bar, cara(), "/bar create").await, Handled::Applied);
}

#[tokio::test(start_paused = true)]
async fn test_admin_may_end_any_room() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::default()).await;
    seat_three(&bar).await;

    let end = Inbound::group(general(), bob(), "/bar end").as_admin();
    assert_eq!(bar.handle(end).await, Handled::Applied);
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_render_failure_falls_back_to_text() {
    let (bar, _) = open_bar(seeded(), FakeRenderer::broken()).await;
    start_three(&bar).await;

    let messages = private_log(&bar, &cara());
    let (text, image) = messages
        .iter()
        .find(|(t, _)| t.contains("Your hand:"))
        .expect("hand delivered");
    assert!(text.contains("Target:"));
    assert!(image.is_none());
}

#[tokio::test]
async fn test_hand_images_are_cached_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = BarConfig {
        state_dir: dir.path().to_path_buf(),
        ..seeded()
    };
    let renderer = Arc::new(FakeRenderer::default());
    let bar = TavernBuilder::new()
        .config(config.clone())
        .build(Arc::new(RecordingMessenger::new()), Arc::clone(&renderer))
        .await
        .unwrap();
    start_three(&bar).await;

    let rendered = renderer.hands();
    assert!(rendered >= 1);
    let cached = std::fs::read_dir(config.cache_dir()).unwrap().count();
    assert_eq!(cached, rendered);

    // asking again is a cache hit
    assert_eq!(whisper(&bar, alice(), "/bar hand").await, Handled::Applied);
    assert_eq!(renderer.hands(), rendered);
    let (_, image) = private_log(&bar, &alice()).pop().unwrap();
    assert!(image.is_some());

    assert_eq!(bar.purge_image_cache().unwrap(), cached);
    bar.shutdown().await.unwrap();
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_rooms_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = BarConfig {
        state_dir: dir.path().to_path_buf(),
        ..seeded()
    };

    let first = TavernBuilder::new()
        .config(config.clone())
        .build(Arc::new(RecordingMessenger::new()), Arc::new(FakeRenderer::default()))
        .await
        .unwrap();
    seat_three(&first).await;
    first.shutdown().await.unwrap();

    let second = TavernBuilder::new()
        .config(config)
        .build(Arc::new(RecordingMessenger::new()), Arc::new(FakeRenderer::default()))
        .await
        .unwrap();
    assert_eq!(second.room_count().await, 1);

    say(&second, bob(), "/bar status").await;
    let log = channel_log(&second);
    assert!(log.contains("Seats: 3/5"));
    assert!(log.contains("Owner: Alice"));

    // memberships came back too
    assert_eq!(say(&second, cara(), "/bar join").await, Handled::Rejected);
    assert!(channel_log(&second).contains("You already joined this room."));
    second.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_ended_room_does_not_come_back() {
    let dir = tempfile::tempdir().unwrap();
    let config = BarConfig {
        state_dir: dir.path().to_path_buf(),
        ..seeded()
    };

    let first = TavernBuilder::new()
        .config(config.clone())
        .build(Arc::new(RecordingMessenger::new()), Arc::new(FakeRenderer::default()))
        .await
        .unwrap();
    seat_three(&first).await;
    assert_eq!(say(&first, alice(), "/bar end").await, Handled::Applied);
    first.shutdown().await.unwrap();

    let second = TavernBuilder::new()
        .config(config)
        .build(Arc::new(RecordingMessenger::new()), Arc::new(FakeRenderer::default()))
        .await
        .unwrap();
    assert_eq!(second.room_count().await, 0);
    second.shutdown().await.unwrap();
}
