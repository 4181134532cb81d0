//! Inbound message handling: dedup, parse, route, reply.
//!
//! Each chat message the host hands to the bar goes through
//! [`handle_inbound`]:
//!   1. Drop it if the same message id was seen in the last 30 s
//!   2. Parse it into a [`Command`] for its scope
//!   3. Route it to its room and apply it (one room transition at most)
//!   4. Answer queries directly, and explain rejections to the sender
//!
//! Everything a room announces on success reaches players through the
//! delivery task, not through this module.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bluffhall_protocol::{parse_command, ChannelId, Command, PlayerId, Scope};
use bluffhall_room::{ErrorKind, PlayerTag, RoomError, RoomRegistry};
use bluffhall_transport::{Messenger, Renderer};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::delivery::Delivery;
use crate::BarConfig;

/// How long a message id is remembered.
pub const DEDUP_WINDOW: Duration = Duration::from_secs(30);

/// Where a message was typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Group(ChannelId),
    Private,
}

impl Origin {
    pub fn scope(&self) -> Scope {
        match self {
            Origin::Group(_) => Scope::Group,
            Origin::Private => Scope::Private,
        }
    }
}

/// One chat message addressed to the bar.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub origin: Origin,
    pub sender: PlayerTag,
    /// The host says this sender may manage any room.
    pub is_admin: bool,
    /// Host message id, used to drop redelivered messages.
    pub message_id: Option<String>,
    pub text: String,
}

impl Inbound {
    pub fn group(channel: ChannelId, sender: PlayerTag, text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Group(channel),
            sender,
            is_admin: false,
            message_id: None,
            text: text.into(),
        }
    }

    pub fn private(sender: PlayerTag, text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Private,
            sender,
            is_admin: false,
            message_id: None,
            text: text.into(),
        }
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    pub fn as_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// Identifies this message among redeliveries.
    fn dedup_key(&self) -> Option<String> {
        let id = self.message_id.as_deref()?;
        Some(match &self.origin {
            Origin::Group(channel) => format!("group:{channel}:{id}"),
            Origin::Private => format!("private:{}:{id}", self.sender.id),
        })
    }
}

/// What became of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// The command was carried out.
    Applied,
    /// The command was refused; the sender was told why unless the
    /// refusal was a conflict.
    Rejected,
    /// Seen before inside the dedup window; ignored.
    Duplicate,
}

/// Remembers recent message ids.
#[derive(Debug)]
pub(crate) struct Dedup {
    window: Duration,
    seen: HashMap<String, Instant>,
}

impl Dedup {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            seen: HashMap::new(),
        }
    }

    /// Returns `false` if `key` was already seen within the window.
    pub(crate) fn first_sighting(&mut self, key: String, now: Instant) -> bool {
        let window = self.window;
        self.seen
            .retain(|_, at| now.saturating_duration_since(*at) < window);
        if self.seen.contains_key(&key) {
            return false;
        }
        self.seen.insert(key, now);
        true
    }
}

/// Shared state every inbound message is handled against.
pub(crate) struct BarState<M, R> {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) delivery: Arc<Delivery<M, R>>,
    pub(crate) config: BarConfig,
    pub(crate) dedup: Mutex<Dedup>,
}

/// Handles one inbound message from dedup to reply.
pub(crate) async fn handle_inbound<M, R>(state: &BarState<M, R>, inbound: Inbound) -> Handled
where
    M: Messenger,
    R: Renderer,
{
    if let Some(key) = inbound.dedup_key() {
        if !state.dedup.lock().await.first_sighting(key, Instant::now()) {
            debug!(player = %inbound.sender.id, "duplicate message dropped");
            return Handled::Duplicate;
        }
    }

    let scope = inbound.origin.scope();
    let command = match parse_command(&inbound.text, scope) {
        Ok(command) => command,
        Err(e) => {
            debug!(player = %inbound.sender.id, error = %e, "unparsable command");
            let text = state.delivery.narrator().protocol_error(&e);
            reply(state, &inbound, &text).await;
            return Handled::Rejected;
        }
    };

    match execute(state, &inbound, command).await {
        Ok(()) => Handled::Applied,
        Err(e) if e.kind() == ErrorKind::Conflict => {
            warn!(player = %inbound.sender.id, error = %e, "command conflicted with room state");
            Handled::Rejected
        }
        Err(e) => {
            debug!(player = %inbound.sender.id, error = %e, "command rejected");
            let text = state.delivery.narrator().room_error(&e);
            reply(state, &inbound, &text).await;
            Handled::Rejected
        }
    }
}

async fn execute<M, R>(state: &BarState<M, R>, inbound: &Inbound, command: Command) -> Result<(), RoomError>
where
    M: Messenger,
    R: Renderer,
{
    let sender = &inbound.sender;
    let narrator = state.delivery.narrator();

    match (command, &inbound.origin) {
        (Command::Help, origin) => {
            reply(state, inbound, &narrator.help(origin.scope())).await;
        }
        (Command::Hand, Origin::Private) => {
            let room = state.registry.lock().await.route_player(&sender.id)?;
            let view = room.hand(sender.id.clone()).await?;
            state.delivery.send_hand(&sender.id, &view).await;
        }
        (Command::Play(positions), Origin::Private) => {
            let room = state.registry.lock().await.route_player(&sender.id)?;
            room.play(sender.id.clone(), positions).await?;
        }
        (Command::Create, Origin::Group(channel)) => {
            state
                .registry
                .lock()
                .await
                .create_room(channel.clone(), sender.clone())?;
        }
        (Command::Join, Origin::Group(channel)) => {
            // membership changes with the join, so the lock spans the reply
            state
                .registry
                .lock()
                .await
                .join_room(channel, sender.clone())
                .await?;
        }
        (Command::Start, Origin::Group(channel)) => {
            start(state, channel, sender, inbound.is_admin).await?;
        }
        (Command::Status, Origin::Group(channel)) => {
            let room = state.registry.lock().await.route(channel)?;
            let view = room.status().await?;
            reply(state, inbound, &narrator.status(&view)).await;
        }
        (Command::Challenge, Origin::Group(channel)) => {
            let room = state.registry.lock().await.route(channel)?;
            room.challenge(sender.id.clone()).await?;
        }
        (Command::CutWire(choice), Origin::Group(channel)) => {
            let room = state.registry.lock().await.route(channel)?;
            room.cut_wire(sender.id.clone(), choice).await?;
        }
        (Command::End, Origin::Group(channel)) => {
            let room = state.registry.lock().await.route(channel)?;
            room.end(sender.clone(), inbound.is_admin).await?;
            state
                .registry
                .lock()
                .await
                .forget(channel, room.generation());
        }
        // parse_command already enforces scopes
        (command, origin) => {
            debug!(?command, ?origin, "command in unexpected scope");
        }
    }
    Ok(())
}

/// Starts the game, first checking every seat can get private messages
/// when the bar requires it.
///
/// The room itself re-validates everything when asked to start, so a
/// lobby that changed during the probe is still judged correctly.
async fn start<M, R>(
    state: &BarState<M, R>,
    channel: &ChannelId,
    sender: &PlayerTag,
    is_admin: bool,
) -> Result<(), RoomError>
where
    M: Messenger,
    R: Renderer,
{
    if state.config.require_dm_reachable_before_start {
        let (room, min_players) = {
            let registry = state.registry.lock().await;
            (registry.route(channel)?, registry.config().min_players)
        };
        let view = room.status().await?;

        if !view.phase.is_waiting() {
            return Err(RoomError::WrongPhase(view.phase.label()));
        }
        if view.owner.id != sender.id && !is_admin {
            return Err(RoomError::NotAuthorized(sender.id.clone()));
        }
        if view.seats.len() < min_players {
            return Err(RoomError::NotEnoughPlayers {
                needed: min_players,
                have: view.seats.len(),
            });
        }

        let mut unreachable: Vec<PlayerId> = Vec::new();
        for seat in &view.seats {
            if !state.delivery.messenger().probe_player(&seat.player.id).await {
                unreachable.push(seat.player.id.clone());
            }
        }
        if !unreachable.is_empty() {
            return Err(RoomError::Unreachable(unreachable));
        }
    }

    let room = state.registry.lock().await.route(channel)?;
    room.start(sender.id.clone(), is_admin).await
}

/// Answers in the scope the message came from.
async fn reply<M, R>(state: &BarState<M, R>, inbound: &Inbound, text: &str)
where
    M: Messenger,
    R: Renderer,
{
    match &inbound.origin {
        Origin::Group(channel) => state.delivery.to_channel(channel, text).await,
        Origin::Private => state.delivery.to_player(&inbound.sender.id, text, None).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_includes_scope() {
        let tag = PlayerTag::new("p1", "Ann");
        let group = Inbound::group(ChannelId::new("g"), tag.clone(), "join").with_message_id("m1");
        let private = Inbound::private(tag.clone(), "hand").with_message_id("m1");
        assert_eq!(group.dedup_key().as_deref(), Some("group:g:m1"));
        assert_eq!(private.dedup_key().as_deref(), Some("private:p1:m1"));
        assert_eq!(Inbound::private(tag, "hand").dedup_key(), None);
    }

    #[test]
    fn test_dedup_window() {
        let mut dedup = Dedup::new(DEDUP_WINDOW);
        let t0 = Instant::now();
        assert!(dedup.first_sighting("a".into(), t0));
        assert!(!dedup.first_sighting("a".into(), t0 + Duration::from_secs(29)));
        assert!(dedup.first_sighting("b".into(), t0 + Duration::from_secs(29)));
        assert!(dedup.first_sighting("a".into(), t0 + Duration::from_secs(30)));
    }

    #[test]
    fn test_origin_scope() {
        assert_eq!(Origin::Group(ChannelId::new("g")).scope(), Scope::Group);
        assert_eq!(Origin::Private.scope(), Scope::Private);
    }
}
