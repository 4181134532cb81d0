//! A messenger that records everything it is asked to send.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use bluffhall_protocol::{ChannelId, PlayerId};
use tracing::debug;

use crate::{Image, Messenger, TransportError};

/// One recorded delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Channel {
        channel: ChannelId,
        text: String,
    },
    Player {
        player: PlayerId,
        text: String,
        image: Option<Image>,
    },
}

impl Sent {
    pub fn text(&self) -> &str {
        match self {
            Sent::Channel { text, .. } | Sent::Player { text, .. } => text,
        }
    }
}

/// Test double: keeps every message in memory and can simulate players
/// whose private channel is closed.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    unreachable: Mutex<HashSet<PlayerId>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make private sends to `player` fail from now on.
    pub fn block_player(&self, player: PlayerId) {
        lock(&self.unreachable).insert(player);
    }

    /// Everything sent so far.
    pub fn sent(&self) -> Vec<Sent> {
        lock(&self.sent).clone()
    }

    /// Texts posted to `channel`, oldest first.
    pub fn channel_texts(&self, channel: &ChannelId) -> Vec<String> {
        lock(&self.sent)
            .iter()
            .filter_map(|s| match s {
                Sent::Channel { channel: c, text } if c == channel => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Private messages delivered to `player`, oldest first.
    pub fn player_messages(&self, player: &PlayerId) -> Vec<(String, Option<Image>)> {
        lock(&self.sent)
            .iter()
            .filter_map(|s| match s {
                Sent::Player {
                    player: p,
                    text,
                    image,
                } if p == player => Some((text.clone(), image.clone())),
                _ => None,
            })
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        lock(&self.sent).clear();
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

impl Messenger for RecordingMessenger {
    async fn send_to_channel(&self, channel: &ChannelId, text: &str) -> Result<(), TransportError> {
        lock(&self.sent).push(Sent::Channel {
            channel: channel.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_to_player(
        &self,
        player: &PlayerId,
        text: &str,
        image: Option<&Image>,
    ) -> Result<(), TransportError> {
        if lock(&self.unreachable).contains(player) {
            debug!(%player, "refusing private message to blocked player");
            return Err(TransportError::Unreachable(player.to_string()));
        }
        lock(&self.sent).push(Sent::Player {
            player: player.clone(),
            text: text.to_string(),
            image: image.cloned(),
        });
        Ok(())
    }
}
