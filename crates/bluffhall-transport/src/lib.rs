//! Collaborator interfaces for Bluffhall.
//!
//! The game engine never talks to a chat platform or an image library
//! directly. It goes through two narrow traits:
//!
//! - [`Messenger`]: deliver text (and optionally an image) to the group
//!   channel or privately to one player.
//! - [`Renderer`]: turn a hand or a wire stage into an [`Image`].
//!
//! Ships with [`ConsoleMessenger`] for the demo, [`RecordingMessenger`]
//! for tests, and [`NullRenderer`] for text-only deployments.

mod console;
mod error;
mod recording;

pub use console::ConsoleMessenger;
pub use error::{RenderError, TransportError};
pub use recording::{RecordingMessenger, Sent};

use std::future::Future;

use bluffhall_protocol::{Card, ChannelId, PlayerId};

/// An encoded image ready to attach to a private message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    bytes: Vec<u8>,
}

impl Image {
    /// Wraps PNG-encoded bytes.
    pub fn png(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Delivers outbound messages.
///
/// The futures are `Send` so a delivery task can drive any messenger from
/// a spawned task.
pub trait Messenger: Send + Sync + 'static {
    /// Post `text` to a group channel.
    fn send_to_channel(
        &self,
        channel: &ChannelId,
        text: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Send `text` privately, with an optional image attached.
    fn send_to_player(
        &self,
        player: &PlayerId,
        text: &str,
        image: Option<&Image>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Checks that `player` can receive private messages by sending a
    /// short probe.
    fn probe_player(&self, player: &PlayerId) -> impl Future<Output = bool> + Send {
        async move {
            self.send_to_player(
                player,
                "[bar connectivity check] receiving this means private messages work.",
                None,
            )
            .await
            .is_ok()
        }
    }
}

/// Draws images for private hand views and wire-cut prompts.
///
/// Rendering is CPU-bound and synchronous. Any error makes the caller fall
/// back to text.
pub trait Renderer: Send + Sync + 'static {
    /// Draw `cards` in hand order, numbered from 1. `width` is a hint.
    fn render_hand(&self, cards: &[Card], width: u32) -> Result<Image, RenderError>;

    /// Draw the bomb with `slots` wires still attached.
    fn render_penalty_stage(&self, slots: usize) -> Result<Image, RenderError>;
}

/// A renderer that never produces images.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render_hand(&self, _cards: &[Card], _width: u32) -> Result<Image, RenderError> {
        Err(RenderError::Unsupported)
    }

    fn render_penalty_stage(&self, _slots: usize) -> Result<Image, RenderError> {
        Err(RenderError::Unsupported)
    }
}
