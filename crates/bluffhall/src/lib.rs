//! # Bluffhall
//!
//! A Liar's Bar session engine for group chats.
//!
//! Players open a room in a group channel, join, and play a bluffing
//! card game: cards are played face down in private, claimed in public,
//! and challenged. Losing a challenge means cutting a wire on a bomb.
//!
//! The host application feeds chat messages to a [`Tavern`] and supplies
//! a [`Messenger`] (how to send text) and a [`Renderer`] (how to draw
//! hands). Rooms run as independent actors; their state is written to
//! disk after every change and restored on start.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bluffhall::prelude::*;
//!
//! # async fn run() -> Result<(), BluffhallError> {
//! let tavern = TavernBuilder::new()
//!     .config(BarConfig::load(None)?)
//!     .build(Arc::new(ConsoleMessenger::new()), Arc::new(NullRenderer))
//!     .await?;
//!
//! let alice = PlayerTag::new("u1", "Alice");
//! tavern
//!     .handle(Inbound::group(ChannelId::new("general"), alice, "/bar create"))
//!     .await;
//! # Ok(())
//! # }
//! ```

mod config;
mod delivery;
mod error;
mod handler;
mod server;
mod text;

pub use config::{BarConfig, ENV_PREFIX};
pub use delivery::{spawn_delivery, Delivery};
pub use error::{BluffhallError, ConfigError};
pub use handler::{Handled, Inbound, Origin, DEDUP_WINDOW};
pub use server::{Tavern, TavernBuilder};
pub use text::{deck_line, Narrator};

pub use bluffhall_protocol::{ChannelId, PlayerId};
pub use bluffhall_room::PlayerTag;
pub use bluffhall_transport::{
    ConsoleMessenger, Image, Messenger, NullRenderer, RecordingMessenger, RenderError, Renderer,
    TransportError,
};

/// Everything needed to run a bar.
pub mod prelude {
    pub use crate::{
        BarConfig, BluffhallError, ChannelId, ConsoleMessenger, Handled, Inbound, Messenger,
        NullRenderer, PlayerId, PlayerTag, Renderer, Tavern, TavernBuilder,
    };
}
