//! Shared vocabulary for Bluffhall.
//!
//! This crate defines the "language" every other layer speaks:
//!
//! - **Types** ([`PlayerId`], [`ChannelId`], [`Card`], [`Suit`],
//!   [`Recipient`], [`WireColor`]): identities and game pieces.
//! - **Commands** ([`Command`], [`Scope`], [`parse_command`]): the text
//!   command surface players type into a group channel or a private chat.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how durable room
//!   records are turned into bytes and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong while parsing
//!   or encoding.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about rooms, timers or storage. It
//! only names things and converts them to and from text or bytes.
//!
//! ```text
//! chat text → Protocol (Command) → Room (transition) → Protocol (Recipient) → chat text
//! ```

mod codec;
mod command;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use command::{parse_command, Command, Scope, COMMAND_PREFIXES};
pub use error::ProtocolError;
pub use types::{Card, CardId, ChannelId, PlayerId, Recipient, Suit, WireColor};
