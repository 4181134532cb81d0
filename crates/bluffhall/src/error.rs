//! Unified error type for the Bluffhall service.

use std::path::PathBuf;

use bluffhall_protocol::ProtocolError;
use bluffhall_room::RoomError;
use bluffhall_store::StoreError;
use bluffhall_transport::TransportError;

/// Problems reading or parsing [`BarConfig`](crate::BarConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value `{value}` for {key}")]
    InvalidValue { key: String, value: String },
}

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BluffhallError {
    /// A command could not be parsed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room rejected a command.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Room records could not be opened or loaded.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A message could not be delivered.
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use bluffhall_protocol::ChannelId;

    #[test]
    fn test_from_protocol_error() {
        let err: BluffhallError = ProtocolError::UnknownCommand("dance".into()).into();
        assert!(matches!(err, BluffhallError::Protocol(_)));
        assert!(err.to_string().contains("dance"));
    }

    #[test]
    fn test_from_room_error() {
        let err: BluffhallError = RoomError::NoRoom(ChannelId::new("g")).into();
        assert!(matches!(err, BluffhallError::Room(_)));
    }

    #[test]
    fn test_from_transport_error() {
        let err: BluffhallError = TransportError::Unreachable("p".into()).into();
        assert!(matches!(err, BluffhallError::Transport(_)));
    }

    #[test]
    fn test_from_config_error() {
        let err: BluffhallError = ConfigError::InvalidValue {
            key: "BLUFFHALL_GUIDE_MODE".into(),
            value: "maybe".into(),
        }
        .into();
        assert!(err.to_string().contains("BLUFFHALL_GUIDE_MODE"));
    }

    #[test]
    fn test_from_store_error() {
        let err: BluffhallError = StoreError::WriterClosed.into();
        assert!(matches!(err, BluffhallError::Store(_)));
    }
}
