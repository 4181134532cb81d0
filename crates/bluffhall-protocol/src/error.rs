//! Error types for the protocol layer.
//!
//! Each crate in Bluffhall defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in parsing a command or in
//! encoding/decoding a record, not in the game rules or the storage.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of a record failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization of a record failed.
    ///
    /// Common causes: a hand-edited state file, a truncated write, or a
    /// record written by an incompatible version.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The text did not start with a known verb.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The verb exists but may only be used in the other scope
    /// (group-only verb sent privately, or the reverse).
    #[error("command `{verb}` is only available in {expected}")]
    WrongScope {
        verb: String,
        expected: &'static str,
    },

    /// A required argument was not supplied.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// An argument was supplied but could not be understood.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_scope_message_names_the_scope() {
        let err = ProtocolError::WrongScope {
            verb: "join".into(),
            expected: "a group channel",
        };
        assert_eq!(
            err.to_string(),
            "command `join` is only available in a group channel"
        );
    }

    #[test]
    fn test_missing_argument_message() {
        let err = ProtocolError::MissingArgument("wire choice");
        assert_eq!(err.to_string(), "missing argument: wire choice");
    }
}
