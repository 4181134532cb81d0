/// Errors that can occur while delivering a message.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The recipient cannot be reached (e.g. private messages are closed).
    #[error("recipient unreachable: {0}")]
    Unreachable(String),

    /// Sending failed at the I/O level.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// The messenger was shut down.
    #[error("messenger shut down")]
    Shutdown,
}

/// Errors from an image renderer. Always recoverable: the caller falls
/// back to text.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// This renderer does not produce images.
    #[error("rendering not supported")]
    Unsupported,

    /// A required asset (font, card face) is missing.
    #[error("missing asset: {0}")]
    MissingAsset(String),

    /// Rendering itself failed.
    #[error("render failed: {0}")]
    Failed(String),
}
