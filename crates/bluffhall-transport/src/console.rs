//! A messenger that writes to standard output.

use bluffhall_protocol::{ChannelId, PlayerId};
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;
use tracing::{trace, warn};

use crate::{Image, Messenger, TransportError};

/// Prints every message to stdout, prefixed with its destination.
///
/// Images are summarized by size. Used by the console demo.
pub struct ConsoleMessenger {
    out: Mutex<Stdout>,
}

impl ConsoleMessenger {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }

    async fn write(&self, line: String) -> Result<(), TransportError> {
        let mut out = self.out.lock().await;
        let written = match out.write_all(line.as_bytes()).await {
            Ok(()) => out.flush().await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => {
                trace!(bytes = line.len(), "console message written");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "console write failed");
                Err(TransportError::SendFailed(e))
            }
        }
    }
}

impl Default for ConsoleMessenger {
    fn default() -> Self {
        Self::new()
    }
}

impl Messenger for ConsoleMessenger {
    async fn send_to_channel(&self, channel: &ChannelId, text: &str) -> Result<(), TransportError> {
        self.write(format!("[#{channel}]\n{text}\n\n")).await
    }

    async fn send_to_player(
        &self,
        player: &PlayerId,
        text: &str,
        image: Option<&Image>,
    ) -> Result<(), TransportError> {
        let attachment = match image {
            Some(img) => format!("\n(image, {} bytes)", img.len()),
            None => String::new(),
        };
        self.write(format!("[@{player} private]\n{text}{attachment}\n\n"))
            .await
    }
}
