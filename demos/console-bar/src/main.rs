//! Plays Liar's Bar in a terminal.
//!
//! Every stdin line is one chat message:
//!
//! ```text
//! @alice #general /bar create     group message from alice in #general
//! @bob #general /bar join
//! @alice /bar hand                private message from alice
//! @carl! #general /bar end        `!` marks the sender as an admin
//! ```
//!
//! Run with an optional config file: `console-bar bar.toml`.

use std::path::PathBuf;
use std::sync::Arc;

use bluffhall::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Input parsing
// ---------------------------------------------------------------------------

/// Turns `@name [#channel] text` into an inbound message.
fn parse_line(line: &str) -> Option<Inbound> {
    let line = line.trim();
    let rest = line.strip_prefix('@')?;
    let (who, rest) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let (name, admin) = match who.strip_suffix('!') {
        Some(name) => (name, true),
        None => (who, false),
    };
    if name.is_empty() {
        return None;
    }
    let sender = PlayerTag::new(name, name);

    let rest = rest.trim_start();
    let inbound = match rest.strip_prefix('#') {
        Some(rest) => {
            let (channel, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            Inbound::group(ChannelId::new(channel), sender, text.trim())
        }
        None => Inbound::private(sender, rest),
    };
    Some(if admin { inbound.as_admin() } else { inbound })
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = BarConfig::load(path.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let tavern = TavernBuilder::new()
        .config(config)
        .build(Arc::new(ConsoleMessenger::new()), Arc::new(NullRenderer))
        .await?;
    tracing::info!("type `@alice #general /bar create` to begin; Ctrl-D quits");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match parse_line(&line) {
                    Some(inbound) => {
                        tavern.handle(inbound).await;
                    }
                    None => eprintln!("expected `@name [#channel] text`"),
                },
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tavern.shutdown().await?;
    Ok(())
}
