//! The text command surface.
//!
//! Players drive the game by typing short commands. Group-channel verbs
//! manage the room and the public side of play; private verbs deal with
//! the hidden hand. A command sent in the wrong scope is rejected here,
//! before it ever reaches a room.

use crate::{ProtocolError, WireColor};

/// Optional leading words that mark a message as addressed to the bar.
pub const COMMAND_PREFIXES: [&str; 4] = ["/bar", "bar", "/liarsbar", "liarsbar"];

/// Where a command was typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The shared group channel that hosts (or will host) a room.
    Group,
    /// A direct conversation between one player and the bot.
    Private,
}

impl Scope {
    fn describe(self) -> &'static str {
        match self {
            Scope::Group => "a group channel",
            Scope::Private => "a private chat",
        }
    }
}

/// A parsed player command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a room in this channel; the sender becomes owner.
    Create,
    /// Join this channel's room.
    Join,
    /// Owner (or admin) starts the game.
    Start,
    /// Show phase, round, turn and player list.
    Status,
    /// Challenge the pending claim.
    Challenge,
    /// Cut a wire, by 1-based slot number.
    CutWire(usize),
    /// Owner (or admin) closes the room.
    End,
    /// Show usage for the current scope.
    Help,
    /// Privately show my hand.
    Hand,
    /// Privately play the cards at these 1-based hand positions.
    Play(Vec<usize>),
}

impl Command {
    /// The scope this command must be issued from, or `None` if it is
    /// valid everywhere.
    pub fn required_scope(&self) -> Option<Scope> {
        match self {
            Command::Help => None,
            Command::Hand | Command::Play(_) => Some(Scope::Private),
            _ => Some(Scope::Group),
        }
    }
}

/// Parses a raw chat message into a [`Command`].
///
/// An empty message (or a bare prefix) means `Help`. Verbs are matched
/// case-insensitively.
///
/// # Errors
/// - [`ProtocolError::UnknownCommand`] for an unrecognized verb
/// - [`ProtocolError::WrongScope`] for a verb typed in the other scope
/// - [`ProtocolError::MissingArgument`] / [`ProtocolError::InvalidArgument`]
///   for malformed `cut` or `play` arguments
pub fn parse_command(text: &str, scope: Scope) -> Result<Command, ProtocolError> {
    let mut tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    if let Some(first) = tokens.first() {
        let lower = first.to_ascii_lowercase();
        if COMMAND_PREFIXES.contains(&lower.as_str()) {
            tokens.remove(0);
        }
    }

    let Some((verb, args)) = tokens.split_first() else {
        return Ok(Command::Help);
    };
    let verb = verb.to_ascii_lowercase();

    let command = match verb.as_str() {
        "help" | "h" | "?" => Command::Help,
        "create" | "open" => Command::Create,
        "join" => Command::Join,
        "start" => Command::Start,
        "status" | "state" => Command::Status,
        "challenge" | "liar" | "call" => Command::Challenge,
        "cut" | "wire" => Command::CutWire(parse_wire(args)?),
        "end" | "close" | "exit" => Command::End,
        "hand" | "cards" => Command::Hand,
        "play" => Command::Play(parse_indices(args)?),
        _ => return Err(ProtocolError::UnknownCommand(verb)),
    };

    match command.required_scope() {
        Some(required) if required != scope => Err(ProtocolError::WrongScope {
            verb,
            expected: required.describe(),
        }),
        _ => Ok(command),
    }
}

fn parse_wire(args: &[&str]) -> Result<usize, ProtocolError> {
    let raw = args
        .first()
        .ok_or(ProtocolError::MissingArgument("wire choice"))?;
    if let Ok(slot) = raw.parse::<usize>() {
        return Ok(slot);
    }
    WireColor::from_name(raw)
        .map(WireColor::slot)
        .ok_or_else(|| ProtocolError::InvalidArgument(format!("unknown wire `{raw}`")))
}

fn parse_indices(args: &[&str]) -> Result<Vec<usize>, ProtocolError> {
    if args.is_empty() {
        return Err(ProtocolError::MissingArgument("card positions"));
    }
    args.iter()
        .map(|raw| {
            raw.parse::<usize>().map_err(|_| {
                ProtocolError::InvalidArgument(format!("`{raw}` is not a card position"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_help() {
        assert_eq!(parse_command("", Scope::Group).unwrap(), Command::Help);
        assert_eq!(parse_command("/bar", Scope::Private).unwrap(), Command::Help);
    }

    #[test]
    fn test_prefix_is_optional() {
        assert_eq!(parse_command("/bar join", Scope::Group).unwrap(), Command::Join);
        assert_eq!(parse_command("join", Scope::Group).unwrap(), Command::Join);
        assert_eq!(parse_command("LIARSBAR Start", Scope::Group).unwrap(), Command::Start);
    }

    #[test]
    fn test_challenge_aliases() {
        for text in ["challenge", "liar", "call"] {
            assert_eq!(parse_command(text, Scope::Group).unwrap(), Command::Challenge);
        }
    }

    #[test]
    fn test_cut_accepts_number_or_colour() {
        assert_eq!(parse_command("cut 2", Scope::Group).unwrap(), Command::CutWire(2));
        assert_eq!(parse_command("wire yellow", Scope::Group).unwrap(), Command::CutWire(3));
        assert_eq!(parse_command("cut R", Scope::Group).unwrap(), Command::CutWire(1));
    }

    #[test]
    fn test_cut_without_choice_is_rejected() {
        let err = parse_command("cut", Scope::Group).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingArgument(_)));
    }

    #[test]
    fn test_cut_with_unknown_colour_is_rejected() {
        let err = parse_command("cut green", Scope::Group).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidArgument(_)));
    }

    #[test]
    fn test_play_parses_positions_with_commas_and_spaces() {
        assert_eq!(
            parse_command("/bar play 2 4,5", Scope::Private).unwrap(),
            Command::Play(vec![2, 4, 5])
        );
    }

    #[test]
    fn test_play_rejects_non_numeric_position() {
        let err = parse_command("play 1 x", Scope::Private).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidArgument(_)));
    }

    #[test]
    fn test_play_in_group_is_wrong_scope() {
        let err = parse_command("play 1", Scope::Group).unwrap_err();
        assert!(matches!(err, ProtocolError::WrongScope { .. }));
    }

    #[test]
    fn test_join_in_private_is_wrong_scope() {
        let err = parse_command("join", Scope::Private).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::WrongScope { expected: "a group channel", .. }
        ));
    }

    #[test]
    fn test_unknown_verb() {
        let err = parse_command("dance", Scope::Group).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownCommand(v) if v == "dance"));
    }

    #[test]
    fn test_help_valid_in_both_scopes() {
        assert_eq!(parse_command("help", Scope::Group).unwrap(), Command::Help);
        assert_eq!(parse_command("?", Scope::Private).unwrap(), Command::Help);
    }
}
