//! Everything players read.
//!
//! Rooms emit [`Notice`]s and errors; the [`Narrator`] turns them into
//! chat text. With guide mode on, most texts end with a "Next:" line
//! telling players what to type.

use bluffhall_protocol::{Card, ProtocolError, Scope, Suit, WireColor};
use bluffhall_room::{
    CloseReason, DeckSpec, Elimination, HandView, Notice, RoomError, StatusView, Verdict,
    WireStage,
};

use crate::BarConfig;

/// Renders notices, views and errors as text.
#[derive(Debug, Clone)]
pub struct Narrator {
    guide: bool,
    play_timeout: u64,
    wire_timeout: u64,
}

impl Narrator {
    pub fn new(config: &BarConfig) -> Self {
        Self {
            guide: config.guide_mode,
            play_timeout: config.play_timeout_seconds,
            wire_timeout: config.wire_timeout_seconds,
        }
    }

    /// Appends a "Next:" hint when guide mode is on.
    pub fn guide(&self, body: &str, next: &str) -> String {
        let body = body.trim_end();
        if !self.guide || next.is_empty() {
            return body.to_string();
        }
        if body.is_empty() {
            format!("Next: {next}")
        } else {
            format!("{body}\n\nNext: {next}")
        }
    }

    // -- Notices -------------------------------------------------------------

    pub fn notice(&self, notice: &Notice) -> String {
        match notice {
            Notice::RoomCreated { owner, max_players } => self.guide(
                &format!("{} opened a Liar's Bar room (up to {max_players} players).", owner.name),
                "others send /bar join; the owner sends /bar start once 3 or more are seated.",
            ),
            Notice::PlayerJoined {
                player,
                owner,
                seated,
                max_players,
                min_players,
            } => {
                let body = format!(
                    "{} joined the room. Seated: {seated}/{max_players}. Owner: {}.",
                    player.name, owner.name
                );
                let next = if seated >= min_players {
                    format!("{} can send /bar start.", owner.name)
                } else {
                    format!("{} more player(s) needed to start.", min_players - seated)
                };
                self.guide(&body, &next)
            }
            Notice::GameStarted { players, deck } => {
                let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
                format!(
                    "The game begins with {}.\n\n{}",
                    names.join(", "),
                    self.rules(deck)
                )
            }
            Notice::RoundStarted {
                round,
                target,
                opener,
                deck,
                alive,
                undealt,
            } => self.guide(
                &format!(
                    "Round {round}. Target: {target}.\n{alive} players were dealt a fresh hand; {undealt} card(s) stay undealt.\nDeck: {}\n{} opens.",
                    deck_line(deck),
                    opener.name
                ),
                &format!("{}, play privately with /bar play 1 3.", opener.name),
            ),
            Notice::Hand(view) => self.hand(view),
            Notice::CardsPlayed {
                player,
                count,
                target,
                responder,
                remaining,
            } => self.guide(
                &format!(
                    "{} played {count} card(s), claiming all are {target}. {remaining} card(s) left in hand.",
                    player.name
                ),
                &format!(
                    "{}: /bar challenge here, or play over it privately.",
                    responder.name
                ),
            ),
            Notice::PlayAccepted { cards, remaining } => format!(
                "You played: {}. {remaining} card(s) left.",
                card_names(cards)
            ),
            Notice::AutoChallenge {
                challenger,
                claimant,
            } => format!(
                "Automatic challenge: {} calls {}'s claim.",
                challenger.name, claimant.name
            ),
            Notice::ChallengeResolved {
                challenger,
                claimant,
                revealed,
                target,
                verdict,
                penalized,
            } => {
                let judged = match verdict {
                    Verdict::Truthful => "the claim was true",
                    Verdict::Lie => "the claim was a lie",
                };
                format!(
                    "{} challenged {}. Revealed: {} (target {target}), so {judged}. {} must cut a wire.",
                    challenger.name,
                    claimant.name,
                    card_names(revealed),
                    penalized.name
                )
            }
            Notice::PenaltyStarted {
                player,
                stage,
                offered,
            } => self.guide(
                &format!(
                    "{} faces the bomb (stage {stage}). Wires: {}.",
                    player.name,
                    wire_names(offered)
                ),
                &format!(
                    "{}: /bar cut {} within {}s.",
                    player.name,
                    wire_choices(offered),
                    self.wire_timeout
                ),
            ),
            Notice::WireCut {
                player,
                outcome,
                by_timeout,
                next_stage,
            } => {
                let lead = if *by_timeout {
                    format!("Time is up. A wire was cut for {}: ", player.name)
                } else {
                    format!("{} cut the ", player.name)
                };
                match next_stage {
                    None => format!("{lead}{} wire. BOOM! {} is out.", outcome.cut, player.name),
                    Some(next) => format!(
                        "{lead}{} wire and survived. Their next bomb is stage {next}.",
                        outcome.cut
                    ),
                }
            }
            Notice::PlayTimedOut { player } => format!(
                "{} did not play within {}s and is eliminated.",
                player.name, self.play_timeout
            ),
            Notice::TurnPassed {
                player,
                must_respond,
            } => {
                if *must_respond {
                    self.guide(
                        &format!("{} must now answer the claim on the table.", player.name),
                        "/bar challenge here, or play over it privately.",
                    )
                } else {
                    self.guide(
                        &format!("{}'s turn to play.", player.name),
                        &format!("{}, play privately with /bar play 1 3.", player.name),
                    )
                }
            }
            Notice::RoundEnded { round } => {
                format!("Round {round} is over: no one has cards left. Dealing a new round.")
            }
            Notice::GameOver { winner } => match winner {
                Some(winner) => self.guide(
                    &format!("{} is the last one standing and wins!", winner.name),
                    "send /bar create to play again.",
                ),
                None => self.guide("Game over with no survivors.", "send /bar create to play again."),
            },
            Notice::RoomClosed { reason } => match reason {
                CloseReason::EndedBy(who) => self.guide(
                    &format!("{} closed the room.", who.name),
                    "send /bar create to open a new one.",
                ),
                CloseReason::Idle => self.guide(
                    "The room sat idle too long and was closed.",
                    "send /bar create to open a new one.",
                ),
            },
        }
    }

    /// Private prompt sent to a penalized player with the bomb image.
    pub fn penalty_prompt(&self, stage: WireStage, offered: &[WireColor]) -> String {
        self.guide(
            &format!("You must cut a wire (stage {stage}): {}.", wire_names(offered)),
            &format!("in the group, send /bar cut {}.", wire_choices(offered)),
        )
    }

    /// The rules sheet posted when a game starts.
    pub fn rules(&self, deck: &DeckSpec) -> String {
        [
            "Liar's Bar rules".to_string(),
            "1) Each round draws a random target (Sun, Moon or Star) and deals 5 cards to every player still alive.".to_string(),
            "2) Cards are played privately; the group only sees how many were played.".to_string(),
            "3) The next player may /bar challenge. One non-matching card makes the claim a lie; Jokers always match.".to_string(),
            "4) The loser of a challenge cuts a wire: 1 of 3, then 1 of 2, then the last wire always explodes.".to_string(),
            format!(
                "5) Play within {}s or you are out; cut within {}s or a wire is cut for you.",
                self.play_timeout, self.wire_timeout
            ),
            "6) Empty your hand and the next player challenges you automatically.".to_string(),
            "7) One room per player. Send /bar help at any time.".to_string(),
            format!("8) The deck is fixed for the whole game: {}", deck_line(deck)),
        ]
        .join("\n")
    }

    // -- Views ---------------------------------------------------------------

    pub fn hand(&self, view: &HandView) -> String {
        if !view.alive {
            let why = match view.eliminated {
                Some(Elimination::WireCut) => "You were blown up",
                Some(Elimination::PlayTimeout) => "You ran out of time",
                None => "You are out",
            };
            return self.guide(
                &format!("{why} and can no longer play in {}.", view.channel),
                "wait for the game to end, then open a new room.",
            );
        }
        let target = view.target.map_or("not drawn yet", Suit::label);
        let cards = if view.cards.is_empty() {
            "(empty)".to_string()
        } else {
            numbered(&view.cards)
        };
        self.guide(
            &format!(
                "Room: {}\nRound: {}\nTarget: {target}\nYour hand: {cards}",
                view.channel, view.round
            ),
            "on your turn, send /bar play 2 4 5. Send /bar hand to see this again.",
        )
    }

    pub fn status(&self, view: &StatusView) -> String {
        let mut lines = vec![
            format!("Room in {}: {}", view.channel, view.phase),
            format!("Owner: {}", view.owner.name),
            format!("Seats: {}/{}", view.seats.len(), view.max_players),
        ];
        if view.round > 0 {
            lines.push(format!("Round: {}", view.round));
        }
        if let Some(target) = view.target {
            lines.push(format!("Target: {target}"));
        }
        if let Some(deck) = &view.deck {
            lines.push(format!("Deck: {} ({} undealt)", deck_line(deck), view.undealt));
        }
        if let Some((claimant, count)) = &view.claim {
            lines.push(format!("On the table: {} claims {count} card(s)", claimant.name));
        }
        if let Some(stage) = view.penalty_stage {
            lines.push(format!("Bomb stage: {stage}"));
        }
        if let Some(who) = &view.waiting_on {
            match view.time_left {
                Some(left) => lines.push(format!("Waiting on: {} ({}s left)", who.name, left.as_secs())),
                None => lines.push(format!("Waiting on: {}", who.name)),
            }
        }
        lines.push("Players:".to_string());
        for seat in &view.seats {
            let line = match seat.eliminated {
                Some(Elimination::WireCut) => format!("- {}: out (wire)", seat.player.name),
                Some(Elimination::PlayTimeout) => format!("- {}: out (timeout)", seat.player.name),
                None => format!(
                    "- {}: {} card(s), bomb stage {}",
                    seat.player.name, seat.cards, seat.wire_stage
                ),
            };
            lines.push(line);
        }
        self.guide(
            &lines.join("\n"),
            "/bar challenge, /bar cut, /bar end or /bar help.",
        )
    }

    pub fn help(&self, scope: Scope) -> String {
        let body = match scope {
            Scope::Group => [
                "Liar's Bar commands (group):",
                "/bar create  open a room here",
                "/bar join  take a seat",
                "/bar start  owner starts the game (3 to 5 players)",
                "/bar status  phase, turn and players",
                "/bar challenge  call the claim on the table",
                "/bar cut red|blue|yellow  cut a wire (1/2/3 also work)",
                "/bar end  owner or admin closes the room",
                "Privately: /bar hand, /bar play 2 4 5",
            ]
            .join("\n"),
            Scope::Private => [
                "Liar's Bar commands (private):",
                "/bar hand  show your hand",
                "/bar play 2 4 5  play the cards at those positions",
                "Everything else happens in the group.",
            ]
            .join("\n"),
        };
        self.guide(&body, "open a room in a group with /bar create.")
    }

    // -- Errors --------------------------------------------------------------

    pub fn room_error(&self, err: &RoomError) -> String {
        match err {
            RoomError::AlreadyExists(_) => self.guide(
                "This channel already has a room.",
                "send /bar join, or /bar status to see it.",
            ),
            RoomError::PlayerBusy { channel, .. } => self.guide(
                &format!("You are already in the room in {channel}."),
                "finish that game first.",
            ),
            RoomError::RoomFull(_) => self.guide(
                "The room is full.",
                "wait for the next game, or ask the owner to /bar end it.",
            ),
            RoomError::AlreadyJoined(_) => self.guide(
                "You already joined this room.",
                "the owner sends /bar start once 3 or more are seated.",
            ),
            RoomError::WrongPhase(phase) => self.guide(
                &format!("That can't be done while the room is {phase}."),
                "send /bar status to see what is needed.",
            ),
            RoomError::NotAuthorized(_) => self.guide(
                "Only the room owner or an admin can do that.",
                "ask the owner.",
            ),
            RoomError::NotEnoughPlayers { needed, have } => self.guide(
                &format!("At least {needed} players are needed; {have} seated."),
                "more players send /bar join.",
            ),
            RoomError::NoRoom(_) => self.guide("There is no room here.", "send /bar create to open one."),
            RoomError::NotInRoom(_) => self.guide(
                "You are not in any bar room.",
                "send /bar create or /bar join in a group.",
            ),
            RoomError::NotYourTurn { expected } => {
                self.guide(&format!("It is {expected}'s turn."), "wait for your turn.")
            }
            RoomError::InvalidIndices(why) => self.guide(
                &format!("Those card positions don't work: {why}."),
                "send /bar hand to check the positions, then /bar play again.",
            ),
            RoomError::InvalidChoice { slots, .. } => {
                let offered = WireColor::offered(*slots);
                self.guide(
                    &format!("That wire is not offered. Choose from: {}.", wire_names(offered)),
                    &format!("send /bar cut {}.", wire_choices(offered)),
                )
            }
            RoomError::Unreachable(players) => {
                let names: Vec<String> = players.iter().map(ToString::to_string).collect();
                self.guide(
                    &format!(
                        "These players can't receive private messages: {}.",
                        names.join(", ")
                    ),
                    "message the bot privately once, then the owner sends /bar start again.",
                )
            }
            RoomError::Unavailable(_) => self.guide("The room is busy or closing.", "try again."),
        }
    }

    pub fn protocol_error(&self, err: &ProtocolError) -> String {
        match err {
            ProtocolError::UnknownCommand(_) => {
                self.guide("Unknown bar command.", "send /bar help for usage.")
            }
            ProtocolError::WrongScope { verb, expected } => self.guide(
                &format!("`{verb}` only works in {expected}."),
                "send /bar help to see what works here.",
            ),
            other => self.guide(&format!("{other}."), "send /bar help for usage."),
        }
    }
}

/// "Sun x6, Moon x6, Star x6, Joker x2 (20 cards)".
pub fn deck_line(deck: &DeckSpec) -> String {
    let parts: Vec<String> = Suit::ALL
        .iter()
        .map(|s| format!("{s} x{}", deck.count(*s)))
        .collect();
    format!("{} ({} cards)", parts.join(", "), deck.total)
}

fn numbered(cards: &[Card]) -> String {
    cards
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}:{c}", i + 1))
        .collect::<Vec<_>>()
        .join("  ")
}

fn card_names(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn wire_names(offered: &[WireColor]) -> String {
    offered
        .iter()
        .map(|w| format!("{}({})", w, w.slot()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn wire_choices(offered: &[WireColor]) -> String {
    offered
        .iter()
        .map(|w| w.label())
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bluffhall_protocol::{ChannelId, PlayerId};
    use bluffhall_room::{suit_counts, PlayerTag};

    fn narrator(guide: bool) -> Narrator {
        Narrator::new(&BarConfig {
            guide_mode: guide,
            ..BarConfig::default()
        })
    }

    #[test]
    fn test_guide_mode_appends_next_line() {
        assert_eq!(narrator(true).guide("Hi.", "go"), "Hi.\n\nNext: go");
        assert_eq!(narrator(false).guide("Hi.", "go"), "Hi.");
        assert_eq!(narrator(true).guide("", "go"), "Next: go");
    }

    #[test]
    fn test_deck_line() {
        let deck = DeckSpec {
            total: 20,
            counts: suit_counts(20),
        };
        assert_eq!(deck_line(&deck), "Sun x6, Moon x6, Star x6, Joker x2 (20 cards)");
    }

    #[test]
    fn test_hand_lists_numbered_cards() {
        let view = HandView {
            channel: ChannelId::new("g"),
            round: 2,
            target: Some(Suit::Moon),
            cards: vec![Card::new(0, Suit::Sun), Card::new(1, Suit::Joker)],
            alive: true,
            eliminated: None,
        };
        let text = narrator(false).hand(&view);
        assert!(text.contains("Target: Moon"));
        assert!(text.contains("1:Sun  2:Joker"));
    }

    #[test]
    fn test_played_cards_never_named_in_public_text() {
        let text = narrator(true).notice(&Notice::CardsPlayed {
            player: PlayerTag::new("a", "Ann"),
            count: 2,
            target: Suit::Star,
            responder: PlayerTag::new("b", "Bo"),
            remaining: 3,
        });
        assert!(text.contains("Ann played 2 card(s)"));
        assert!(text.contains("Next: Bo"));
        assert!(!text.contains("Joker"));
    }

    #[test]
    fn test_invalid_wire_lists_offered_wires() {
        let text = narrator(true).room_error(&RoomError::InvalidChoice { choice: 3, slots: 2 });
        assert!(text.contains("red(1) blue(2)"));
        assert!(text.contains("/bar cut red|blue"));
    }

    #[test]
    fn test_unreachable_names_players() {
        let text = narrator(false).room_error(&RoomError::Unreachable(vec![
            PlayerId::new("p1"),
            PlayerId::new("p2"),
        ]));
        assert!(text.contains("p1, p2"));
    }

    #[test]
    fn test_wrong_scope_hint() {
        let text = narrator(false).protocol_error(&ProtocolError::WrongScope {
            verb: "play".into(),
            expected: "a private chat",
        });
        assert_eq!(text, "`play` only works in a private chat.");
    }
}
