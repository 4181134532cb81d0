//! The turn engine: a room's full game state and every transition on it.
//!
//! Each public transition either fails without touching state or applies
//! completely, bumps [`Room::epoch`] and returns the notices it produced.
//! Transitions are synchronous and never perform I/O; the room actor
//! calls them one at a time.

use bluffhall_protocol::{Card, ChannelId, PlayerId, Recipient, Suit};
use bluffhall_timer::TimerKind;
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::challenge::judge;
use crate::deck::{DeckAllocator, DeckSpec};
use crate::notice::{CloseReason, HandView, Notice, PlayerTag, SeatView, StatusView};
use crate::penalty::{CutOutcome, PenaltyEngine, PenaltyState, WireStage};
use crate::{Action, Phase, RoomConfig, RoomError};

/// Notices produced by one transition, in order.
pub type Notices = Vec<(Recipient, Notice)>;

// ---------------------------------------------------------------------------
// Players and claims
// ---------------------------------------------------------------------------

/// How a player left the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Elimination {
    /// Cut the live wire.
    WireCut,
    /// Let the play timer run out.
    PlayTimeout,
}

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Cards in the order shown to the player.
    pub hand: Vec<Card>,
    pub alive: bool,
    pub eliminated: Option<Elimination>,
    /// Stage of this player's next wire cut.
    pub wire_stage: WireStage,
}

impl Player {
    pub fn new(tag: PlayerTag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            hand: Vec::new(),
            alive: true,
            eliminated: None,
            wire_stage: WireStage::FIRST,
        }
    }

    pub fn tag(&self) -> PlayerTag {
        PlayerTag {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    fn holds_cards(&self) -> bool {
        self.alive && !self.hand.is_empty()
    }
}

/// The cards on the table, face down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claimant: PlayerId,
    /// Publicly announced count.
    pub declared: usize,
    /// The actual cards, hidden until challenged.
    pub cards: Vec<Card>,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// A room and its game. This is also the persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub channel: ChannelId,
    pub owner: PlayerId,
    pub phase: Phase,
    /// Seats in join order. Eliminated players keep their seat.
    pub players: Vec<Player>,
    pub target: Option<Suit>,
    /// Undealt cards.
    pub pool: Vec<Card>,
    /// Cards played or lost this round.
    pub discard: Vec<Card>,
    pub deck: Option<DeckSpec>,
    pub initial_player_count: usize,
    pub hand_size: usize,
    pub round: u32,
    /// Seat that opened the current round.
    pub lead: usize,
    pub claim: Option<Claim>,
    pub penalty: Option<PenaltyState>,
    /// Bumped on every accepted transition. Timers compare against it.
    pub epoch: u64,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Room {
    /// Opens a lobby with `owner` in the first seat.
    pub fn new(channel: ChannelId, owner: PlayerTag, now: DateTime<Utc>) -> Self {
        Self {
            channel,
            owner: owner.id.clone(),
            phase: Phase::WaitingForPlayers,
            players: vec![Player::new(owner)],
            target: None,
            pool: Vec::new(),
            discard: Vec::new(),
            deck: None,
            initial_player_count: 0,
            hand_size: 0,
            round: 0,
            lead: 0,
            claim: None,
            penalty: None,
            epoch: 0,
            created_at: now,
            last_activity: now,
        }
    }

    // -- Lobby ---------------------------------------------------------------

    /// Seats a player.
    pub fn join(
        &mut self,
        who: PlayerTag,
        cfg: &RoomConfig,
        now: DateTime<Utc>,
    ) -> Result<Notices, RoomError> {
        self.require(Action::Join)?;
        if self.seat_of(&who.id).is_some() {
            return Err(RoomError::AlreadyJoined(who.id));
        }
        if self.players.len() >= cfg.max_players {
            return Err(RoomError::RoomFull(self.channel.clone()));
        }

        self.players.push(Player::new(who.clone()));
        self.touch(now);
        info!(room = %self.channel, player = %who.id, seated = self.players.len(), "player joined");

        Ok(vec![(
            Recipient::Channel,
            Notice::PlayerJoined {
                player: who,
                owner: self.tag_of(&self.owner),
                seated: self.players.len(),
                max_players: cfg.max_players,
                min_players: cfg.min_players,
            },
        )])
    }

    /// Locks the deck and deals the first round.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        requester: &PlayerId,
        is_admin: bool,
        cfg: &RoomConfig,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Notices, RoomError> {
        self.require(Action::Start)?;
        self.authorize(requester, is_admin)?;
        if self.players.len() < cfg.min_players {
            return Err(RoomError::NotEnoughPlayers {
                needed: cfg.min_players,
                have: self.players.len(),
            });
        }

        let (spec, cards) = DeckAllocator::lock(self.players.len(), cfg.hand_size);
        self.initial_player_count = self.players.len();
        self.hand_size = cfg.hand_size;
        self.pool = cards;
        self.discard.clear();
        self.claim = None;
        self.penalty = None;
        self.round = 0;
        self.lead = 0;
        for p in &mut self.players {
            p.hand.clear();
            p.alive = true;
            p.eliminated = None;
            p.wire_stage = WireStage::FIRST;
        }

        info!(room = %self.channel, players = self.initial_player_count, deck = spec.total, "game started");
        let mut out = vec![(
            Recipient::Channel,
            Notice::GameStarted {
                players: self.players.iter().map(Player::tag).collect(),
                deck: spec.clone(),
            },
        )];
        self.deck = Some(spec);
        self.begin_round(rng, &mut out);
        self.touch(now);
        Ok(out)
    }

    /// Closes the room early. Owner or admin only.
    pub fn end(
        &mut self,
        requester: &PlayerTag,
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> Result<Notices, RoomError> {
        self.require(Action::End)?;
        self.authorize(&requester.id, is_admin)?;

        self.close_table();
        self.phase = Phase::GameEnd { winner: None };
        self.touch(now);
        info!(room = %self.channel, by = %requester.id, "room ended");

        Ok(vec![(
            Recipient::Channel,
            Notice::RoomClosed {
                reason: CloseReason::EndedBy(requester.clone()),
            },
        )])
    }

    /// Closes a lobby whose last activity is at least `ttl` old.
    ///
    /// Returns `None` (and changes nothing) for started or fresh rooms.
    pub fn reap(&mut self, ttl: TimeDelta, now: DateTime<Utc>) -> Option<Notices> {
        if !self.phase.accepts(Action::Reap) || now - self.last_activity < ttl {
            return None;
        }
        self.phase = Phase::GameEnd { winner: None };
        self.epoch += 1;
        info!(room = %self.channel, idle_since = %self.last_activity, "idle room reaped");
        Some(vec![(
            Recipient::Channel,
            Notice::RoomClosed {
                reason: CloseReason::Idle,
            },
        )])
    }

    // -- Play ----------------------------------------------------------------

    /// Plays the cards at 1-based `positions` from `player`'s hand as a
    /// claim of the target suit.
    pub fn play(
        &mut self,
        player: &PlayerId,
        positions: &[usize],
        now: DateTime<Utc>,
    ) -> Result<Notices, RoomError> {
        self.require(Action::Play)?;
        let seat = self.expect_turn(player)?;
        let picked = validate_positions(positions, self.players[seat].hand.len())?;
        let (Some(target), Some(responder)) = (self.target, self.next_alive_after(seat)) else {
            return Err(RoomError::WrongPhase(self.phase.label()));
        };

        let hand = &mut self.players[seat].hand;
        let cards: Vec<Card> = picked.iter().map(|&i| hand[i]).collect();
        for &i in picked.iter().rev() {
            hand.remove(i);
        }
        let remaining = hand.len();

        if let Some(previous) = self.claim.take() {
            self.discard.extend(previous.cards);
        }
        self.claim = Some(Claim {
            claimant: player.clone(),
            declared: cards.len(),
            cards: cards.clone(),
        });

        debug!(room = %self.channel, %player, count = cards.len(), remaining, "cards played");
        let mut out = vec![
            (
                Recipient::Channel,
                Notice::CardsPlayed {
                    player: self.players[seat].tag(),
                    count: cards.len(),
                    target,
                    responder: self.players[responder].tag(),
                    remaining,
                },
            ),
            (
                Recipient::Player(player.clone()),
                Notice::PlayAccepted { cards, remaining },
            ),
        ];
        if remaining > 0 {
            out.push((Recipient::Player(player.clone()), Notice::Hand(self.hand_of(seat))));
        }

        if remaining == 0 || self.players[responder].hand.is_empty() {
            out.push((
                Recipient::Channel,
                Notice::AutoChallenge {
                    challenger: self.players[responder].tag(),
                    claimant: self.players[seat].tag(),
                },
            ));
            self.resolve_challenge(responder, &mut out);
        } else {
            self.phase = Phase::AwaitingChallengeOrNextPlay {
                responder: self.players[responder].id.clone(),
            };
        }

        self.touch(now);
        Ok(out)
    }

    /// The responder calls the claim on the table.
    pub fn challenge(&mut self, player: &PlayerId, now: DateTime<Utc>) -> Result<Notices, RoomError> {
        self.require(Action::Challenge)?;
        let seat = self.expect_turn(player)?;

        let mut out = Vec::new();
        self.resolve_challenge(seat, &mut out);
        self.touch(now);
        Ok(out)
    }

    /// The penalized player cuts wire `choice` (1-based).
    pub fn cut_wire<R: Rng + ?Sized>(
        &mut self,
        player: &PlayerId,
        choice: usize,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Notices, RoomError> {
        self.require(Action::CutWire)?;
        self.expect_turn(player)?;
        let stage = self.penalty_stage()?;
        let outcome = PenaltyEngine::cut(stage, choice, rng)?;

        let mut out = Vec::new();
        self.apply_cut(outcome, false, rng, &mut out);
        self.touch(now);
        Ok(out)
    }

    // -- Timeouts ------------------------------------------------------------

    /// The player who owed a play ran out of time. They are eliminated
    /// and the round carries on without a redeal.
    pub fn play_timeout<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Notices, RoomError> {
        self.require(Action::PlayTimeout)?;
        let Some(late) = self.phase.waiting_on().cloned() else {
            return Err(RoomError::WrongPhase(self.phase.label()));
        };
        let seat = self.seat(&late)?;

        self.eliminate(seat, Elimination::PlayTimeout);
        info!(room = %self.channel, player = %late, "player eliminated by play timeout");
        let mut out = vec![(
            Recipient::Channel,
            Notice::PlayTimedOut {
                player: self.players[seat].tag(),
            },
        )];

        if self.alive_count() <= 1 {
            self.finish(&mut out);
        } else if let Some(claimant) = self.claim.as_ref().map(|c| c.claimant.clone()) {
            // the claim passes to the next player in line, who is never
            // the claimant while two or more players remain
            match self.next_alive_after(seat) {
                Some(next) if self.players[next].hand.is_empty() => {
                    out.push((
                        Recipient::Channel,
                        Notice::AutoChallenge {
                            challenger: self.players[next].tag(),
                            claimant: self.tag_of(&claimant),
                        },
                    ));
                    self.resolve_challenge(next, &mut out);
                }
                Some(next) => {
                    self.phase = Phase::AwaitingChallengeOrNextPlay {
                        responder: self.players[next].id.clone(),
                    };
                    out.push((
                        Recipient::Channel,
                        Notice::TurnPassed {
                            player: self.players[next].tag(),
                            must_respond: true,
                        },
                    ));
                }
                None => self.finish(&mut out),
            }
        } else {
            self.continue_after(seat, rng, &mut out);
        }

        self.touch(now);
        Ok(out)
    }

    /// The penalized player ran out of time; a random wire is cut for them.
    pub fn wire_timeout<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Notices, RoomError> {
        self.require(Action::WireTimeout)?;
        let stage = self.penalty_stage()?;
        let choice = PenaltyEngine::random_choice(stage, rng);
        let outcome = PenaltyEngine::cut(stage, choice, rng)?;

        let mut out = Vec::new();
        self.apply_cut(outcome, true, rng, &mut out);
        self.touch(now);
        Ok(out)
    }

    /// Which timer the current phase needs, if any.
    pub fn pending_timer(&self) -> Option<TimerKind> {
        match self.phase {
            Phase::AwaitingPlay { .. } | Phase::AwaitingChallengeOrNextPlay { .. } => {
                Some(TimerKind::Play)
            }
            Phase::PenaltyPending { .. } => Some(TimerKind::Wire),
            _ => None,
        }
    }

    // -- Queries -------------------------------------------------------------

    /// `player`'s private view of their hand.
    pub fn hand_view(&self, player: &PlayerId) -> Result<HandView, RoomError> {
        let seat = self.seat(player)?;
        Ok(self.hand_of(seat))
    }

    /// Public snapshot for the status command.
    pub fn status(&self, cfg: &RoomConfig, time_left: Option<std::time::Duration>) -> StatusView {
        StatusView {
            channel: self.channel.clone(),
            owner: self.tag_of(&self.owner),
            phase: self.phase.clone(),
            round: self.round,
            target: self.target,
            seats: self
                .players
                .iter()
                .map(|p| SeatView {
                    player: p.tag(),
                    alive: p.alive,
                    cards: p.hand.len(),
                    wire_stage: p.wire_stage,
                    eliminated: p.eliminated,
                })
                .collect(),
            waiting_on: self.phase.waiting_on().map(|id| self.tag_of(id)),
            claim: self
                .claim
                .as_ref()
                .map(|c| (self.tag_of(&c.claimant), c.declared)),
            penalty_stage: self.penalty.as_ref().map(|p| p.stage),
            deck: self.deck.clone(),
            undealt: self.pool.len(),
            max_players: cfg.max_players,
            time_left,
        }
    }

    /// Everyone seated, in join order.
    pub fn members(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.alive).count()
    }

    /// Every card of the game wherever it is: hands, pool, discard and
    /// the claim on the table.
    pub fn cards_in_play(&self) -> usize {
        self.players.iter().map(|p| p.hand.len()).sum::<usize>()
            + self.pool.len()
            + self.discard.len()
            + self.claim.as_ref().map_or(0, |c| c.cards.len())
    }

    pub fn seat_of(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| &p.id == id)
    }

    /// Display tag for `id`, falling back to the raw id.
    pub fn tag_of(&self, id: &PlayerId) -> PlayerTag {
        match self.seat_of(id) {
            Some(seat) => self.players[seat].tag(),
            None => PlayerTag {
                id: id.clone(),
                name: id.to_string(),
            },
        }
    }

    // -- Internals -----------------------------------------------------------

    fn require(&self, action: Action) -> Result<(), RoomError> {
        if self.phase.accepts(action) {
            Ok(())
        } else {
            Err(RoomError::WrongPhase(self.phase.label()))
        }
    }

    fn authorize(&self, requester: &PlayerId, is_admin: bool) -> Result<(), RoomError> {
        if is_admin || *requester == self.owner {
            Ok(())
        } else {
            Err(RoomError::NotAuthorized(requester.clone()))
        }
    }

    fn seat(&self, id: &PlayerId) -> Result<usize, RoomError> {
        self.seat_of(id)
            .ok_or_else(|| RoomError::NotInRoom(id.clone()))
    }

    /// Seat of `player` if the phase is waiting on them.
    fn expect_turn(&self, player: &PlayerId) -> Result<usize, RoomError> {
        match self.phase.waiting_on() {
            Some(expected) if expected == player => self.seat(player),
            Some(expected) => Err(RoomError::NotYourTurn {
                expected: expected.clone(),
            }),
            None => Err(RoomError::WrongPhase(self.phase.label())),
        }
    }

    fn penalty_stage(&self) -> Result<WireStage, RoomError> {
        self.penalty
            .as_ref()
            .map(|p| p.stage)
            .ok_or(RoomError::WrongPhase(self.phase.label()))
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.epoch += 1;
        self.last_activity = now;
    }

    fn hand_of(&self, seat: usize) -> HandView {
        let p = &self.players[seat];
        HandView {
            channel: self.channel.clone(),
            round: self.round,
            target: self.target,
            cards: p.hand.clone(),
            alive: p.alive,
            eliminated: p.eliminated,
        }
    }

    /// Next alive seat after `seat`, skipping `seat` itself.
    fn next_alive_after(&self, seat: usize) -> Option<usize> {
        let n = self.players.len();
        (1..n)
            .map(|offset| (seat + offset) % n)
            .find(|&s| self.players[s].alive)
    }

    /// Next alive seat holding cards after `seat`, considering `seat`
    /// itself last.
    fn next_holder_after(&self, seat: usize) -> Option<usize> {
        let n = self.players.len();
        (1..=n)
            .map(|offset| (seat + offset) % n)
            .find(|&s| self.players[s].holds_cards())
    }

    fn eliminate(&mut self, seat: usize, reason: Elimination) {
        let p = &mut self.players[seat];
        p.alive = false;
        p.eliminated = Some(reason);
        self.discard.append(&mut p.hand);
    }

    /// Moves the claim and any penalty off the table.
    fn close_table(&mut self) {
        if let Some(claim) = self.claim.take() {
            self.discard.extend(claim.cards);
        }
        self.penalty = None;
    }

    fn resolve_challenge(&mut self, challenger: usize, out: &mut Notices) {
        let Some(claim) = self.claim.take() else {
            return;
        };
        let (Some(target), Some(claimant)) = (self.target, self.seat_of(&claim.claimant)) else {
            error!(room = %self.channel, "claim without target or claimant, discarding");
            self.discard.extend(claim.cards);
            return;
        };

        let verdict = judge(&claim.cards, target);
        let penalized = if verdict.is_lie() { claimant } else { challenger };
        info!(
            room = %self.channel,
            challenger = %self.players[challenger].id,
            claimant = %claim.claimant,
            ?verdict,
            "challenge resolved"
        );

        out.push((
            Recipient::Channel,
            Notice::ChallengeResolved {
                challenger: self.players[challenger].tag(),
                claimant: self.players[claimant].tag(),
                revealed: claim.cards.clone(),
                target,
                verdict,
                penalized: self.players[penalized].tag(),
            },
        ));
        self.discard.extend(claim.cards);
        self.enter_penalty(penalized, out);
    }

    fn enter_penalty(&mut self, seat: usize, out: &mut Notices) {
        let player = self.players[seat].id.clone();
        let stage = self.players[seat].wire_stage;
        self.penalty = Some(PenaltyState {
            player: player.clone(),
            stage,
        });
        self.phase = Phase::PenaltyPending { player };
        out.push((
            Recipient::Channel,
            Notice::PenaltyStarted {
                player: self.players[seat].tag(),
                stage,
                offered: stage.offered().to_vec(),
            },
        ));
    }

    fn apply_cut<R: Rng + ?Sized>(
        &mut self,
        outcome: CutOutcome,
        by_timeout: bool,
        rng: &mut R,
        out: &mut Notices,
    ) {
        let Some(penalty) = self.penalty.take() else {
            return;
        };
        let Some(seat) = self.seat_of(&penalty.player) else {
            return;
        };

        let next_stage = if outcome.exploded() {
            self.eliminate(seat, Elimination::WireCut);
            None
        } else {
            let next = penalty.stage.advanced();
            self.players[seat].wire_stage = next;
            Some(next)
        };
        info!(
            room = %self.channel,
            player = %penalty.player,
            stage = %penalty.stage,
            exploded = outcome.exploded(),
            by_timeout,
            "wire cut"
        );

        out.push((
            Recipient::Channel,
            Notice::WireCut {
                player: self.players[seat].tag(),
                outcome,
                by_timeout,
                next_stage,
            },
        ));
        self.continue_after(seat, rng, out);
    }

    /// Hands control to the next alive player with cards after `seat`,
    /// ending the round (or the game) when there is none.
    fn continue_after<R: Rng + ?Sized>(&mut self, seat: usize, rng: &mut R, out: &mut Notices) {
        if self.alive_count() <= 1 {
            self.finish(out);
            return;
        }
        match self.next_holder_after(seat) {
            Some(next) => {
                self.phase = Phase::AwaitingPlay {
                    active: self.players[next].id.clone(),
                };
                out.push((
                    Recipient::Channel,
                    Notice::TurnPassed {
                        player: self.players[next].tag(),
                        must_respond: false,
                    },
                ));
            }
            None => {
                self.phase = Phase::RoundEnd;
                out.push((Recipient::Channel, Notice::RoundEnded { round: self.round }));
                self.begin_round(rng, out);
            }
        }
    }

    /// Gathers every card back, deals fresh hands and draws a new target.
    fn begin_round<R: Rng + ?Sized>(&mut self, rng: &mut R, out: &mut Notices) {
        self.phase = Phase::RoundStart;
        if self.alive_count() <= 1 {
            self.finish(out);
            return;
        }

        self.close_table();
        for p in self.players.iter_mut() {
            self.pool.append(&mut p.hand);
        }
        self.pool.append(&mut self.discard);

        let alive: Vec<usize> = (0..self.players.len())
            .filter(|&s| self.players[s].alive)
            .collect();
        let Some(hands) = DeckAllocator::deal(&mut self.pool, alive.len(), self.hand_size, rng)
        else {
            error!(
                room = %self.channel,
                pool = self.pool.len(),
                alive = alive.len(),
                "deck too small to deal, ending game"
            );
            self.finish(out);
            return;
        };
        for (&seat, hand) in alive.iter().zip(hands) {
            self.players[seat].hand = hand;
        }

        self.round += 1;
        let target = DeckAllocator::draw_target(rng);
        self.target = Some(target);
        let opener = if self.round == 1 {
            alive[0]
        } else {
            self.next_alive_after(self.lead).unwrap_or(alive[0])
        };
        self.lead = opener;
        self.phase = Phase::AwaitingPlay {
            active: self.players[opener].id.clone(),
        };
        info!(room = %self.channel, round = self.round, %target, opener = %self.players[opener].id, "round started");

        if let Some(deck) = self.deck.clone() {
            out.push((
                Recipient::Channel,
                Notice::RoundStarted {
                    round: self.round,
                    target,
                    opener: self.players[opener].tag(),
                    deck,
                    alive: alive.len(),
                    undealt: self.pool.len(),
                },
            ));
        }
        for &seat in &alive {
            out.push((
                Recipient::Player(self.players[seat].id.clone()),
                Notice::Hand(self.hand_of(seat)),
            ));
        }
    }

    fn finish(&mut self, out: &mut Notices) {
        self.close_table();
        let winner = self.players.iter().find(|p| p.alive).map(Player::tag);
        self.phase = Phase::GameEnd {
            winner: winner.as_ref().map(|w| w.id.clone()),
        };
        info!(room = %self.channel, winner = ?winner.as_ref().map(|w| &w.id), "game over");
        out.push((Recipient::Channel, Notice::GameOver { winner }));
    }
}

/// Checks 1-based hand positions and returns them as sorted 0-based
/// indices.
fn validate_positions(positions: &[usize], hand_len: usize) -> Result<Vec<usize>, RoomError> {
    if positions.is_empty() {
        return Err(RoomError::InvalidIndices("no card positions given".into()));
    }
    let mut picked = Vec::with_capacity(positions.len());
    for &pos in positions {
        if pos == 0 || pos > hand_len {
            return Err(RoomError::InvalidIndices(format!(
                "position {pos} is outside your {hand_len}-card hand"
            )));
        }
        if picked.contains(&(pos - 1)) {
            return Err(RoomError::InvalidIndices(format!("position {pos} repeated")));
        }
        picked.push(pos - 1);
    }
    picked.sort_unstable();
    Ok(picked)
}
