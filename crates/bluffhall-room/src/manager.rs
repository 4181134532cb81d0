//! Room registry: creates rooms, tracks them by channel and routes
//! players to the single room they sit in.

use std::collections::HashMap;
use std::sync::Arc;

use bluffhall_protocol::{ChannelId, PlayerId, Recipient};
use bluffhall_store::StoreHandle;
use chrono::{TimeDelta, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::notice::{Dispatch, HandView, Notice, PlayerTag, StatusView};
use crate::room::{spawn_room, RoomClosed, RoomHandle, RoomLink};
use crate::{Room, RoomConfig, RoomError};

/// Tracks every live room and which room each player is in.
///
/// A player sits in at most one room at a time, and a channel hosts at
/// most one room. Callers serialize access (the service keeps the
/// registry behind a single lock); room actors never touch it and report
/// their end through the [`RoomClosed`] channel returned by
/// [`RoomRegistry::new`].
pub struct RoomRegistry {
    link: RoomLink,
    /// Seeds each room's generator.
    master: ChaCha20Rng,
    next_generation: u64,
    rooms: HashMap<ChannelId, RoomHandle>,
    members: HashMap<PlayerId, ChannelId>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    ///
    /// With a `seed`, every room's shuffles and wire draws are
    /// reproducible for the same sequence of commands.
    pub fn new(
        config: RoomConfig,
        seed: Option<u64>,
        outbound: mpsc::UnboundedSender<Dispatch>,
        store: StoreHandle<Room>,
    ) -> (Self, mpsc::UnboundedReceiver<RoomClosed>) {
        let (closed_tx, closed_rx) = mpsc::unbounded_channel();
        let master = match seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_rng(&mut rand::rng()),
        };
        let registry = Self {
            link: RoomLink {
                config: Arc::new(config),
                outbound,
                store,
                closed: closed_tx,
            },
            master,
            next_generation: 1,
            rooms: HashMap::new(),
            members: HashMap::new(),
        };
        (registry, closed_rx)
    }

    pub fn config(&self) -> &RoomConfig {
        &self.link.config
    }

    // -- Lobby ---------------------------------------------------------------

    /// Opens a room in `channel` with `owner` seated.
    pub fn create_room(&mut self, channel: ChannelId, owner: PlayerTag) -> Result<(), RoomError> {
        self.sweep_closed();
        if self.live(&channel).is_some() {
            return Err(RoomError::AlreadyExists(channel));
        }
        if let Some(current) = self.members.get(&owner.id) {
            return Err(RoomError::PlayerBusy {
                player: owner.id.clone(),
                channel: current.clone(),
            });
        }

        let room = Room::new(channel.clone(), owner.clone(), Utc::now());
        self.link.store.save(channel.as_str(), room.clone());
        let _ = self.link.outbound.send(Dispatch {
            channel: channel.clone(),
            to: Recipient::Channel,
            notice: Notice::RoomCreated {
                owner: owner.clone(),
                max_players: self.link.config.max_players,
            },
        });
        self.spawn(room);
        self.members.insert(owner.id.clone(), channel.clone());

        info!(room = %channel, owner = %owner.id, "room created");
        Ok(())
    }

    /// Seats `who` in the room hosted by `channel`.
    pub async fn join_room(&mut self, channel: &ChannelId, who: PlayerTag) -> Result<(), RoomError> {
        self.sweep_closed();
        if let Some(current) = self.members.get(&who.id) {
            if current == channel {
                return Err(RoomError::AlreadyJoined(who.id));
            }
            return Err(RoomError::PlayerBusy {
                player: who.id,
                channel: current.clone(),
            });
        }

        let handle = self.route(channel)?;
        let player = who.id.clone();
        handle.join(who).await?;
        self.members.insert(player, channel.clone());
        Ok(())
    }

    pub async fn start_game(
        &self,
        channel: &ChannelId,
        requester: PlayerId,
        is_admin: bool,
    ) -> Result<(), RoomError> {
        self.route(channel)?.start(requester, is_admin).await
    }

    /// Closes the room early and forgets it.
    pub async fn end_room(
        &mut self,
        channel: &ChannelId,
        requester: PlayerTag,
        is_admin: bool,
    ) -> Result<(), RoomError> {
        let handle = self.route(channel)?;
        handle.end(requester, is_admin).await?;
        self.forget(channel, handle.generation());
        Ok(())
    }

    // -- Routing -------------------------------------------------------------

    /// The live room hosted by `channel`.
    ///
    /// The handle outlives any borrow of the registry, so commands that
    /// leave membership alone can be awaited after the registry lock is
    /// released.
    pub fn route(&self, channel: &ChannelId) -> Result<RoomHandle, RoomError> {
        self.live(channel)
            .cloned()
            .ok_or_else(|| RoomError::NoRoom(channel.clone()))
    }

    /// The live room `player` sits in.
    pub fn route_player(&self, player: &PlayerId) -> Result<RoomHandle, RoomError> {
        let channel = self
            .members
            .get(player)
            .ok_or_else(|| RoomError::NotInRoom(player.clone()))?;
        self.route(channel)
    }

    // -- Play ----------------------------------------------------------------

    /// Plays from `player`'s hand in whichever room they sit in.
    pub async fn play(&self, player: &PlayerId, positions: Vec<usize>) -> Result<(), RoomError> {
        self.route_player(player)?
            .play(player.clone(), positions)
            .await
    }

    pub async fn challenge(&self, channel: &ChannelId, player: PlayerId) -> Result<(), RoomError> {
        self.route(channel)?.challenge(player).await
    }

    pub async fn cut_wire(
        &self,
        channel: &ChannelId,
        player: PlayerId,
        choice: usize,
    ) -> Result<(), RoomError> {
        self.route(channel)?.cut_wire(player, choice).await
    }

    // -- Queries -------------------------------------------------------------

    pub async fn status(&self, channel: &ChannelId) -> Result<StatusView, RoomError> {
        self.route(channel)?.status().await
    }

    /// `player`'s hand in whichever room they sit in.
    pub async fn hand(&self, player: &PlayerId) -> Result<HandView, RoomError> {
        self.route_player(player)?.hand(player.clone()).await
    }

    /// The channel of the room `player` sits in.
    pub fn room_of(&self, player: &PlayerId) -> Option<&ChannelId> {
        self.members.get(player)
    }

    /// Everyone seated in `channel`'s room, in no particular order.
    pub fn members_of(&self, channel: &ChannelId) -> Vec<PlayerId> {
        self.members
            .iter()
            .filter(|(_, c)| *c == channel)
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn contains(&self, channel: &ChannelId) -> bool {
        self.live(channel).is_some()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn channels(&self) -> Vec<ChannelId> {
        self.rooms.keys().cloned().collect()
    }

    // -- Housekeeping --------------------------------------------------------

    /// Drops a closed room and frees its players.
    ///
    /// Ignored when `generation` names an older actor than the one now
    /// registered for `channel`. Returns whether anything was removed.
    pub fn forget(&mut self, channel: &ChannelId, generation: u64) -> bool {
        match self.rooms.get(channel) {
            Some(handle) if handle.generation() == generation => {
                self.rooms.remove(channel);
                self.members.retain(|_, c| *c != *channel);
                info!(room = %channel, "room forgotten");
                true
            }
            _ => false,
        }
    }

    /// Closes every lobby idle for at least `ttl`. Returns how many closed.
    pub async fn reap(&mut self, ttl: TimeDelta) -> usize {
        let handles: Vec<RoomHandle> = self.rooms.values().cloned().collect();
        let mut reaped = 0;
        for handle in handles {
            match handle.reap(ttl, Utc::now()).await {
                Ok(true) => {
                    self.forget(handle.channel(), handle.generation());
                    reaped += 1;
                }
                Ok(false) => {}
                Err(RoomError::Unavailable(_)) => {
                    self.forget(handle.channel(), handle.generation());
                }
                Err(e) => warn!(room = %handle.channel(), error = %e, "reap failed"),
            }
        }
        if reaped > 0 {
            info!(reaped, remaining = self.rooms.len(), "idle rooms reaped");
        }
        reaped
    }

    /// Respawns persisted rooms. Returns how many came back.
    ///
    /// Finished rooms are dropped. When a player appears in more than one
    /// record, the first record (by key) keeps them: a later lobby loses
    /// that seat (or the whole lobby if it was the owner's), and a later
    /// started game is discarded.
    pub fn restore(&mut self, records: Vec<(String, Room)>) -> usize {
        let mut restored = 0;
        for (key, mut room) in records {
            if room.phase.is_over() || self.rooms.contains_key(&room.channel) {
                warn!(key = %key, "dropping finished or duplicate room record");
                self.link.store.remove(key);
                continue;
            }

            let conflicts: Vec<PlayerId> = room
                .members()
                .into_iter()
                .filter(|p| self.members.contains_key(p))
                .collect();
            if !conflicts.is_empty() {
                if !room.phase.is_waiting() || conflicts.contains(&room.owner) {
                    warn!(key = %key, ?conflicts, "dropping room whose players sit elsewhere");
                    self.link.store.remove(key);
                    continue;
                }
                warn!(key = %key, ?conflicts, "unseating players who sit elsewhere");
                room.players.retain(|p| !conflicts.contains(&p.id));
                self.link.store.save(key, room.clone());
            }

            for player in room.members() {
                self.members.insert(player, room.channel.clone());
            }
            info!(room = %room.channel, phase = %room.phase, round = room.round, "room restored");
            self.spawn(room);
            restored += 1;
        }
        restored
    }

    /// Stops every actor. Persisted records are kept for the next start.
    pub async fn shutdown(&mut self) {
        for (_, handle) in self.rooms.drain() {
            let _ = handle.shutdown().await;
        }
        self.members.clear();
    }

    // -- Internals -----------------------------------------------------------

    fn spawn(&mut self, room: Room) {
        let generation = self.next_generation;
        self.next_generation += 1;
        let rng = ChaCha20Rng::seed_from_u64(self.master.random());
        let channel = room.channel.clone();
        let handle = spawn_room(room, generation, rng, self.link.clone());
        self.rooms.insert(channel, handle);
    }

    /// Forgets rooms whose actors stopped before their close was seen.
    fn sweep_closed(&mut self) {
        let stopped: Vec<(ChannelId, u64)> = self
            .rooms
            .values()
            .filter(|h| h.is_closed())
            .map(|h| (h.channel().clone(), h.generation()))
            .collect();
        for (channel, generation) in stopped {
            self.forget(&channel, generation);
        }
    }

    fn live(&self, channel: &ChannelId) -> Option<&RoomHandle> {
        self.rooms.get(channel).filter(|h| !h.is_closed())
    }
}
