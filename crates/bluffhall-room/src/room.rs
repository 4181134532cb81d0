//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Every command and every timer expiry for a room is applied inside
//! its actor, one at a time, so two transitions on the same room can
//! never interleave. Rooms share nothing with each other.

use std::sync::Arc;

use bluffhall_protocol::{ChannelId, PlayerId};
use bluffhall_store::StoreHandle;
use bluffhall_timer::{Expiry, TimeoutScheduler, TimerKind};
use chrono::{DateTime, TimeDelta, Utc};
use rand_chacha::ChaCha20Rng;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::Notices;
use crate::notice::{Dispatch, HandView, PlayerTag, StatusView};
use crate::{Room, RoomConfig, RoomError};

/// Default command channel size for room actors.
pub(crate) const COMMAND_CHANNEL_SIZE: usize = 64;

/// Sent by an actor when its room reaches `GameEnd` and the actor stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomClosed {
    pub channel: ChannelId,
    /// Identifies which actor for this channel closed.
    pub generation: u64,
}

/// What every actor needs from its surroundings.
#[derive(Clone)]
pub(crate) struct RoomLink {
    pub config: Arc<RoomConfig>,
    pub outbound: mpsc::UnboundedSender<Dispatch>,
    pub store: StoreHandle<Room>,
    pub closed: mpsc::UnboundedSender<RoomClosed>,
}

type Reply<T> = oneshot::Sender<Result<T, RoomError>>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        who: PlayerTag,
        reply: Reply<()>,
    },
    Start {
        requester: PlayerId,
        is_admin: bool,
        reply: Reply<()>,
    },
    Play {
        player: PlayerId,
        positions: Vec<usize>,
        reply: Reply<()>,
    },
    Challenge {
        player: PlayerId,
        reply: Reply<()>,
    },
    CutWire {
        player: PlayerId,
        choice: usize,
        reply: Reply<()>,
    },
    End {
        requester: PlayerTag,
        is_admin: bool,
        reply: Reply<()>,
    },
    Status {
        reply: Reply<StatusView>,
    },
    Hand {
        player: PlayerId,
        reply: Reply<HandView>,
    },
    /// Close the room if it is an idle lobby. Replies whether it closed.
    Reap {
        ttl: TimeDelta,
        now: DateTime<Utc>,
        reply: Reply<bool>,
    },
    /// Stop the actor, keeping the persisted record.
    Shutdown,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    channel: ChannelId,
    generation: u64,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Sends a command built around a fresh reply channel and awaits the
    /// answer. A stopped actor maps to [`RoomError::Unavailable`].
    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.channel.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.channel.clone()))?
    }

    pub async fn join(&self, who: PlayerTag) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Join { who, reply }).await
    }

    pub async fn start(&self, requester: PlayerId, is_admin: bool) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start {
            requester,
            is_admin,
            reply,
        })
        .await
    }

    pub async fn play(&self, player: PlayerId, positions: Vec<usize>) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Play {
            player,
            positions,
            reply,
        })
        .await
    }

    pub async fn challenge(&self, player: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Challenge { player, reply })
            .await
    }

    pub async fn cut_wire(&self, player: PlayerId, choice: usize) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::CutWire {
            player,
            choice,
            reply,
        })
        .await
    }

    pub async fn end(&self, requester: PlayerTag, is_admin: bool) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::End {
            requester,
            is_admin,
            reply,
        })
        .await
    }

    pub async fn status(&self) -> Result<StatusView, RoomError> {
        self.request(|reply| RoomCommand::Status { reply }).await
    }

    pub async fn hand(&self, player: PlayerId) -> Result<HandView, RoomError> {
        self.request(|reply| RoomCommand::Hand { player, reply })
            .await
    }

    pub async fn reap(&self, ttl: TimeDelta, now: DateTime<Utc>) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::Reap { ttl, now, reply })
            .await
    }

    /// Tells the actor to stop. The room's record stays in the store.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.channel.clone()))
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct RoomActor {
    room: Room,
    generation: u64,
    rng: ChaCha20Rng,
    scheduler: TimeoutScheduler,
    link: RoomLink,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        info!(room = %self.room.channel, phase = %self.room.phase, "room actor started");
        // restored rooms get a fresh full-length timer
        self.rearm();

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(RoomCommand::Shutdown) | None => {
                        info!(room = %self.room.channel, "room shutting down");
                        break;
                    }
                    Some(cmd) => self.handle(cmd),
                },
                expiry = self.scheduler.wait_for_expiry() => self.on_expiry(expiry),
            }

            if self.room.phase.is_over() {
                break;
            }
        }

        info!(room = %self.room.channel, "room actor stopped");
    }

    fn handle(&mut self, cmd: RoomCommand) {
        let now = Utc::now();
        match cmd {
            RoomCommand::Join { who, reply } => {
                let result = self.room.join(who, &self.link.config, now);
                let _ = reply.send(self.commit(result));
            }
            RoomCommand::Start {
                requester,
                is_admin,
                reply,
            } => {
                let result = self.room.start(
                    &requester,
                    is_admin,
                    &self.link.config,
                    &mut self.rng,
                    now,
                );
                let _ = reply.send(self.commit(result));
            }
            RoomCommand::Play {
                player,
                positions,
                reply,
            } => {
                let result = self.room.play(&player, &positions, now);
                let _ = reply.send(self.commit(result));
            }
            RoomCommand::Challenge { player, reply } => {
                let result = self.room.challenge(&player, now);
                let _ = reply.send(self.commit(result));
            }
            RoomCommand::CutWire {
                player,
                choice,
                reply,
            } => {
                let result = self.room.cut_wire(&player, choice, &mut self.rng, now);
                let _ = reply.send(self.commit(result));
            }
            RoomCommand::End {
                requester,
                is_admin,
                reply,
            } => {
                let result = self.room.end(&requester, is_admin, now);
                let _ = reply.send(self.commit(result));
            }
            RoomCommand::Status { reply } => {
                let view = self.room.status(&self.link.config, self.scheduler.remaining());
                let _ = reply.send(Ok(view));
            }
            RoomCommand::Hand { player, reply } => {
                let _ = reply.send(self.room.hand_view(&player));
            }
            RoomCommand::Reap { ttl, now, reply } => {
                let reaped = match self.room.reap(ttl, now) {
                    Some(notices) => {
                        self.after_transition(notices);
                        true
                    }
                    None => false,
                };
                let _ = reply.send(Ok(reaped));
            }
            RoomCommand::Shutdown => {}
        }
    }

    fn on_expiry(&mut self, expiry: Expiry) {
        if !expiry.is_current(self.room.epoch) {
            debug!(
                room = %self.room.channel,
                token = expiry.token,
                epoch = self.room.epoch,
                "stale timer ignored"
            );
            return;
        }

        let now = Utc::now();
        let result = match expiry.kind {
            TimerKind::Play => self.room.play_timeout(&mut self.rng, now),
            TimerKind::Wire => self.room.wire_timeout(&mut self.rng, now),
        };
        if let Err(e) = self.commit(result) {
            warn!(room = %self.room.channel, kind = %expiry.kind, error = %e, "timeout conflicted with room state");
        }
    }

    /// Publishes, persists and re-arms after an accepted transition.
    fn commit(&mut self, result: Result<Notices, RoomError>) -> Result<(), RoomError> {
        let notices = result?;
        self.after_transition(notices);
        Ok(())
    }

    fn after_transition(&mut self, notices: Notices) {
        self.publish(notices);
        if self.room.phase.is_over() {
            // before the reply goes out, so callers see the record gone
            self.close();
            return;
        }
        self.link
            .store
            .save(self.room.channel.as_str(), self.room.clone());
        self.rearm();
    }

    fn rearm(&mut self) {
        match self.room.pending_timer() {
            Some(kind) => {
                self.scheduler.arm(kind, self.room.epoch);
            }
            None => {
                self.scheduler.cancel();
            }
        }
    }

    fn publish(&self, notices: Notices) {
        for (to, notice) in notices {
            let dispatch = Dispatch {
                channel: self.room.channel.clone(),
                to,
                notice,
            };
            if self.link.outbound.send(dispatch).is_err() {
                debug!(room = %self.room.channel, "outbound channel closed, notice dropped");
            }
        }
    }

    fn close(&mut self) {
        self.scheduler.cancel();
        self.link.store.remove(self.room.channel.as_str());
        let _ = self.link.closed.send(RoomClosed {
            channel: self.room.channel.clone(),
            generation: self.generation,
        });
        info!(room = %self.room.channel, round = self.room.round, "room closed");
    }
}

/// Spawns an actor for `room` and returns a handle to it.
pub(crate) fn spawn_room(
    room: Room,
    generation: u64,
    rng: ChaCha20Rng,
    link: RoomLink,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
    let channel = room.channel.clone();

    let actor = RoomActor {
        room,
        generation,
        rng,
        scheduler: TimeoutScheduler::new(link.config.timers.clone()),
        link,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle {
        channel,
        generation,
        sender: tx,
    }
}
