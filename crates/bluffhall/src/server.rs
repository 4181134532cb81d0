//! `Tavern` builder and background tasks.
//!
//! This is the entry point for running a bar. It ties the layers
//! together: store → registry → room actors → delivery → messenger.

use std::sync::Arc;

use bluffhall_protocol::JsonCodec;
use bluffhall_room::{Room, RoomClosed, RoomRegistry};
use bluffhall_store::{
    load_records, spawn_writer, FileStore, ImageCache, MemoryStore, RecordStore, StoreHandle,
};
use bluffhall_transport::{Messenger, Renderer};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::delivery::{spawn_delivery, Delivery};
use crate::handler::{handle_inbound, BarState, Dedup, Handled, Inbound, DEDUP_WINDOW};
use crate::text::Narrator;
use crate::{BarConfig, BluffhallError};

/// Builder for configuring and starting a [`Tavern`].
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use bluffhall::prelude::*;
///
/// let tavern = TavernBuilder::new()
///     .config(BarConfig::load(None)?)
///     .build(Arc::new(ConsoleMessenger::new()), Arc::new(NullRenderer))
///     .await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct TavernBuilder {
    config: BarConfig,
    in_memory: bool,
}

impl TavernBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: BarConfig) -> Self {
        self.config = config;
        self
    }

    /// Keep room records in memory and skip the image cache. Nothing
    /// survives the process.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    /// Opens storage, restores saved rooms and starts the background
    /// tasks.
    ///
    /// # Errors
    /// Fails if the records directory cannot be created or read.
    pub async fn build<M, R>(self, messenger: Arc<M>, renderer: Arc<R>) -> Result<Tavern<M, R>, BluffhallError>
    where
        M: Messenger,
        R: Renderer,
    {
        if self.in_memory {
            self.build_with_store(Arc::new(MemoryStore::new()), messenger, renderer)
                .await
        } else {
            let store = FileStore::open(self.config.rooms_dir())?;
            self.build_with_store(Arc::new(store), messenger, renderer)
                .await
        }
    }

    /// Like [`build`](Self::build), with a caller-supplied record store.
    pub async fn build_with_store<S, M, R>(
        self,
        store: Arc<S>,
        messenger: Arc<M>,
        renderer: Arc<R>,
    ) -> Result<Tavern<M, R>, BluffhallError>
    where
        S: RecordStore,
        M: Messenger,
        R: Renderer,
    {
        let config = self.config.validated();

        let records: Vec<(String, Room)> = load_records(store.as_ref(), &JsonCodec)?;
        let (store, writer) = spawn_writer(store, JsonCodec);

        let cache = if self.in_memory {
            None
        } else {
            match ImageCache::open(config.cache_dir()) {
                Ok(cache) => Some(cache),
                Err(e) => {
                    warn!(error = %e, "image cache unavailable, images will not be cached");
                    None
                }
            }
        };

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (mut registry, closed_rx) = RoomRegistry::new(
            config.room_config(),
            config.rng_seed,
            outbound_tx,
            store.clone(),
        );
        let restored = registry.restore(records);

        let delivery = Arc::new(Delivery::new(
            messenger,
            renderer,
            cache,
            Narrator::new(&config),
            config.hand_image_width,
        ));

        let state = Arc::new(BarState {
            registry: Mutex::new(registry),
            delivery: Arc::clone(&delivery),
            config,
            dedup: Mutex::new(Dedup::new(DEDUP_WINDOW)),
        });

        let tasks = vec![
            spawn_delivery(outbound_rx, delivery),
            spawn_lifecycle(closed_rx, Arc::clone(&state)),
            spawn_reaper(Arc::clone(&state)),
        ];

        info!(restored, "bar open");
        Ok(Tavern {
            state,
            store,
            tasks,
            _writer: writer,
        })
    }
}

/// A running bar.
///
/// Feed it chat messages with [`handle`](Self::handle). Everything rooms
/// announce is sent through the messenger it was built with.
pub struct Tavern<M, R> {
    state: Arc<BarState<M, R>>,
    store: StoreHandle<Room>,
    tasks: Vec<JoinHandle<()>>,
    _writer: JoinHandle<()>,
}

impl<M: Messenger, R: Renderer> Tavern<M, R> {
    /// Handles one inbound chat message.
    pub async fn handle(&self, inbound: Inbound) -> Handled {
        handle_inbound(&self.state, inbound).await
    }

    pub fn config(&self) -> &BarConfig {
        &self.state.config
    }

    pub fn messenger(&self) -> &M {
        self.state.delivery.messenger()
    }

    pub async fn room_count(&self) -> usize {
        self.state.registry.lock().await.room_count()
    }

    /// Closes idle lobbies now instead of waiting for the next sweep.
    pub async fn reap_now(&self) -> usize {
        let ttl = self.state.config.room_ttl();
        self.state.registry.lock().await.reap(ttl).await
    }

    /// Deletes every cached image. Returns how many were removed.
    pub fn purge_image_cache(&self) -> Result<usize, BluffhallError> {
        match self.state.delivery.cache() {
            Some(cache) => Ok(cache.purge()?),
            None => Ok(0),
        }
    }

    /// Waits until every room change so far is on disk.
    pub async fn flush(&self) -> Result<(), BluffhallError> {
        Ok(self.store.flush().await?)
    }

    /// Stops every room and background task. Room records stay on disk,
    /// so a new tavern over the same `state_dir` picks the games back up.
    pub async fn shutdown(self) -> Result<(), BluffhallError> {
        self.state.registry.lock().await.shutdown().await;
        let flushed = self.store.flush().await;
        for task in &self.tasks {
            task.abort();
        }
        info!("bar closed");
        Ok(flushed?)
    }
}

/// Forgets rooms whose actors report they have closed.
fn spawn_lifecycle<M, R>(
    mut closed: mpsc::UnboundedReceiver<RoomClosed>,
    state: Arc<BarState<M, R>>,
) -> JoinHandle<()>
where
    M: Messenger,
    R: Renderer,
{
    tokio::spawn(async move {
        while let Some(RoomClosed {
            channel,
            generation,
        }) = closed.recv().await
        {
            state.registry.lock().await.forget(&channel, generation);
        }
        debug!("lifecycle channel closed");
    })
}

/// Periodically closes lobbies idle past the configured TTL.
fn spawn_reaper<M, R>(state: Arc<BarState<M, R>>) -> JoinHandle<()>
where
    M: Messenger,
    R: Renderer,
{
    tokio::spawn(async move {
        let ttl = state.config.room_ttl();
        let mut interval = tokio::time::interval(state.config.reap_interval());
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let reaped = state.registry.lock().await.reap(ttl).await;
            debug!(reaped, "reaper sweep");
        }
    })
}
