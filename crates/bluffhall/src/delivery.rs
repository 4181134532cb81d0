//! Turns room notices into messages and sends them.
//!
//! A single delivery task drains the outbound channel that every room
//! actor writes to, so notices leave in the order rooms produced them.
//! Images are best effort: a renderer error or a cache failure degrades
//! the message to text.

use std::sync::Arc;

use bluffhall_protocol::{Card, ChannelId, PlayerId, Recipient};
use bluffhall_room::{Dispatch, HandView, Notice};
use bluffhall_store::ImageCache;
use bluffhall_transport::{Image, Messenger, RenderError, Renderer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::text::Narrator;

/// Sends text and images on behalf of the bar.
pub struct Delivery<M, R> {
    messenger: Arc<M>,
    renderer: Arc<R>,
    cache: Option<ImageCache>,
    narrator: Narrator,
    hand_width: u32,
}

impl<M: Messenger, R: Renderer> Delivery<M, R> {
    pub fn new(
        messenger: Arc<M>,
        renderer: Arc<R>,
        cache: Option<ImageCache>,
        narrator: Narrator,
        hand_width: u32,
    ) -> Self {
        Self {
            messenger,
            renderer,
            cache,
            narrator,
            hand_width,
        }
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    pub fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    pub fn cache(&self) -> Option<&ImageCache> {
        self.cache.as_ref()
    }

    /// Sends one room notice to its recipient.
    pub async fn deliver(&self, dispatch: Dispatch) {
        let Dispatch {
            channel,
            to,
            notice,
        } = dispatch;

        match (&to, &notice) {
            (Recipient::Player(player), Notice::Hand(view)) => {
                self.send_hand(player, view).await;
            }
            (Recipient::Player(player), _) => {
                self.to_player(player, &self.narrator.notice(&notice), None)
                    .await;
            }
            (Recipient::Channel, _) => {
                self.to_channel(&channel, &self.narrator.notice(&notice))
                    .await;
            }
        }

        // the penalized player also gets a private prompt with the bomb
        if let Notice::PenaltyStarted {
            player,
            stage,
            offered,
        } = &notice
        {
            let image = self
                .image(&format!("penalty:{}", stage.slots()), || {
                    self.renderer.render_penalty_stage(stage.slots())
                })
                .await;
            let text = self.narrator.penalty_prompt(*stage, offered);
            self.to_player(&player.id, &text, image.as_ref()).await;
        }
    }

    /// Sends `view` privately, with a hand image when one can be drawn.
    pub async fn send_hand(&self, player: &PlayerId, view: &HandView) {
        let image = if view.alive && !view.cards.is_empty() {
            self.image(&hand_content(&view.cards, self.hand_width), || {
                self.renderer.render_hand(&view.cards, self.hand_width)
            })
            .await
        } else {
            None
        };
        self.to_player(player, &self.narrator.hand(view), image.as_ref())
            .await;
    }

    pub async fn to_channel(&self, channel: &ChannelId, text: &str) {
        if let Err(e) = self.messenger.send_to_channel(channel, text).await {
            warn!(room = %channel, error = %e, "channel message not delivered");
        }
    }

    pub async fn to_player(&self, player: &PlayerId, text: &str, image: Option<&Image>) {
        if let Err(e) = self.messenger.send_to_player(player, text, image).await {
            warn!(player = %player, error = %e, "private message not delivered");
        }
    }

    /// Looks `content` up in the cache, rendering and storing on a miss.
    /// Cache files are read and written on the blocking pool.
    async fn image(
        &self,
        content: &str,
        render: impl FnOnce() -> Result<Image, RenderError>,
    ) -> Option<Image> {
        let key = ImageCache::key_for(content.as_bytes());
        if let Some(cache) = &self.cache {
            if let Some(bytes) = cache.fetch(&key).await {
                return Some(Image::png(bytes));
            }
        }

        let image = match render() {
            Ok(image) => image,
            Err(RenderError::Unsupported) => return None,
            Err(e) => {
                warn!(error = %e, "render failed, sending text only");
                return None;
            }
        };
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&key, image.bytes().to_vec()).await {
                warn!(error = %e, "image cache write failed");
            }
        }
        Some(image)
    }
}

/// What a hand image depends on: suits in order and the width.
fn hand_content(cards: &[Card], width: u32) -> String {
    let suits: Vec<&str> = cards.iter().map(|c| c.suit.label()).collect();
    format!("hand:{width}:{}", suits.join(","))
}

/// Spawns the task that drains `outbound` until every sender is gone.
pub fn spawn_delivery<M: Messenger, R: Renderer>(
    mut outbound: mpsc::UnboundedReceiver<Dispatch>,
    delivery: Arc<Delivery<M, R>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(dispatch) = outbound.recv().await {
            delivery.deliver(dispatch).await;
        }
        debug!("outbound channel closed, delivery stopped");
    })
}
