//! Durable storage for Bluffhall.
//!
//! - [`RecordStore`]: blocking key/value storage of encoded room records,
//!   with a file-backed ([`FileStore`]) and an in-memory ([`MemoryStore`])
//!   implementation.
//! - [`spawn_writer`]: the background task that owns all record I/O, fed
//!   through a [`StoreHandle`].
//! - [`ImageCache`]: the derived cache of rendered images.

pub mod cache;
pub mod error;
pub mod record;
pub mod writer;

pub use cache::{sha256_hex, ImageCache};
pub use error::StoreError;
pub use record::{FileStore, MemoryStore, RecordStore};
pub use writer::{load_records, spawn_writer, StoreHandle, StoreOp};
