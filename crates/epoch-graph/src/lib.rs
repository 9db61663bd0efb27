//! Epoch Graph - Person storage and result persistence
//!
//! Provides the filesystem person store (hash-sharded JSON records),
//! knowledge base snapshots for resumed runs, and the Turtle writer
//! for century associations.

use sha2::{Digest, Sha256};

pub mod fs_store;
pub mod snapshot;
pub mod turtle;

pub use fs_store::FsPersonStore;
pub use snapshot::{write_summary, SnapshotStore};
pub use turtle::TurtleWriter;

/// Shard directory of a person: first two hex digits of the id's SHA-256
pub fn shard_for(id: &str) -> String {
    let digest = Sha256::digest(id.as_bytes());
    format!("{:02x}", digest[0])
}
