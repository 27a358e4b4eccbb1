//! Checkpoint persistence for EVM chain indexers.
//!
//! Records, per watched contract, the block heights at which indexable
//! events were observed, so an indexer can resume or replay
//! deterministically after a restart, a reorg or a config change without
//! re-scanning history. Also holds small indexer-wide metadata and a
//! registry of contracts discovered at runtime.

mod checkpoints;
mod metadata;
mod repos;
mod template_sources;

#[cfg(feature = "postgres")]
pub mod store;

pub use checkpoints::{derive_checkpoint_id, Checkpoint, UnsavedCheckpoint};
pub use metadata::{Metadata, MetadataKey};
pub use repos::*;
pub use template_sources::{TemplateSource, UnsavedTemplateSource};

#[cfg(feature = "postgres")]
pub use store::{CheckpointStore, RetryPolicy};

#[cfg(feature = "postgres")]
pub type ChainpointRepo = PostgresRepo;

#[cfg(feature = "postgres")]
pub type ChainpointRepoClient = PostgresRepoClient;
