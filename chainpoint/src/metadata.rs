use serde::Deserialize;

/// The fixed set of indexer-wide facts persisted in the metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    LastIndexedBlock,
    LastPrefetchedBlock,
    Network,
    StartBlock,
    ConfigChecksum,
}

impl MetadataKey {
    /// The persisted row id for this key.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKey::LastIndexedBlock => "last_indexed_block",
            MetadataKey::LastPrefetchedBlock => "last_prefetched_block",
            MetadataKey::Network => "network",
            MetadataKey::StartBlock => "start_block",
            MetadataKey::ConfigChecksum => "config_checksum",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Metadata {
    pub id: String,
    pub value: String,
}
