use std::error::Error as StdError;

use derive_more::Display;
use serde::de::DeserializeOwned;

use crate::checkpoints::{Checkpoint, UnsavedCheckpoint};
use crate::metadata::{Metadata, MetadataKey};
use crate::template_sources::{TemplateSource, UnsavedTemplateSource};

/// A storage-engine error carried through unmodified.
pub type StorageError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Display)]
pub enum RepoError {
    /// A deadlock or serialization failure reported by the storage
    /// engine. Transient: the failed statement is safe to retry from
    /// scratch.
    #[display("transient storage conflict: {_0}")]
    TransientConflict(StorageError),
    /// A transient conflict persisted past the retry budget.
    #[display("retry budget exhausted after {attempts} attempts: {last_error}")]
    RetryBudgetExhausted {
        attempts: u32,
        last_error: StorageError,
    },
    /// Everything else, surfaced as-is.
    #[display("{_0}")]
    Other(StorageError),
}

impl RepoError {
    pub fn is_transient(&self) -> bool {
        matches!(self, RepoError::TransientConflict(_))
    }
}

#[async_trait::async_trait]
pub trait HasRawQueryClient {
    type RawQueryClient: Send + Sync;

    async fn get_client(&self) -> Result<Self::RawQueryClient, RepoError>;
}

#[async_trait::async_trait]
pub trait ExecutesWithRawQuery: HasRawQueryClient {
    async fn execute_raw_query(
        client: &Self::RawQueryClient,
        query: &str,
    ) -> Result<(), RepoError>;

    /// Bulk insert with conflict-ignore semantics: rows whose id already
    /// exists are skipped silently, never surfaced as an error.
    async fn create_checkpoints(
        client: &Self::RawQueryClient,
        checkpoints: &[UnsavedCheckpoint],
    ) -> Result<(), RepoError>;

    /// Deletes every checkpoint at or below `block_number` whose contract
    /// is not in the active set.
    async fn purge_checkpoint_blocks(
        client: &Self::RawQueryClient,
        block_number: u64,
        active_contract_addresses: &[String],
    ) -> Result<(), RepoError>;

    async fn set_metadata(
        client: &Self::RawQueryClient,
        key: MetadataKey,
        value: &str,
    ) -> Result<(), RepoError>;

    async fn create_template_source(
        client: &Self::RawQueryClient,
        template_source: &UnsavedTemplateSource,
    ) -> Result<(), RepoError>;
}

#[async_trait::async_trait]
pub trait LoadsDataWithRawQuery: HasRawQueryClient {
    async fn load_data_from_raw_query<Data: Send + DeserializeOwned>(
        client: &Self::RawQueryClient,
        query: &str,
    ) -> Result<Option<Data>, RepoError>;

    async fn load_data_list_from_raw_query<Data: Send + DeserializeOwned>(
        client: &Self::RawQueryClient,
        query: &str,
    ) -> Result<Vec<Data>, RepoError>;

    async fn load_metadata(
        client: &Self::RawQueryClient,
        key: MetadataKey,
    ) -> Result<Option<Metadata>, RepoError>;

    /// Checkpoints at or above `from_block_number` for the given contract
    /// set, ascending by block number, at most `limit` rows.
    async fn load_next_checkpoints(
        client: &Self::RawQueryClient,
        from_block_number: u64,
        contract_addresses: &[String],
        limit: u64,
    ) -> Result<Vec<Checkpoint>, RepoError>;

    async fn load_all_template_sources(
        client: &Self::RawQueryClient,
    ) -> Result<Vec<TemplateSource>, RepoError>;
}

#[async_trait::async_trait]
pub trait Migratable: ExecutesWithRawQuery + Sync + Send {
    async fn migrate(
        client: &Self::RawQueryClient,
        migrations: Vec<impl AsRef<str> + Send + Sync>,
    ) -> Result<(), RepoError>
    where
        Self: Sized,
    {
        for migration in migrations {
            Self::execute_raw_query(client, migration.as_ref()).await?;
        }

        Ok(())
    }
}

pub trait RepoMigrations: Migratable {
    fn create_checkpoints_migration() -> &'static [&'static str];
    fn create_metadata_migration() -> &'static [&'static str];
    fn create_template_sources_migration() -> &'static [&'static str];
    fn truncate_tables_migration() -> &'static [&'static str];

    fn get_internal_migrations() -> Vec<&'static str> {
        [
            Self::create_checkpoints_migration(),
            Self::create_metadata_migration(),
            Self::create_template_sources_migration(),
        ]
        .concat()
    }
}

pub struct SQLikeMigrations;

impl SQLikeMigrations {
    /// The checkpoints table is never dropped or recreated once present,
    /// preserving accumulated history across restarts.
    pub fn create_checkpoints() -> &'static [&'static str] {
        &[
            "CREATE TABLE IF NOT EXISTS chainpoint_checkpoints (
                id CHAR(64) PRIMARY KEY,
                block_number BIGINT NOT NULL,
                contract_address VARCHAR(66) NOT NULL
        )",
            "CREATE INDEX IF NOT EXISTS chainpoint_checkpoints_contract_block_index
        ON chainpoint_checkpoints(contract_address, block_number)",
        ]
    }

    pub fn create_metadata() -> &'static [&'static str] {
        &["CREATE TABLE IF NOT EXISTS chainpoint_metadata (
                id VARCHAR(66) PRIMARY KEY,
                value VARCHAR(255) NOT NULL
        )"]
    }

    pub fn create_template_sources() -> &'static [&'static str] {
        &["CREATE TABLE IF NOT EXISTS chainpoint_template_sources (
                id SERIAL PRIMARY KEY,
                contract_address VARCHAR(66) NOT NULL,
                start_block BIGINT NOT NULL,
                template VARCHAR(255) NOT NULL
        )"]
    }

    pub fn truncate_tables() -> &'static [&'static str] {
        &["TRUNCATE TABLE chainpoint_checkpoints, chainpoint_metadata, chainpoint_template_sources \
           RESTART IDENTITY"]
    }
}
