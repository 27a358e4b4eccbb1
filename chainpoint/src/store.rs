use std::future::Future;
use std::time::Duration;

use futures_util::future;
use tokio::time::sleep;

use crate::checkpoints::{Checkpoint, UnsavedCheckpoint};
use crate::metadata::MetadataKey;
use crate::template_sources::{TemplateSource, UnsavedTemplateSource};
use crate::{
    ChainpointRepo, ChainpointRepoClient, ExecutesWithRawQuery, LoadsDataWithRawQuery, Migratable,
    RepoError, RepoMigrations,
};

pub const INSERT_CHECKPOINTS_BATCH_SIZE: usize = 1000;
pub const DEFAULT_NEXT_BLOCKS_LIMIT: u64 = 15;

/// Bounded exponential backoff applied to transient storage conflicts
/// (deadlocks and serialization failures). Once the budget is exhausted,
/// `RepoError::RetryBudgetExhausted` is surfaced.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 20,
        }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        let multiplier = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);

        Duration::from_millis(self.base_delay_ms.saturating_mul(multiplier))
    }
}

/// The checkpoint ledger plus the indexer-wide metadata and
/// template-source registry around it.
///
/// Owns the on-disk representation of all three tables; callers go
/// through these operations and never reach into storage directly.
pub struct CheckpointStore {
    client: ChainpointRepoClient,
    retry_policy: RetryPolicy,
}

impl CheckpointStore {
    /// Takes an already-connected client. The store never opens, pools or
    /// closes connections itself.
    pub fn new(client: ChainpointRepoClient) -> Self {
        Self {
            client,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;

        self
    }

    /// Idempotently creates the three tables. The checkpoints table is
    /// never recreated once present, so accumulated history survives
    /// restarts. Statements run one after another with no cross-statement
    /// rollback.
    pub async fn ensure_schema(&self) -> Result<(), RepoError> {
        ChainpointRepo::migrate(&self.client, ChainpointRepo::get_internal_migrations()).await?;

        tracing::info!("checkpoint store tables ensured");

        Ok(())
    }

    /// Truncates all three tables, forcing the indexer to resume from its
    /// initially configured block on the next run. Tables are created
    /// first if absent so the reset never errors on a fresh database.
    pub async fn reset(&self) -> Result<(), RepoError> {
        self.ensure_schema().await?;

        ChainpointRepo::migrate(
            &self.client,
            ChainpointRepo::truncate_tables_migration().to_vec(),
        )
        .await?;

        tracing::info!("checkpoint store tables truncated");

        Ok(())
    }

    /// Records observed (contract, block) pairs. The input is split into
    /// batches of `INSERT_CHECKPOINTS_BATCH_SIZE` submitted concurrently;
    /// each batch is a single conflict-ignoring bulk insert, so replaying
    /// an overlapping set any number of times never duplicates rows and
    /// never surfaces a conflict. A batch hitting a transient conflict is
    /// retried from scratch under the retry policy; any other error
    /// aborts only its own batch and is returned once every batch has
    /// resolved.
    pub async fn insert_checkpoints(
        &self,
        checkpoints: &[UnsavedCheckpoint],
    ) -> Result<(), RepoError> {
        let batches = checkpoints
            .chunks(INSERT_CHECKPOINTS_BATCH_SIZE)
            .map(|batch| self.insert_checkpoints_batch(batch));

        let result: Result<(), RepoError> = future::join_all(batches).await.into_iter().collect();

        if result.is_ok() {
            tracing::debug!(count = checkpoints.len(), "inserted checkpoints");
        }

        result
    }

    async fn insert_checkpoints_batch(
        &self,
        batch: &[UnsavedCheckpoint],
    ) -> Result<(), RepoError> {
        retry_transient(&self.retry_policy, || {
            ChainpointRepo::create_checkpoints(&self.client, batch)
        })
        .await
    }

    /// The resume query: block numbers at or above `from_block` that have
    /// a checkpoint under any of the given contracts, ascending, at most
    /// `limit` (default 15). One value per matching row; a block height
    /// checkpointed under two contracts appears twice.
    pub async fn get_next_checkpoint_blocks(
        &self,
        from_block: u64,
        contract_addresses: &[String],
        limit: Option<u64>,
    ) -> Result<Vec<u64>, RepoError> {
        let limit = limit.unwrap_or(DEFAULT_NEXT_BLOCKS_LIMIT);

        let checkpoints = ChainpointRepo::load_next_checkpoints(
            &self.client,
            from_block,
            contract_addresses,
            limit,
        )
        .await?;

        tracing::debug!(
            count = checkpoints.len(),
            from_block,
            "loaded next checkpoint blocks"
        );

        Ok(checkpoints.iter().map(Checkpoint::get_block_number).collect())
    }

    /// Deletes checkpoints at or below `block_number` for contracts that
    /// are no longer active. Checkpoints of contracts in the active set
    /// are never touched, regardless of height.
    pub async fn purge_checkpoint_blocks(
        &self,
        block_number: u64,
        active_contract_addresses: &[String],
    ) -> Result<(), RepoError> {
        retry_transient(&self.retry_policy, || {
            ChainpointRepo::purge_checkpoint_blocks(
                &self.client,
                block_number,
                active_contract_addresses,
            )
        })
        .await?;

        tracing::debug!(block_number, "purged stale checkpoints");

        Ok(())
    }

    /// Point lookup; a miss is `Ok(None)`, never an error.
    pub async fn get_metadata(&self, key: MetadataKey) -> Result<Option<String>, RepoError> {
        let metadata = ChainpointRepo::load_metadata(&self.client, key).await?;

        Ok(metadata.map(|m| m.value))
    }

    /// `get_metadata` plus base-10 parsing.
    pub async fn get_metadata_number(&self, key: MetadataKey) -> Result<Option<u64>, RepoError> {
        self.get_metadata_number_with_radix(key, 10).await
    }

    /// `get_metadata` plus integer parsing in the given radix. A malformed
    /// stored value surfaces the parse error unmodified; interpreting it
    /// is the caller's responsibility.
    pub async fn get_metadata_number_with_radix(
        &self,
        key: MetadataKey,
        radix: u32,
    ) -> Result<Option<u64>, RepoError> {
        match self.get_metadata(key).await? {
            Some(value) => u64::from_str_radix(&value, radix)
                .map(Some)
                .map_err(|error| RepoError::Other(error.into())),
            None => Ok(None),
        }
    }

    /// Upserts the value's string representation. Concurrent writers to
    /// the same key are serialized by row-level locking in the engine.
    pub async fn set_metadata(
        &self,
        key: MetadataKey,
        value: impl ToString,
    ) -> Result<(), RepoError> {
        ChainpointRepo::set_metadata(&self.client, key, &value.to_string()).await
    }

    /// Appends one discovery. No deduplication: callers must avoid
    /// recording the same discovery twice if duplicates are undesirable.
    pub async fn add_template_source(
        &self,
        contract_address: &str,
        start_block: u64,
        template: &str,
    ) -> Result<(), RepoError> {
        let template_source = UnsavedTemplateSource::new(contract_address, start_block, template);

        ChainpointRepo::create_template_source(&self.client, &template_source).await
    }

    /// The full, unfiltered registry in storage-native order.
    pub async fn list_template_sources(&self) -> Result<Vec<TemplateSource>, RepoError> {
        ChainpointRepo::load_all_template_sources(&self.client).await
    }
}

/// Drives one storage operation through the retry policy: transient
/// conflicts rerun the operation from scratch after a backoff delay until
/// the budget is exhausted; any other outcome is returned as-is.
async fn retry_transient<Op, Fut>(
    retry_policy: &RetryPolicy,
    operation: Op,
) -> Result<(), RepoError>
where
    Op: Fn() -> Fut,
    Fut: Future<Output = Result<(), RepoError>>,
{
    let mut attempt = 1;

    loop {
        match operation().await {
            Err(RepoError::TransientConflict(error)) => {
                if attempt >= retry_policy.max_attempts {
                    return Err(RepoError::RetryBudgetExhausted {
                        attempts: attempt,
                        last_error: error,
                    });
                }

                tracing::warn!(%error, attempt, "transient storage conflict, retrying");
                sleep(retry_policy.delay(attempt)).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
