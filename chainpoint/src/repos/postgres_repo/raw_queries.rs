use serde::de::DeserializeOwned;
use tokio_postgres::types::ToSql;

use super::{classify_error, PostgresRepo, PostgresRepoClient};
use crate::checkpoints::{Checkpoint, UnsavedCheckpoint};
use crate::metadata::{Metadata, MetadataKey};
use crate::template_sources::{TemplateSource, UnsavedTemplateSource};
use crate::{ExecutesWithRawQuery, LoadsDataWithRawQuery, RepoError};

const NO_PARAMS: &[&(dyn ToSql + Sync)] = &[];

#[async_trait::async_trait]
impl ExecutesWithRawQuery for PostgresRepo {
    async fn execute_raw_query(
        client: &Self::RawQueryClient,
        query: &str,
    ) -> Result<(), RepoError> {
        client.execute(query, NO_PARAMS).await.map_err(classify_error)?;

        Ok(())
    }

    async fn create_checkpoints(
        client: &Self::RawQueryClient,
        checkpoints: &[UnsavedCheckpoint],
    ) -> Result<(), RepoError> {
        if checkpoints.is_empty() {
            return Ok(());
        }

        let values = checkpoints
            .iter()
            .map(|c| {
                format!(
                    "('{}',{},'{}')",
                    c.id,
                    c.block_number,
                    sql_escape(&c.contract_address)
                )
            })
            .collect::<Vec<_>>()
            .join(",");

        let query = format!(
            "INSERT INTO chainpoint_checkpoints (id, block_number, contract_address)
            VALUES {values}
            ON CONFLICT (id) DO NOTHING"
        );

        Self::execute_raw_query(client, &query).await
    }

    async fn purge_checkpoint_blocks(
        client: &Self::RawQueryClient,
        block_number: u64,
        active_contract_addresses: &[String],
    ) -> Result<(), RepoError> {
        let query = if active_contract_addresses.is_empty() {
            format!("DELETE FROM chainpoint_checkpoints WHERE block_number <= {block_number}")
        } else {
            format!(
                "DELETE FROM chainpoint_checkpoints
                WHERE block_number <= {block_number}
                AND contract_address NOT IN ({})",
                sql_address_list(active_contract_addresses)
            )
        };

        Self::execute_raw_query(client, &query).await
    }

    async fn set_metadata(
        client: &Self::RawQueryClient,
        key: MetadataKey,
        value: &str,
    ) -> Result<(), RepoError> {
        let query = format!(
            "INSERT INTO chainpoint_metadata (id, value)
            VALUES ('{}','{}')
            ON CONFLICT (id) DO UPDATE SET value = EXCLUDED.value",
            key.as_str(),
            sql_escape(value)
        );

        Self::execute_raw_query(client, &query).await
    }

    async fn create_template_source(
        client: &Self::RawQueryClient,
        template_source: &UnsavedTemplateSource,
    ) -> Result<(), RepoError> {
        let query = format!(
            "INSERT INTO chainpoint_template_sources (contract_address, start_block, template)
            VALUES ('{}',{},'{}')",
            sql_escape(&template_source.contract_address),
            template_source.start_block,
            sql_escape(&template_source.template)
        );

        Self::execute_raw_query(client, &query).await
    }
}

#[async_trait::async_trait]
impl LoadsDataWithRawQuery for PostgresRepo {
    async fn load_data_from_raw_query<Data: Send + DeserializeOwned>(
        client: &Self::RawQueryClient,
        query: &str,
    ) -> Result<Option<Data>, RepoError> {
        let mut data_list: Vec<Data> = Self::load_data_list_from_raw_query(client, query).await?;

        assert!(data_list.len() <= 1);

        Ok(data_list.pop())
    }

    async fn load_data_list_from_raw_query<Data: Send + DeserializeOwned>(
        client: &Self::RawQueryClient,
        query: &str,
    ) -> Result<Vec<Data>, RepoError> {
        let json_aggregate = get_json_aggregate(client, query).await?;

        if json_aggregate.is_object() || json_aggregate.is_array() {
            serde_json::from_value(json_aggregate).map_err(|error| RepoError::Other(error.into()))
        } else {
            Ok(vec![])
        }
    }

    async fn load_metadata(
        client: &Self::RawQueryClient,
        key: MetadataKey,
    ) -> Result<Option<Metadata>, RepoError> {
        let query = format!(
            "SELECT id, value FROM chainpoint_metadata WHERE id = '{}'",
            key.as_str()
        );

        Self::load_data_from_raw_query(client, &query).await
    }

    async fn load_next_checkpoints(
        client: &Self::RawQueryClient,
        from_block_number: u64,
        contract_addresses: &[String],
        limit: u64,
    ) -> Result<Vec<Checkpoint>, RepoError> {
        if contract_addresses.is_empty() {
            return Ok(vec![]);
        }

        let query = format!(
            "SELECT id, block_number, contract_address FROM chainpoint_checkpoints
            WHERE block_number >= {from_block_number}
            AND contract_address IN ({})
            ORDER BY block_number ASC
            LIMIT {limit}",
            sql_address_list(contract_addresses)
        );

        Self::load_data_list_from_raw_query(client, &query).await
    }

    async fn load_all_template_sources(
        client: &Self::RawQueryClient,
    ) -> Result<Vec<TemplateSource>, RepoError> {
        Self::load_data_list_from_raw_query(
            client,
            "SELECT id, contract_address, start_block, template FROM chainpoint_template_sources",
        )
        .await
    }
}

async fn get_json_aggregate(
    client: &PostgresRepoClient,
    query: &str,
) -> Result<serde_json::Value, RepoError> {
    let rows = client
        .query(json_aggregate_query(query).as_str(), NO_PARAMS)
        .await
        .map_err(classify_error)?;

    Ok(rows.first().map(|row| row.get(0)).unwrap_or(serde_json::Value::Null))
}

fn json_aggregate_query(query: &str) -> String {
    format!("WITH result AS ({query}) SELECT COALESCE(json_agg(result), '[]'::json) FROM result",)
}

fn sql_escape(value: &str) -> String {
    value.replace('\'', "''")
}

/// Addresses are persisted lowercased; normalize here so callers can pass
/// checksummed addresses to the query surface.
fn sql_address_list(addresses: &[String]) -> String {
    addresses
        .iter()
        .map(|address| format!("'{}'", sql_escape(&address.to_lowercase())))
        .collect::<Vec<_>>()
        .join(",")
}
