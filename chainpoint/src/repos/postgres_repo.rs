mod migrations;
mod raw_queries;

use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls};

use super::repo::{HasRawQueryClient, RepoError};

pub type PostgresRepoClient = Client;

/// The Postgres backend. Holds only the connection URL: the store never
/// owns a pool, and each client handed out is an independent connection
/// whose lifecycle belongs to the caller.
#[derive(Clone, Debug)]
pub struct PostgresRepo {
    url: String,
}

impl PostgresRepo {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl HasRawQueryClient for PostgresRepo {
    type RawQueryClient = Client;

    async fn get_client(&self) -> Result<Client, RepoError> {
        let (client, connection) =
            tokio_postgres::connect(&self.url, NoTls).await.map_err(classify_error)?;

        tokio::spawn(async move {
            if let Err(error) = connection.await {
                tracing::error!(%error, "postgres connection error");
            }
        });

        Ok(client)
    }
}

/// The fixed set of SQLSTATEs treated as transient conflicts, retried by
/// the store rather than surfaced.
const TRANSIENT_SQL_STATES: &[SqlState] = &[
    SqlState::T_R_DEADLOCK_DETECTED,
    SqlState::T_R_SERIALIZATION_FAILURE,
];

fn classify_error(error: tokio_postgres::Error) -> RepoError {
    match error.code() {
        Some(code) if TRANSIENT_SQL_STATES.contains(code) => {
            RepoError::TransientConflict(error.into())
        }
        _ => RepoError::Other(error.into()),
    }
}
