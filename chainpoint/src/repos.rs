mod repo;

pub use repo::{
    ExecutesWithRawQuery, HasRawQueryClient, LoadsDataWithRawQuery, Migratable, RepoError,
    RepoMigrations, SQLikeMigrations, StorageError,
};

#[cfg(feature = "postgres")]
mod postgres_repo;

#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresRepo, PostgresRepoClient};
