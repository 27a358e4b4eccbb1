use crate::{Migratable, PostgresRepo, RepoMigrations, SQLikeMigrations};

impl RepoMigrations for PostgresRepo {
    fn create_checkpoints_migration() -> &'static [&'static str] {
        SQLikeMigrations::create_checkpoints()
    }

    fn create_metadata_migration() -> &'static [&'static str] {
        SQLikeMigrations::create_metadata()
    }

    fn create_template_sources_migration() -> &'static [&'static str] {
        SQLikeMigrations::create_template_sources()
    }

    fn truncate_tables_migration() -> &'static [&'static str] {
        SQLikeMigrations::truncate_tables()
    }
}

impl Migratable for PostgresRepo {}
