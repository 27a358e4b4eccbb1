use std::future::Future;

use chainpoint::{ChainpointRepo, CheckpointStore, HasRawQueryClient};
use tokio::sync::OnceCell;

use crate::db;

static DB_SETUP: OnceCell<()> = OnceCell::const_new();

/// Hands the test a ready store against the shared test database. Tests
/// isolate themselves with unique fixture addresses rather than
/// transactions, so they can run concurrently.
pub async fn run_test<TestFn, Fut>(test_fn: TestFn)
where
    TestFn: FnOnce(CheckpointStore) -> Fut,
    Fut: Future<Output = ()>,
{
    DB_SETUP
        .get_or_init(|| async {
            db::setup().await;
            new_store().await.ensure_schema().await.unwrap();
        })
        .await;

    test_fn(new_store().await).await;
}

pub async fn new_store() -> CheckpointStore {
    store_for(&db::database_url()).await
}

pub async fn store_for(url: &str) -> CheckpointStore {
    let repo = ChainpointRepo::new(url);
    let client = repo.get_client().await.unwrap();

    CheckpointStore::new(client)
}
