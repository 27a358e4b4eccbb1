use chainpoint::{ChainpointRepo, CheckpointStore, HasRawQueryClient};
use chainpoint_tests::db;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    db::setup().await;

    let repo = ChainpointRepo::new(&db::database_url());
    let client = repo.get_client().await.unwrap();

    CheckpointStore::new(client).ensure_schema().await.unwrap();
}
