use std::env;

use dotenvy::dotenv;
use tokio_postgres::NoTls;

pub async fn setup() {
    setup_database(&database_url()).await;
}

pub fn database_url() -> String {
    dotenv().ok();

    env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL env variable needs to be set.")
}

/// A dedicated database for destructive tests: resetting the store
/// truncates every table, which would race tests running against the
/// main test database.
pub fn reset_database_url() -> String {
    format!("{}_reset", database_url())
}

/// Creates the database behind `url` if it does not exist yet.
pub async fn setup_database(url: &str) {
    if tokio_postgres::connect(url, NoTls).await.is_err() {
        let (db_name, db_raw_url) = get_db_name_and_raw_url(url);

        create_database(&db_name, &db_raw_url).await;
    }
}

fn get_db_name_and_raw_url(url: &str) -> (String, String) {
    let mut url_split = url.split('/').collect::<Vec<&str>>();

    let db_name = url_split
        .pop()
        .expect("DATABASE NAME needs to be specified. See: sample.env");
    let db_raw_url = url_split.join("/");

    (db_name.to_string(), db_raw_url)
}

async fn create_database(db_name: &str, db_raw_url: &str) {
    let maintenance_url = format!("{db_raw_url}/postgres");

    let (client, connection) = tokio_postgres::connect(&maintenance_url, NoTls)
        .await
        .unwrap_or_else(|_| panic!("Error connecting to {maintenance_url}"));

    tokio::spawn(connection);

    client
        .execute(format!(r#"CREATE DATABASE "{db_name}""#).as_str(), &[])
        .await
        .unwrap();
}
