use async_trait::async_trait;
use tokio_postgres::NoTls;
use tracing::{debug, error};

pub type HttpClient = reqwest::Client;
pub type PgClient = tokio_postgres::Client;

/// GET a JSON document from a source and deserialize it.
#[async_trait]
pub trait Http<T> {
    async fn fetch(http_client: &HttpClient, url: &String) -> anyhow::Result<T>;
}

/// Write a fetched dataset to PostgreSQL inside one transaction.
#[async_trait]
pub trait Postgres<T> {
    /// Whatever the rows need besides the payload itself (poll time, ...).
    type Info;

    async fn insert(data: T, pg_client: &mut PgClient, info: Self::Info) -> anyhow::Result<()>;
}

/// Extract, transform and load one poll of a source.
#[async_trait]
pub trait Api<T> {
    async fn etl(&self, http_client: &HttpClient, pg_client: &mut PgClient) -> anyhow::Result<()>;
}

/// Open a PostgreSQL connection and drive it on its own task.
pub async fn connect(url: &str) -> anyhow::Result<PgClient> {
    debug!("Establishing PostgreSQL connection");
    let (pg_client, pg_conn) = tokio_postgres::connect(url, NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = pg_conn.await {
            error!("connection error: {}", e);
        }
    });
    debug!("PostgreSQL connection established");
    Ok(pg_client)
}
