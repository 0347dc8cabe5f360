use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgListener, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{ConnectOptions, PgPool};
use tokio::sync::mpsc;

use super::{Direction, DocumentStore, OrderBy, Snapshot, StoreError, Subscription};
use crate::config::Config;
use crate::models::Document;

/// Channel the bundled migration notifies with the changed collection's name.
const CHANGES_CHANNEL: &str = "document_changes";

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    data: Json<serde_json::Value>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document::from_value(row.id, row.data.0)
    }
}

/// Document store backed by a single Postgres `documents` table
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a new store with a connection pool
    pub async fn new(database_url: &str, config: &Config) -> Result<Self, StoreError> {
        let options =
            PgConnectOptions::from_str(database_url)?.log_statements(config.sql_log_level);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        if config.run_migrations {
            sqlx::migrate!().run(&pool).await?;
            tracing::info!("Database migrations applied");
        }

        Ok(Self { pool })
    }

    async fn fetch_collection(
        pool: &PgPool,
        collection: &str,
        order: Option<&OrderBy>,
    ) -> Result<Vec<Document>, sqlx::Error> {
        let rows = match order {
            None => {
                sqlx::query_as::<_, DocumentRow>(
                    "SELECT id, data FROM documents WHERE collection = $1 ORDER BY id ASC",
                )
                .bind(collection)
                .fetch_all(pool)
                .await?
            }
            Some(order) => {
                let sql = match order.direction {
                    Direction::Ascending => {
                        r#"
                        SELECT id, data FROM documents
                        WHERE collection = $1
                        ORDER BY data -> $2::text ASC NULLS LAST, id ASC
                        "#
                    }
                    Direction::Descending => {
                        r#"
                        SELECT id, data FROM documents
                        WHERE collection = $1
                        ORDER BY data -> $2::text DESC NULLS LAST, id ASC
                        "#
                    }
                };
                sqlx::query_as::<_, DocumentRow>(sql)
                    .bind(collection)
                    .bind(&order.field)
                    .fetch_all(pool)
                    .await?
            }
        };

        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn pump(
        pool: PgPool,
        collection: String,
        order: OrderBy,
        sender: mpsc::Sender<Result<Snapshot, StoreError>>,
    ) {
        if let Err(err) = Self::watch_collection(&pool, &collection, &order, &sender).await {
            tracing::error!(collection = %collection, error = %err, "Subscription stopped");
            sender.send(Err(err)).await.ok();
        }
    }

    async fn watch_collection(
        pool: &PgPool,
        collection: &str,
        order: &OrderBy,
        sender: &mpsc::Sender<Result<Snapshot, StoreError>>,
    ) -> Result<(), StoreError> {
        // Listen before the first read so no change slips between the two.
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(CHANGES_CHANNEL).await?;

        loop {
            let snapshot = Self::fetch_collection(pool, collection, Some(order)).await?;
            tracing::debug!(collection = %collection, documents = snapshot.len(), "Snapshot read");
            if sender.send(Ok(snapshot)).await.is_err() {
                return Ok(());
            }

            loop {
                match listener.try_recv().await? {
                    Some(notification) if notification.payload() == collection => break,
                    Some(_) => continue,
                    None => {
                        // The listener reconnects on the next call; changes made
                        // in between were not announced, so re-read anyway.
                        tracing::warn!(collection = %collection, "Change listener lost its connection");
                        break;
                    }
                }
            }
        }
    }
}

impl DocumentStore for PgDocumentStore {
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        Ok(Self::fetch_collection(&self.pool, collection, None).await?)
    }

    fn subscribe(&self, collection: &str, order: OrderBy) -> Subscription {
        let pool = self.pool.clone();
        let collection = collection.to_string();
        Subscription::spawn(move |sender| Self::pump(pool, collection, order, sender))
    }
}
