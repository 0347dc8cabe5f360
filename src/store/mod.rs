//! Access to the remote document store.
//!
//! A store hands out one-shot listings and live subscriptions over named
//! collections. Each subscription owns the task that feeds it, so dropping
//! the handle is enough to stop receiving snapshots.

mod memory;
mod postgres;
mod subscription;

use std::future::Future;
use std::path::PathBuf;

use serde::Deserialize;

use crate::models::Document;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use subscription::{Snapshot, Subscription};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to apply migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("failed to read seed file {path}: {source}")]
    SeedRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid seed data: {0}")]
    SeedFormat(#[from] serde_json::Error),
    #[error("document store is offline")]
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    #[default]
    Descending,
}

/// Ordering applied to every snapshot of a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

pub trait DocumentStore: Send + Sync {
    /// Read every document of a collection once.
    fn list_documents(
        &self,
        collection: &str,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    /// Start a live subscription. The first item is the current contents of
    /// the collection; a new full snapshot follows every change.
    fn subscribe(&self, collection: &str, order: OrderBy) -> Subscription;
}
