//! Persistent record store
//!
//! Records are postcard-encoded into a fjall keyspace under `record:{id}`.
//! Listing and counting scan that key prefix. Writes are serialized with an
//! async mutex so update and delete see a consistent existence check.

use std::path::Path;

use fjall::Keyspace;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::models::AggregateRecord;
use crate::{Result, WeatherIntelError};

const RECORD_PREFIX: &str = "record:";
const DEFAULT_LIMIT: usize = 50;

fn record_key(id: &Uuid) -> Vec<u8> {
    format!("{RECORD_PREFIX}{id}").into_bytes()
}

fn storage_error(e: impl std::fmt::Display) -> WeatherIntelError {
    WeatherIntelError::storage(e.to_string())
}

/// Listing and counting filters. Text filters are case-insensitive
/// substring matches, `user_id` must match exactly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordFilter {
    pub city: Option<String>,
    pub country: Option<String>,
    pub user_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl RecordFilter {
    fn contains(haystack: &str, needle: Option<&String>) -> bool {
        match needle.map(|n| n.trim()).filter(|n| !n.is_empty()) {
            Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }

    #[must_use]
    pub fn matches(&self, record: &AggregateRecord) -> bool {
        let location = &record.resolved_location;
        Self::contains(&location.city, self.city.as_ref())
            && Self::contains(&location.country, self.country.as_ref())
            && self
                .user_id
                .as_deref()
                .is_none_or(|user| record.user_id.as_deref() == Some(user))
    }
}

pub struct RecordStore {
    store: Keyspace,
    write_lock: Mutex<()>,
}

fn read_bytes(store: &Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key).map_err(storage_error)?.map(|v| v.to_vec()))
}

fn read_record(store: &Keyspace, id: &Uuid) -> Result<Option<AggregateRecord>> {
    read_bytes(store, &record_key(id))?
        .map(|bytes| postcard::from_bytes(&bytes).map_err(storage_error))
        .transpose()
}

fn scan_records(store: &Keyspace) -> Result<Vec<AggregateRecord>> {
    store
        .prefix(RECORD_PREFIX)
        .map(|guard| {
            let bytes = guard.value().map_err(storage_error)?;
            postcard::from_bytes(&bytes).map_err(storage_error)
        })
        .collect()
}

fn write_record(store: &Keyspace, record: &AggregateRecord) -> Result<()> {
    let bytes = postcard::to_stdvec(record).map_err(storage_error)?;
    store
        .insert(record_key(&record.id), bytes)
        .map_err(storage_error)?;
    Ok(())
}

impl RecordStore {
    /// Open or create the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open().map_err(storage_error)?;
        let store = db
            .keyspace("weather_requests", fjall::KeyspaceCreateOptions::default)
            .map_err(storage_error)?;
        Ok(Self {
            store,
            write_lock: Mutex::new(()),
        })
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Keyspace) -> Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        task::spawn_blocking(move || f(store))
            .await
            .map_err(storage_error)?
    }

    #[instrument(name = "store_insert", level = "debug", skip(self, record), fields(id = %record.id))]
    pub async fn insert(&self, record: &AggregateRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let record = record.clone();
        self.blocking(move |store| write_record(&store, &record)).await
    }

    #[instrument(name = "store_get", level = "debug", skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Option<AggregateRecord>> {
        self.blocking(move |store| read_record(&store, &id)).await
    }

    /// Replace an existing record. Fails with `NotFound` if it was deleted.
    #[instrument(name = "store_update", level = "debug", skip(self, record), fields(id = %record.id))]
    pub async fn update(&self, record: &AggregateRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let record = record.clone();
        self.blocking(move |store| {
            if !store.contains_key(record_key(&record.id)).map_err(storage_error)? {
                return Err(WeatherIntelError::not_found(format!(
                    "Weather request {}",
                    record.id
                )));
            }
            write_record(&store, &record)
        })
        .await
    }

    /// Returns whether a record was removed
    #[instrument(name = "store_delete", level = "debug", skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        self.blocking(move |store| {
            let key = record_key(&id);
            if !store.contains_key(&key).map_err(storage_error)? {
                return Ok(false);
            }
            store.remove(key).map_err(storage_error)?;
            Ok(true)
        })
        .await
    }

    /// Matching records, newest first
    #[instrument(name = "store_list", level = "debug", skip(self))]
    pub async fn list(&self, filter: &RecordFilter) -> Result<Vec<AggregateRecord>> {
        let offset = filter.offset.unwrap_or(0);
        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT);
        let mut records = self.matching(filter).await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records.into_iter().skip(offset).take(limit).collect())
    }

    /// Number of matching records, ignoring limit and offset
    #[instrument(name = "store_count", level = "debug", skip(self))]
    pub async fn count(&self, filter: &RecordFilter) -> Result<usize> {
        Ok(self.matching(filter).await?.len())
    }

    async fn matching(&self, filter: &RecordFilter) -> Result<Vec<AggregateRecord>> {
        let filter = filter.clone();
        let records = self
            .blocking(move |store| {
                let mut records = scan_records(&store)?;
                records.retain(|record| filter.matches(record));
                Ok(records)
            })
            .await?;
        debug!("{} records matched", records.len());
        Ok(records)
    }
}
