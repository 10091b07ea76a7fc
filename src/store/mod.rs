// src/store/mod.rs
//! Single-document JSON stores on top of a remote object store.
//!
//! Each collection is one JSON array under a fixed path and is rewritten in full on
//! every mutation. There is no compare-and-swap: two writers that read the same
//! version both overwrite it, and the later overwrite wins. Callers that need more
//! than one concurrent producer must serialize writes themselves.

pub mod blob;
pub mod memory;

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde::{de::DeserializeOwned, Serialize};

use crate::analyze::types::NewsRecord;
use crate::error::StoreError;
use crate::ingest::types::PendingItem;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Minimal object-store surface: resolve a path, read a URL, overwrite a path.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Current public URL of `pathname`, or `None` if nothing is stored there yet.
    async fn locate(&self, pathname: &str) -> Result<Option<String>, StoreError>;

    /// Freshest bytes behind `url` (intermediate caches bypassed). `None` if gone.
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Full replace of `pathname`: stable name, public read, returns the public URL.
    async fn put(
        &self,
        pathname: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError>;
}

pub type DynBlobStore = Arc<dyn BlobStore>;

/// A JSON array of `T` persisted as one object.
pub struct JsonArrayDocument<T> {
    blob: DynBlobStore,
    path: String,
    _item: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonArrayDocument<T> {
    fn clone(&self) -> Self {
        Self {
            blob: self.blob.clone(),
            path: self.path.clone(),
            _item: PhantomData,
        }
    }
}

impl<T> JsonArrayDocument<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    pub fn new(blob: DynBlobStore, path: impl Into<String>) -> Self {
        Self {
            blob,
            path: path.into(),
            _item: PhantomData,
        }
    }

    /// Read the document. Missing and unparsable documents both read as empty;
    /// transport failures are returned so a writer never overwrites on a failed read.
    pub async fn read(&self) -> Result<Vec<T>, StoreError> {
        let Some(url) = self.blob.locate(&self.path).await? else {
            return Ok(Vec::new());
        };
        let Some(bytes) = self.blob.fetch(&url).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_slice::<Vec<T>>(&bytes) {
            Ok(items) => Ok(items),
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "document unparsable; treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Fail-open read for listing: any failure yields an empty sequence.
    pub async fn list_all(&self) -> Vec<T> {
        match self.read().await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "document read failed; listing as empty");
                Vec::new()
            }
        }
    }

    pub async fn overwrite(&self, items: &[T]) -> Result<(), StoreError> {
        let body = serde_json::to_vec(items)?;
        self.blob.put(&self.path, body, JSON_CONTENT_TYPE).await?;
        Ok(())
    }

    /// Read-modify-write with `item` placed at the head.
    pub async fn prepend(&self, item: T) -> Result<usize, StoreError> {
        let mut items = self.read().await?;
        items.insert(0, item);
        self.overwrite(&items).await?;
        Ok(items.len())
    }
}

/// Pending queue, newest first.
#[derive(Clone)]
pub struct QueueStore {
    doc: JsonArrayDocument<PendingItem>,
}

impl QueueStore {
    pub fn new(blob: DynBlobStore, path: impl Into<String>) -> Self {
        Self {
            doc: JsonArrayDocument::new(blob, path),
        }
    }

    pub async fn list_all(&self) -> Vec<PendingItem> {
        self.doc.list_all().await
    }

    pub async fn append(&self, item: PendingItem) -> Result<(), StoreError> {
        let id = item.id.clone();
        let len = self.doc.prepend(item).await?;
        counter!("queue_writes_total").increment(1);
        tracing::info!(target: "pipeline", %id, queue_len = len, "queue item appended");
        Ok(())
    }

    /// Drop the item with `id`. Returns `false` (and skips the write) if it was not present.
    pub async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let items = self.doc.read().await?;
        let before = items.len();
        let kept: Vec<PendingItem> = items.into_iter().filter(|it| it.id != id).collect();
        if kept.len() == before {
            return Ok(false);
        }
        self.doc.overwrite(&kept).await?;
        counter!("queue_writes_total").increment(1);
        tracing::info!(target: "pipeline", %id, stage = "Discarded", queue_len = kept.len(), "queue item removed");
        Ok(true)
    }

    pub async fn find(&self, id: &str) -> Result<Option<PendingItem>, StoreError> {
        Ok(self.doc.read().await?.into_iter().find(|it| it.id == id))
    }
}

/// Committed news records, newest first.
#[derive(Clone)]
pub struct RecordStore {
    doc: JsonArrayDocument<NewsRecord>,
}

impl RecordStore {
    pub fn new(blob: DynBlobStore, path: impl Into<String>) -> Self {
        Self {
            doc: JsonArrayDocument::new(blob, path),
        }
    }

    pub async fn list_all(&self) -> Vec<NewsRecord> {
        self.doc.list_all().await
    }

    pub async fn commit(&self, record: NewsRecord) -> Result<(), StoreError> {
        let id = record.id.clone();
        let len = self.doc.prepend(record).await?;
        tracing::info!(target: "pipeline", %id, stage = "Committed", records = len, "record committed");
        Ok(())
    }
}
