// src/store/memory.rs
//! In-process [`BlobStore`] test double: race barrier, write counter and simulated read failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Barrier;

use super::BlobStore;
use crate::error::StoreError;

const URL_PREFIX: &str = "memory://";

#[derive(Default)]
struct ArmedBarrier {
    barrier: Option<Arc<Barrier>>,
    remaining: usize,
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    fail_reads: AtomicBool,
    read_barrier: Mutex<ArmedBarrier>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `parties` fetches each take their snapshot, then wait until all of
    /// them have read before returning. Reproduces two writers racing on one version.
    pub fn arm_read_barrier(&self, parties: usize) {
        let mut g = self.read_barrier.lock().unwrap_or_else(|p| p.into_inner());
        g.barrier = Some(Arc::new(Barrier::new(parties)));
        g.remaining = parties;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn insert_raw(&self, pathname: &str, body: Vec<u8>) {
        self.objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(pathname.to_string(), body);
    }

    pub fn get_raw(&self, pathname: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(pathname)
            .cloned()
    }

    fn take_barrier(&self) -> Option<Arc<Barrier>> {
        let mut g = self.read_barrier.lock().unwrap_or_else(|p| p.into_inner());
        if g.remaining == 0 {
            return None;
        }
        g.remaining -= 1;
        let b = g.barrier.clone();
        if g.remaining == 0 {
            g.barrier = None;
        }
        b
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn locate(&self, pathname: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Read("simulated list failure".into()));
        }
        let objects = self.objects.lock().unwrap_or_else(|p| p.into_inner());
        Ok(objects
            .contains_key(pathname)
            .then(|| format!("{URL_PREFIX}{pathname}")))
    }

    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Read("simulated fetch failure".into()));
        }
        let pathname = url.strip_prefix(URL_PREFIX).unwrap_or(url);
        let snapshot = self.get_raw(pathname);
        if let Some(barrier) = self.take_barrier() {
            barrier.wait().await;
        }
        Ok(snapshot)
    }

    async fn put(
        &self,
        pathname: &str,
        body: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StoreError> {
        self.insert_raw(pathname, body);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{URL_PREFIX}{pathname}"))
    }
}
