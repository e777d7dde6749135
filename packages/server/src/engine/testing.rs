//! Fakes shared by the engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::StorageObjectCreated;
use common::storage::{ObjectStore, StorageError, UploadStream};
use mq::error::MqError;
use tokio::io::AsyncReadExt;

use super::notifier::EventNotifier;

/// Blob store keeping objects in a map.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    failing_deletes: Mutex<HashSet<String>>,
    fail_puts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, bytes: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn fail_delete(&self, key: &str) {
        self.failing_deletes.lock().unwrap().insert(key.to_string());
    }

    /// Make every put fail after consuming the stream.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        _size_hint: Option<u64>,
        reader: UploadStream<'_>,
    ) -> Result<String, StorageError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        if self.fail_puts.load(Ordering::SeqCst) {
            // Keep the partial object so cleanup has something to remove.
            self.insert(key, &bytes);
            return Err(StorageError::Backend("injected put failure".into()));
        }
        self.insert(key, &bytes);
        Ok(format!("mem://{key}"))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self.failing_deletes.lock().unwrap().contains(key) {
            return Err(StorageError::Backend(format!("injected delete failure for {key}")));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        if !self.contains(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(format!("mem://{key}?ttl={}", ttl.as_secs()))
    }
}

/// Notifier remembering every event, optionally failing each publish.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<StorageObjectCreated>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn events(&self) -> Vec<StorageObjectCreated> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventNotifier for RecordingNotifier {
    async fn publish(&self, event: &StorageObjectCreated) -> Result<(), MqError> {
        self.events.lock().unwrap().push(event.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(MqError::Publish("broker down".into()));
        }
        Ok(())
    }
}

/// Wait up to two seconds for background work to satisfy `check`.
pub async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
