//! File-backed store backend.
//!
//! Keeps the whole record set in one JSON document, re-read and re-written
//! per operation. Durable across restarts; writers serialize on a single
//! lock, so this backend trades the memory backend's per-room concurrency
//! for durability. Suitable for the single-relay deployments this system
//! targets.

use super::{RoomRecords, SignalStore, StoreError};
use async_trait::async_trait;
use beacon_protocol::{IceCandidate, SessionDescription};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    next_seq: u64,
    rooms: HashMap<String, RoomRecords>,
}

impl StoreDocument {
    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

/// JSON-document store.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store over the given document path.
    ///
    /// The document is created on first write; a missing file reads as an
    /// empty store.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<StoreDocument, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoreDocument::default());
            }
            Err(err) => return Err(StoreError::unavailable(err)),
        };
        serde_json::from_str(&raw).map_err(StoreError::unavailable)
    }

    async fn save(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let raw = serde_json::to_string(document).map_err(StoreError::unavailable)?;
        fs::write(&self.path, raw)
            .await
            .map_err(StoreError::unavailable)
    }

    async fn mutate<F>(&self, room_id: &str, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut RoomRecords, u64),
    {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load().await?;
        let seq = document.take_seq();
        apply(document.rooms.entry(room_id.to_string()).or_default(), seq);
        self.save(&document).await
    }
}

#[async_trait]
impl SignalStore for FileStore {
    async fn put_offer(
        &self,
        room_id: &str,
        description: SessionDescription,
    ) -> Result<(), StoreError> {
        self.mutate(room_id, |records, seq| records.set_offer(description, seq))
            .await
    }

    async fn put_answer(
        &self,
        room_id: &str,
        description: SessionDescription,
    ) -> Result<(), StoreError> {
        self.mutate(room_id, |records, seq| records.set_answer(description, seq))
            .await
    }

    async fn append_candidate(
        &self,
        room_id: &str,
        candidate: IceCandidate,
    ) -> Result<(), StoreError> {
        self.mutate(room_id, |records, seq| {
            records.push_candidate(candidate, seq);
        })
        .await
    }

    async fn offer(&self, room_id: &str) -> Result<Option<SessionDescription>, StoreError> {
        let document = self.load().await?;
        Ok(document.rooms.get(room_id).and_then(|records| {
            records
                .offer
                .as_ref()
                .map(|stamped| stamped.description.clone())
        }))
    }

    async fn answer(&self, room_id: &str) -> Result<Option<SessionDescription>, StoreError> {
        let document = self.load().await?;
        Ok(document.rooms.get(room_id).and_then(|records| {
            records
                .answer
                .as_ref()
                .map(|stamped| stamped.description.clone())
        }))
    }

    async fn candidates(&self, room_id: &str) -> Result<Vec<IceCandidate>, StoreError> {
        let document = self.load().await?;
        Ok(document
            .rooms
            .get(room_id)
            .map(|records| {
                records
                    .candidates
                    .iter()
                    .map(|stamped| stamped.candidate.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn clear_room(&self, room_id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load().await?;
        if document.rooms.remove(room_id).is_some() {
            debug!(room = %room_id, "Cleared signaling records");
            return self.save(&document).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_store_path() -> PathBuf {
        let n = TEST_FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "beacon-store-test-{}-{}.json",
            std::process::id(),
            n
        ))
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let path = temp_store_path();

        {
            let store = FileStore::new(&path);
            store
                .put_offer("r1", SessionDescription::offer("X"))
                .await
                .unwrap();
            store
                .append_candidate("r1", IceCandidate::new("candidate:1"))
                .await
                .unwrap();
        }

        let reopened = FileStore::new(&path);
        let current = reopened.current_description("r1").await.unwrap().unwrap();
        assert_eq!(current.sdp, "X");
        assert_eq!(reopened.candidates("r1").await.unwrap().len(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_last_write_wins_and_clear() {
        let path = temp_store_path();
        let store = FileStore::new(&path);

        store
            .put_answer("r1", SessionDescription::answer("Y1"))
            .await
            .unwrap();
        store
            .put_answer("r1", SessionDescription::answer("Y2"))
            .await
            .unwrap();
        assert_eq!(store.answer("r1").await.unwrap().unwrap().sdp, "Y2");

        store.clear_room("r1").await.unwrap();
        assert!(store.current_description("r1").await.unwrap().is_none());
        // Idempotent on the already-clear room.
        store.clear_room("r1").await.unwrap();

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let store = FileStore::new(temp_store_path());
        assert!(store.offer("r1").await.unwrap().is_none());
        assert!(store.candidates("r1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unwritable_path_surfaces_unavailable() {
        // A directory cannot be written as a file.
        let store = FileStore::new(std::env::temp_dir());
        let result = store.put_offer("r1", SessionDescription::offer("X")).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
