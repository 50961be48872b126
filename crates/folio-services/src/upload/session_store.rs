//! In-memory chunked upload sessions.
//!
//! A session is created implicitly by the first chunk that arrives for an
//! upload id and lives until the chunk with the last index triggers assembly,
//! the session fails, or the reaper expires it. Terminal states are kept as
//! tombstones for a bounded window so late or duplicate chunks get a precise
//! error instead of silently opening a fresh session.

use bytes::Bytes;
use folio_core::models::MediaKind;
use folio_core::{AppError, UploadLimits};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// One chunk request, as decoded from the multipart form.
#[derive(Debug, Clone)]
pub struct ChunkUpload {
    pub upload_id: String,
    /// Zero-based index of this chunk.
    pub chunk_index: u32,
    /// Declared chunk count, fixed for the whole session.
    pub total_chunks: u32,
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// A fully collected upload, ready for the persistence pipeline.
#[derive(Debug)]
pub struct AssembledUpload {
    pub file_name: String,
    pub content_type: String,
    pub kind: MediaKind,
    pub data: Vec<u8>,
}

/// Outcome of accepting one chunk.
#[derive(Debug)]
pub enum ChunkOutcome {
    /// Non-final chunk retained; the response must not carry a URL.
    Buffered { received: u32, total: u32 },
    /// Final chunk arrived and every index was present.
    Complete(AssembledUpload),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClosedState {
    Completed,
    Failed,
    Expired,
}

struct Session {
    file_name: String,
    content_type: String,
    kind: MediaKind,
    total_chunks: u32,
    chunks: Vec<Option<Bytes>>,
    received: u32,
    buffered_bytes: usize,
    max_total_bytes: usize,
    created_at: Instant,
}

struct Inner {
    sessions: HashMap<String, Session>,
    closed: HashMap<String, (ClosedState, Instant)>,
}

/// Store for in-flight chunked upload sessions.
pub struct ChunkStore {
    limits: UploadLimits,
    session_ttl: Duration,
    tombstone_ttl: Duration,
    inner: Mutex<Inner>,
}

impl ChunkStore {
    pub fn new(limits: UploadLimits) -> Self {
        let session_ttl = Duration::from_secs(limits.session_ttl_secs);
        Self {
            limits,
            session_ttl,
            // Keep terminal states around long enough for straggler chunks
            // of a closed upload to get a meaningful error. Never shorter
            // than a minute, whatever the session TTL is configured to.
            tombstone_ttl: session_ttl.saturating_mul(4).max(Duration::from_secs(60)),
            inner: Mutex::new(Inner {
                sessions: HashMap::new(),
                closed: HashMap::new(),
            }),
        }
    }

    /// Accept one chunk. Non-final chunks are retained; the chunk carrying
    /// the last index triggers assembly in strict index order. A gap at
    /// assembly time fails the session permanently.
    pub async fn put_chunk(&self, chunk: ChunkUpload) -> Result<ChunkOutcome, AppError> {
        if chunk.total_chunks == 0 {
            return Err(AppError::InvalidInput(
                "totalChunks must be greater than 0".to_string(),
            ));
        }
        if chunk.total_chunks > self.limits.max_chunk_count {
            return Err(AppError::InvalidInput(format!(
                "totalChunks {} exceeds maximum {}",
                chunk.total_chunks, self.limits.max_chunk_count
            )));
        }
        if chunk.chunk_index >= chunk.total_chunks {
            return Err(AppError::InvalidInput(format!(
                "chunkIndex {} out of range for totalChunks {}",
                chunk.chunk_index, chunk.total_chunks
            )));
        }
        if chunk.data.is_empty() {
            return Err(AppError::InvalidInput("Chunk is empty".to_string()));
        }
        if chunk.data.len() > self.limits.max_chunk_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Chunk size {} bytes exceeds maximum {} bytes",
                chunk.data.len(),
                self.limits.max_chunk_bytes
            )));
        }

        let mut inner = self.inner.lock().await;

        if let Some((state, _)) = inner.closed.get(&chunk.upload_id) {
            return Err(match state {
                ClosedState::Completed => AppError::BadRequest(format!(
                    "Upload '{}' is already completed; use a new upload id",
                    chunk.upload_id
                )),
                ClosedState::Failed => AppError::BadRequest(format!(
                    "Upload '{}' previously failed; restart with a new upload id",
                    chunk.upload_id
                )),
                ClosedState::Expired => AppError::SessionExpired(format!(
                    "Upload session '{}' has expired",
                    chunk.upload_id
                )),
            });
        }

        // Lazy expiry: a late chunk for an overdue session gets the same
        // error whether or not the reaper got there first.
        if let Some(session) = inner.sessions.get(&chunk.upload_id) {
            if session.created_at.elapsed() > self.session_ttl {
                inner.sessions.remove(&chunk.upload_id);
                inner
                    .closed
                    .insert(chunk.upload_id.clone(), (ClosedState::Expired, Instant::now()));
                return Err(AppError::SessionExpired(format!(
                    "Upload session '{}' has expired",
                    chunk.upload_id
                )));
            }
        }

        let session = match inner.sessions.entry(chunk.upload_id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                // First chunk to arrive (any index) creates the session; kind
                // is resolved once here from the declared content type.
                let kind = self
                    .limits
                    .resolve_kind(&chunk.content_type)
                    .ok_or_else(|| {
                        AppError::InvalidInput(format!(
                            "Unsupported content type: {}",
                            chunk.content_type
                        ))
                    })?;
                let max_total_bytes = self.limits.limits_for(kind).max_file_size;
                tracing::debug!(
                    upload_id = %chunk.upload_id,
                    total_chunks = chunk.total_chunks,
                    kind = %kind,
                    "Created upload session"
                );
                entry.insert(Session {
                    file_name: chunk.file_name.clone(),
                    content_type: chunk.content_type.clone(),
                    kind,
                    total_chunks: chunk.total_chunks,
                    chunks: vec![None; chunk.total_chunks as usize],
                    received: 0,
                    buffered_bytes: 0,
                    max_total_bytes,
                    created_at: Instant::now(),
                })
            }
        };

        if session.total_chunks != chunk.total_chunks {
            return Err(AppError::InvalidInput(format!(
                "totalChunks changed mid-session: session has {}, chunk declares {}",
                session.total_chunks, chunk.total_chunks
            )));
        }

        let slot = &mut session.chunks[chunk.chunk_index as usize];
        if let Some(previous) = slot.take() {
            // Resend of an already-buffered index: last write wins.
            session.buffered_bytes -= previous.len();
            session.received -= 1;
        }

        if session.buffered_bytes + chunk.data.len() > session.max_total_bytes {
            let max_total_bytes = session.max_total_bytes;
            inner.sessions.remove(&chunk.upload_id);
            inner
                .closed
                .insert(chunk.upload_id.clone(), (ClosedState::Failed, Instant::now()));
            return Err(AppError::PayloadTooLarge(format!(
                "Upload exceeds maximum allowed size of {} MB",
                max_total_bytes / 1024 / 1024
            )));
        }

        session.buffered_bytes += chunk.data.len();
        session.received += 1;
        *slot = Some(chunk.data);

        let is_final = chunk.chunk_index == chunk.total_chunks - 1;
        if !is_final {
            let received = session.received;
            let total = session.total_chunks;
            tracing::debug!(
                upload_id = %chunk.upload_id,
                chunk_index = chunk.chunk_index,
                received,
                total,
                "Chunk buffered"
            );
            return Ok(ChunkOutcome::Buffered { received, total });
        }

        // Final index arrived: the session is closed either way, so move its
        // contents out and assemble strictly by ascending index.
        let chunks = std::mem::take(&mut session.chunks);
        let file_name = std::mem::take(&mut session.file_name);
        let content_type = std::mem::take(&mut session.content_type);
        let kind = session.kind;
        let total_chunks = session.total_chunks;
        let buffered_bytes = session.buffered_bytes;
        inner.sessions.remove(&chunk.upload_id);

        let missing: Vec<u32> = chunks
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i as u32)
            .collect();

        if !missing.is_empty() {
            inner
                .closed
                .insert(chunk.upload_id.clone(), (ClosedState::Failed, Instant::now()));
            let missing_list = missing
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                upload_id = %chunk.upload_id,
                missing = %missing_list,
                "Upload assembly failed: missing chunks"
            );
            return Err(AppError::AssemblyFailed(format!(
                "Missing chunk indices: {}",
                missing_list
            )));
        }

        let mut data = Vec::with_capacity(buffered_bytes);
        for slot in chunks.into_iter().flatten() {
            data.extend_from_slice(&slot);
        }

        inner
            .closed
            .insert(chunk.upload_id.clone(), (ClosedState::Completed, Instant::now()));

        tracing::info!(
            upload_id = %chunk.upload_id,
            total_chunks,
            total_bytes = data.len(),
            "Upload assembled from chunks"
        );

        Ok(ChunkOutcome::Complete(AssembledUpload {
            file_name,
            content_type,
            kind,
            data,
        }))
    }

    /// Overwrite the terminal state of an upload id with `Failed`. Called
    /// when persistence of an assembled upload fails after the store already
    /// closed the session.
    pub async fn mark_failed(&self, upload_id: &str) {
        let mut inner = self.inner.lock().await;
        inner
            .closed
            .insert(upload_id.to_string(), (ClosedState::Failed, Instant::now()));
    }

    /// Discard sessions older than the configured TTL and prune old
    /// tombstones. Returns the number of sessions expired.
    pub async fn reap_expired(&self) -> usize {
        let mut inner = self.inner.lock().await;

        let expired: Vec<String> = inner
            .sessions
            .iter()
            .filter(|(_, session)| session.created_at.elapsed() > self.session_ttl)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            inner.sessions.remove(id);
            inner.closed.insert(id.clone(), (ClosedState::Expired, Instant::now()));
            tracing::info!(upload_id = %id, "Expired abandoned upload session");
        }

        let tombstone_ttl = self.tombstone_ttl;
        inner
            .closed
            .retain(|_, (_, closed_at)| closed_at.elapsed() <= tombstone_ttl);

        expired.len()
    }

    /// Number of sessions currently collecting chunks.
    pub async fn active_sessions(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    /// Start the background reaper task.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start_reaper(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so a fresh boot does
            // not log a no-op reap.
            tick.tick().await;

            loop {
                tick.tick().await;
                let expired = self.reap_expired().await;
                if expired > 0 {
                    tracing::info!(expired, "Upload session reaper pass completed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::UploadLimits;

    fn test_limits(session_ttl_secs: u64) -> UploadLimits {
        UploadLimits {
            image_max_bytes: 10 * 1024 * 1024,
            image_allowed_extensions: vec!["png".into(), "jpg".into()],
            image_allowed_content_types: vec!["image/png".into(), "image/jpeg".into()],
            pdf_max_bytes: 50 * 1024 * 1024,
            pdf_allowed_extensions: vec!["pdf".into()],
            pdf_allowed_content_types: vec!["application/pdf".into()],
            document_max_bytes: 50 * 1024 * 1024,
            document_allowed_extensions: vec!["docx".into()],
            document_allowed_content_types: vec![
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document".into(),
            ],
            chunk_size_bytes: 2 * 1024 * 1024,
            max_chunk_bytes: 4 * 1024 * 1024,
            max_chunk_count: 16,
            session_ttl_secs,
            session_reap_interval_secs: 60,
        }
    }

    fn chunk(upload_id: &str, index: u32, total: u32, data: &[u8]) -> ChunkUpload {
        ChunkUpload {
            upload_id: upload_id.to_string(),
            chunk_index: index,
            total_chunks: total,
            file_name: "photo.png".to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::copy_from_slice(data),
        }
    }

    #[tokio::test]
    async fn assembles_in_index_order_regardless_of_arrival_order() {
        let store = ChunkStore::new(test_limits(1800));

        // Arrival order 1, 2 is not index order; assembly must still be 0..3.
        assert!(matches!(
            store.put_chunk(chunk("u1", 1, 3, b"bbb")).await.unwrap(),
            ChunkOutcome::Buffered { received: 1, total: 3 }
        ));
        assert!(matches!(
            store.put_chunk(chunk("u1", 0, 3, b"aaa")).await.unwrap(),
            ChunkOutcome::Buffered { received: 2, total: 3 }
        ));

        match store.put_chunk(chunk("u1", 2, 3, b"cc")).await.unwrap() {
            ChunkOutcome::Complete(assembled) => {
                assert_eq!(assembled.data, b"aaabbbcc");
                assert_eq!(assembled.file_name, "photo.png");
                assert_eq!(assembled.kind, MediaKind::Image);
            }
            other => panic!("Expected Complete, got {:?}", other),
        }

        assert_eq!(store.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn missing_chunk_at_assembly_fails_permanently() {
        let store = ChunkStore::new(test_limits(1800));

        store.put_chunk(chunk("u1", 0, 3, b"aaa")).await.unwrap();
        // Index 1 never arrives; the final index triggers assembly.
        let err = store.put_chunk(chunk("u1", 2, 3, b"cc")).await.unwrap_err();
        match err {
            AppError::AssemblyFailed(msg) => assert!(msg.contains('1'), "message: {}", msg),
            other => panic!("Expected AssemblyFailed, got {:?}", other),
        }

        // Retrying under the same upload id is rejected.
        let err = store.put_chunk(chunk("u1", 1, 3, b"bbb")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn completed_upload_id_cannot_be_reused() {
        let store = ChunkStore::new(test_limits(1800));

        let outcome = store.put_chunk(chunk("u1", 0, 1, b"all")).await.unwrap();
        assert!(matches!(outcome, ChunkOutcome::Complete(_)));

        let err = store.put_chunk(chunk("u1", 0, 1, b"again")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn total_chunks_must_stay_fixed() {
        let store = ChunkStore::new(test_limits(1800));

        store.put_chunk(chunk("u1", 0, 3, b"aaa")).await.unwrap();
        let err = store.put_chunk(chunk("u1", 1, 4, b"bbb")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn chunk_index_out_of_range_is_rejected() {
        let store = ChunkStore::new(test_limits(1800));

        let err = store.put_chunk(chunk("u1", 3, 3, b"x")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = store.put_chunk(chunk("u1", 0, 0, b"x")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unsupported_content_type_is_rejected_at_session_creation() {
        let store = ChunkStore::new(test_limits(1800));

        let mut c = chunk("u1", 0, 2, b"MZ");
        c.content_type = "application/x-msdownload".to_string();
        c.file_name = "tool.exe".to_string();
        let err = store.put_chunk(c).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(store.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn resent_chunk_index_overwrites_previous_bytes() {
        let store = ChunkStore::new(test_limits(1800));

        store.put_chunk(chunk("u1", 0, 2, b"old")).await.unwrap();
        store.put_chunk(chunk("u1", 0, 2, b"new")).await.unwrap();

        match store.put_chunk(chunk("u1", 1, 2, b"!")).await.unwrap() {
            ChunkOutcome::Complete(assembled) => assert_eq!(assembled.data, b"new!"),
            other => panic!("Expected Complete, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn cumulative_size_over_kind_limit_fails_session() {
        let mut limits = test_limits(1800);
        limits.image_max_bytes = 5;
        let store = ChunkStore::new(limits);

        store.put_chunk(chunk("u1", 0, 3, b"1234")).await.unwrap();
        let err = store.put_chunk(chunk("u1", 1, 3, b"5678")).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));

        // The session is closed; further chunks are rejected.
        let err = store.put_chunk(chunk("u1", 2, 3, b"x")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn reaped_session_reports_expired_to_late_chunks() {
        let store = ChunkStore::new(test_limits(0));

        store.put_chunk(chunk("u1", 0, 3, b"aaa")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(store.reap_expired().await, 1);
        assert_eq!(store.active_sessions().await, 0);

        let err = store.put_chunk(chunk("u1", 1, 3, b"bbb")).await.unwrap_err();
        assert!(matches!(err, AppError::SessionExpired(_)));
    }

    #[tokio::test]
    async fn overdue_session_expires_lazily_without_reaper() {
        let store = ChunkStore::new(test_limits(0));

        store.put_chunk(chunk("u1", 0, 3, b"aaa")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let err = store.put_chunk(chunk("u1", 1, 3, b"bbb")).await.unwrap_err();
        assert!(matches!(err, AppError::SessionExpired(_)));
    }
}
