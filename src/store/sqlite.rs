//! SQLite-backed store.

use super::{EmbeddingRecord, EmbeddingStore, TranscriptStore, VideoListing};
use crate::error::{Result, TubeChatError};
use crate::transcript::{TranscriptRecord, VideoInfo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS transcripts (
        video_id TEXT PRIMARY KEY,
        raw_text TEXT NOT NULL,
        title TEXT NOT NULL,
        channel TEXT NOT NULL,
        duration TEXT NOT NULL,
        thumbnail_url TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS embeddings (
        video_id TEXT NOT NULL,
        chunk_index INTEGER NOT NULL,
        chunk_text TEXT NOT NULL,
        embedding BLOB NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (video_id, chunk_index)
    );

    CREATE INDEX IF NOT EXISTS idx_transcripts_created_at ON transcripts(created_at);
"#;

/// SQLite store for transcripts and embeddings.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TubeChatError::Store(format!("Failed to acquire lock: {}", e)))
    }

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }
}

fn parse_time(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl TranscriptStore for SqliteStore {
    #[instrument(skip(self, record), fields(video_id = %record.video_id))]
    async fn save_transcript(&self, record: &TranscriptRecord) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO transcripts
            (video_id, raw_text, title, channel, duration, thumbnail_url, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(video_id) DO UPDATE SET
                raw_text = excluded.raw_text,
                title = excluded.title,
                channel = excluded.channel,
                duration = excluded.duration,
                thumbnail_url = excluded.thumbnail_url,
                updated_at = excluded.updated_at
            "#,
            params![
                record.video_id,
                record.raw_text,
                record.title,
                record.channel,
                record.duration,
                record.thumbnail_url,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )?;

        debug!("Saved transcript ({} chars)", record.raw_text.len());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_transcript(&self, video_id: &str) -> Result<Option<TranscriptRecord>> {
        let conn = self.conn()?;

        let result = conn.query_row(
            r#"
            SELECT video_id, raw_text, title, channel, duration, thumbnail_url, created_at, updated_at
            FROM transcripts WHERE video_id = ?1
            "#,
            params![video_id],
            |row| {
                let created_at: String = row.get(6)?;
                let updated_at: String = row.get(7)?;
                Ok(TranscriptRecord {
                    video_id: row.get(0)?,
                    raw_text: row.get(1)?,
                    title: row.get(2)?,
                    channel: row.get(3)?,
                    duration: row.get(4)?,
                    thumbnail_url: row.get(5)?,
                    created_at: parse_time(&created_at),
                    updated_at: parse_time(&updated_at),
                })
            },
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn list_transcripts(&self) -> Result<Vec<VideoListing>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT t.video_id, t.title, t.channel, t.duration, t.thumbnail_url,
                   t.created_at, t.updated_at,
                   (SELECT COUNT(*) FROM embeddings e WHERE e.video_id = t.video_id)
            FROM transcripts t
            ORDER BY t.created_at DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let created_at: String = row.get(5)?;
            let updated_at: String = row.get(6)?;
            let count: i64 = row.get(7)?;
            Ok(VideoListing {
                info: VideoInfo {
                    video_id: row.get(0)?,
                    title: row.get(1)?,
                    channel: row.get(2)?,
                    duration: row.get(3)?,
                    thumbnail_url: row.get(4)?,
                },
                created_at: parse_time(&created_at),
                updated_at: parse_time(&updated_at),
                embedding_count: count as usize,
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

#[async_trait]
impl EmbeddingStore for SqliteStore {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn replace_embeddings(&self, video_id: &str, records: &[EmbeddingRecord]) -> Result<usize> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute("DELETE FROM embeddings WHERE video_id = ?1", params![video_id])?;

        let now = Utc::now().to_rfc3339();
        for record in records {
            tx.execute(
                r#"
                INSERT INTO embeddings (video_id, chunk_index, chunk_text, embedding, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    video_id,
                    record.chunk_index as i64,
                    record.chunk_text,
                    Self::embedding_to_bytes(&record.vector),
                    now,
                ],
            )?;
        }

        tx.commit()?;
        info!("Stored {} embeddings for video {}", records.len(), video_id);
        Ok(records.len())
    }

    #[instrument(skip(self))]
    async fn get_embeddings(&self, video_id: &str) -> Result<Vec<EmbeddingRecord>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT video_id, chunk_index, chunk_text, embedding
            FROM embeddings
            WHERE video_id = ?1
            ORDER BY chunk_index
            "#,
        )?;

        let rows = stmt.query_map(params![video_id], |row| {
            let index: i64 = row.get(1)?;
            let bytes: Vec<u8> = row.get(3)?;
            Ok(EmbeddingRecord {
                video_id: row.get(0)?,
                chunk_index: index as usize,
                chunk_text: row.get(2)?,
                vector: Self::bytes_to_embedding(&bytes),
            })
        })?;

        let records = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        debug!("Loaded {} embeddings for video {}", records.len(), video_id);
        Ok(records)
    }

    async fn embedding_count(&self, video_id: &str) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM embeddings WHERE video_id = ?1",
            params![video_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn delete_embeddings(&self, video_id: &str) -> Result<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM embeddings WHERE video_id = ?1", params![video_id])?;
        info!("Deleted {} embeddings for video {}", deleted, video_id);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(video_id: &str, text: &str) -> TranscriptRecord {
        TranscriptRecord::new(text, &VideoInfo::fallback(video_id))
    }

    fn embedding(video_id: &str, index: usize, vector: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord {
            video_id: video_id.to_string(),
            chunk_index: index,
            chunk_text: format!("chunk {}", index),
            vector,
        }
    }

    #[tokio::test]
    async fn test_transcript_upsert_keeps_created_at() {
        let store = SqliteStore::in_memory().unwrap();
        let first = record("abcdefghijk", "[00:00] first");
        store.save_transcript(&first).await.unwrap();

        let mut second = record("abcdefghijk", "[00:00] second");
        second.created_at = first.created_at + chrono::Duration::days(1);
        second.updated_at = second.created_at;
        store.save_transcript(&second).await.unwrap();

        let loaded = store.get_transcript("abcdefghijk").await.unwrap().unwrap();
        assert_eq!(loaded.raw_text, "[00:00] second");
        assert_eq!(loaded.created_at.timestamp(), first.created_at.timestamp());
        assert_eq!(loaded.updated_at.timestamp(), second.updated_at.timestamp());
        assert!(store.has_transcript("abcdefghijk").await.unwrap());
        assert!(!store.has_transcript("zzzzzzzzzzz").await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_embeddings_discards_previous_set() {
        let store = SqliteStore::in_memory().unwrap();
        let vid = "abcdefghijk";

        let initial: Vec<_> = (0..4).map(|i| embedding(vid, i, vec![i as f32, 0.5])).collect();
        store.replace_embeddings(vid, &initial).await.unwrap();
        assert_eq!(store.embedding_count(vid).await.unwrap(), 4);

        let replacement = vec![embedding(vid, 1, vec![0.25, -1.5]), embedding(vid, 0, vec![1.0, 2.0])];
        store.replace_embeddings(vid, &replacement).await.unwrap();

        let loaded = store.get_embeddings(vid).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].chunk_index, 0);
        assert_eq!(loaded[0].vector, vec![1.0, 2.0]);
        assert_eq!(loaded[1].vector, vec![0.25, -1.5]);
    }

    #[tokio::test]
    async fn test_embeddings_are_scoped_per_video() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .replace_embeddings("aaaaaaaaaaa", &[embedding("aaaaaaaaaaa", 0, vec![1.0])])
            .await
            .unwrap();
        store
            .replace_embeddings("bbbbbbbbbbb", &[embedding("bbbbbbbbbbb", 0, vec![2.0])])
            .await
            .unwrap();

        assert_eq!(store.delete_embeddings("aaaaaaaaaaa").await.unwrap(), 1);
        assert!(!store.has_embeddings("aaaaaaaaaaa").await.unwrap());
        assert!(store.has_embeddings("bbbbbbbbbbb").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_transcripts_newest_first() {
        let store = SqliteStore::in_memory().unwrap();
        let mut older = record("aaaaaaaaaaa", "[00:00] a");
        older.created_at = older.created_at - chrono::Duration::hours(1);
        store.save_transcript(&older).await.unwrap();
        store.save_transcript(&record("bbbbbbbbbbb", "[00:00] b")).await.unwrap();
        store
            .replace_embeddings("aaaaaaaaaaa", &[embedding("aaaaaaaaaaa", 0, vec![1.0])])
            .await
            .unwrap();

        let listings = store.list_transcripts().await.unwrap();
        let ids: Vec<&str> = listings.iter().map(|l| l.info.video_id.as_str()).collect();
        assert_eq!(ids, vec!["bbbbbbbbbbb", "aaaaaaaaaaa"]);
        assert_eq!(listings[1].embedding_count, 1);
        assert_eq!(listings[0].embedding_count, 0);
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tubechat.db");
        {
            let store = SqliteStore::new(&path).unwrap();
            store.save_transcript(&record("abcdefghijk", "[00:00] hi")).await.unwrap();
        }
        let store = SqliteStore::new(&path).unwrap();
        assert!(store.has_transcript("abcdefghijk").await.unwrap());
    }
}
