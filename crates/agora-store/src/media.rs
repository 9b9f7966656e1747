//! Media record CRUD and the eviction pass.

use chrono::Utc;
use rand::Rng;
use rusqlite::params;

use agora_shared::constants::{CLEANUP_FRACTION, MAX_MEDIA_BYTES, MEDIA_ID_PREFIX};
use agora_shared::MediaId;

use crate::data_uri;
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{MediaRecord, StoreStats};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 6;

/// Generate a fresh identifier: `media_<millis>_<random base36>`.
///
/// Collisions are accepted as negligible and not checked.
fn new_media_id() -> MediaId {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    MediaId::new(format!(
        "{}_{}_{}",
        MEDIA_ID_PREFIX,
        Utc::now().timestamp_millis(),
        suffix
    ))
}

impl Database {
    /// Store a media payload and return the full record.
    ///
    /// Rejects MIME types outside `image/*` / `video/*` and payloads over the
    /// 10 MiB ceiling without touching storage; both are validation failures,
    /// not conditions to retry.
    pub fn put_media(&self, bytes: &[u8], mime_type: &str, file_name: &str) -> Result<MediaRecord> {
        if !mime_type.starts_with("image/") && !mime_type.starts_with("video/") {
            return Err(StoreError::InvalidMediaType(mime_type.to_string()));
        }
        if bytes.len() > MAX_MEDIA_BYTES {
            return Err(StoreError::TooLarge {
                size: bytes.len(),
                max: MAX_MEDIA_BYTES,
            });
        }

        if let Some(capacity) = self.media_capacity() {
            let used = self.media_stats()?.total_bytes;
            if used + bytes.len() as u64 > capacity {
                return Err(StoreError::QuotaExceeded(format!(
                    "{} of {} bytes used, {} more requested",
                    used,
                    capacity,
                    bytes.len()
                )));
            }
        }

        let record = MediaRecord {
            id: new_media_id(),
            data_uri: data_uri::encode(bytes, mime_type),
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            byte_size: bytes.len(),
            created_at: Utc::now(),
        };

        self.insert_record(&record)?;

        tracing::debug!(id = %record.id, size = record.byte_size, mime = mime_type, "stored media");
        Ok(record)
    }

    /// Insert a fully-formed record. Split out so tests can control timestamps.
    pub(crate) fn insert_record(&self, record: &MediaRecord) -> Result<()> {
        let json = serde_json::to_string(record)
            .map_err(|e| StoreError::Corrupt(format!("serialize failed: {e}")))?;

        self.conn()
            .execute(
                "INSERT INTO media_records (id, json, byte_size, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id.as_str(),
                    json,
                    record.byte_size as i64,
                    record.created_at.to_rfc3339(),
                ],
            )
            .map_err(map_quota)?;
        Ok(())
    }

    /// Fetch a record by identifier.
    ///
    /// Placeholder sentinels (the default avatar, `placeholder_*`) return
    /// [`StoreError::NotFound`] without a lookup, even if a colliding row
    /// happens to exist.
    pub fn get_media(&self, id: &MediaId) -> Result<MediaRecord> {
        if id.is_placeholder() {
            return Err(StoreError::NotFound);
        }

        let json: String = self
            .conn()
            .query_row(
                "SELECT json FROM media_records WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;

        serde_json::from_str(&json).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    /// Decode a record's payload back into raw bytes.
    pub fn decode_payload(&self, record: &MediaRecord) -> Result<Vec<u8>> {
        let (_, bytes) = data_uri::decode(&record.data_uri)?;
        Ok(bytes)
    }

    /// Delete a record. Returns whether a row was removed.
    pub fn remove_media(&self, id: &MediaId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM media_records WHERE id = ?1",
            params![id.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// All stored identifiers, unordered over insertion.
    pub fn list_media_ids(&self) -> Result<Vec<MediaId>> {
        let mut stmt = self.conn().prepare("SELECT id FROM media_records")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(MediaId::new(row?));
        }
        Ok(ids)
    }

    /// Evict the oldest `max(1, ceil(0.3 * n))` records by creation timestamp.
    ///
    /// A capacity-management heuristic, not LRU: unconditional, triggered
    /// manually. Returns the number of records removed (0 when empty).
    pub fn cleanup_media(&self) -> Result<usize> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id FROM media_records ORDER BY created_at ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }

        if ids.is_empty() {
            return Ok(0);
        }

        let evict = ((ids.len() as f64 * CLEANUP_FRACTION).ceil() as usize).max(1);
        for id in &ids[..evict] {
            self.conn()
                .execute("DELETE FROM media_records WHERE id = ?1", params![id])?;
        }

        tracing::info!(removed = evict, remaining = ids.len() - evict, "media cleanup");
        Ok(evict)
    }

    /// Aggregate record count and payload bytes.
    pub fn media_stats(&self) -> Result<StoreStats> {
        self.conn()
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(byte_size), 0) FROM media_records",
                [],
                |row| {
                    Ok(StoreStats {
                        records: row.get::<_, i64>(0)? as u64,
                        total_bytes: row.get::<_, i64>(1)? as u64,
                    })
                },
            )
            .map_err(StoreError::Sqlite)
    }
}

/// Map SQLite's out-of-space failure to the distinct quota error.
fn map_quota(e: rusqlite::Error) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::DiskFull =>
        {
            StoreError::QuotaExceeded("database is full".to_string())
        }
        _ => StoreError::Sqlite(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("media.db")).unwrap();
        (db, dir)
    }

    fn record_at(id: &str, offset_secs: i64) -> MediaRecord {
        MediaRecord {
            id: MediaId::new(id),
            data_uri: data_uri::encode(b"payload", "image/png"),
            file_name: "p.png".to_string(),
            mime_type: "image/png".to_string(),
            byte_size: 7,
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn put_get_round_trip() {
        let (db, _dir) = test_db();
        let bytes = vec![7u8; 4096];

        let record = db.put_media(&bytes, "image/png", "pic.png").unwrap();
        let fetched = db.get_media(&record.id).unwrap();

        assert_eq!(fetched, record);
        assert_eq!(db.decode_payload(&fetched).unwrap(), bytes);
    }

    #[test]
    fn put_rejects_unsupported_mime() {
        let (db, _dir) = test_db();
        let err = db.put_media(b"%PDF-1.4", "application/pdf", "doc.pdf");
        assert!(matches!(err, Err(StoreError::InvalidMediaType(_))));
        assert_eq!(db.media_stats().unwrap().records, 0);
    }

    #[test]
    fn put_rejects_oversized_payload() {
        let (db, _dir) = test_db();
        let bytes = vec![0u8; MAX_MEDIA_BYTES + 1];
        let err = db.put_media(&bytes, "video/mp4", "big.mp4");
        assert!(matches!(err, Err(StoreError::TooLarge { .. })));
        assert_eq!(db.media_stats().unwrap().records, 0);
    }

    #[test]
    fn put_respects_capacity() {
        let (mut db, _dir) = test_db();
        db.set_media_capacity(Some(1000));

        db.put_media(&[0u8; 600], "image/png", "a.png").unwrap();
        let err = db.put_media(&[0u8; 600], "image/png", "b.png");
        assert!(matches!(err, Err(StoreError::QuotaExceeded(_))));
    }

    #[test]
    fn get_missing_is_not_found() {
        let (db, _dir) = test_db();
        assert!(matches!(
            db.get_media(&MediaId::new("media_1_nosuch")),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn placeholders_never_resolve() {
        let (db, _dir) = test_db();

        // Even a colliding row must not be returned.
        db.insert_record(&record_at("default_avatar", 0)).unwrap();

        assert!(matches!(
            db.get_media(&MediaId::default_avatar()),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            db.get_media(&MediaId::new("placeholder_banner")),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn corrupt_json_is_distinct() {
        let (db, _dir) = test_db();
        db.conn()
            .execute(
                "INSERT INTO media_records (id, json, byte_size, created_at)
                 VALUES ('media_1_bad', '{not json', 0, '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();

        assert!(matches!(
            db.get_media(&MediaId::new("media_1_bad")),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn cleanup_removes_oldest_third() {
        let (db, _dir) = test_db();
        for i in 0..10 {
            db.insert_record(&record_at(&format!("media_{i}_x"), i)).unwrap();
        }

        // ceil(0.3 * 10) = 3
        assert_eq!(db.cleanup_media().unwrap(), 3);

        let remaining = db.list_media_ids().unwrap();
        assert_eq!(remaining.len(), 7);
        for i in 0..3 {
            assert!(!remaining.contains(&MediaId::new(format!("media_{i}_x"))));
        }
    }

    #[test]
    fn cleanup_removes_at_least_one() {
        let (db, _dir) = test_db();
        db.insert_record(&record_at("media_0_only", 0)).unwrap();

        assert_eq!(db.cleanup_media().unwrap(), 1);
        assert!(db.list_media_ids().unwrap().is_empty());
    }

    #[test]
    fn cleanup_on_empty_store_is_noop() {
        let (db, _dir) = test_db();
        assert_eq!(db.cleanup_media().unwrap(), 0);
    }

    #[test]
    fn remove_reports_whether_deleted() {
        let (db, _dir) = test_db();
        let record = db.put_media(b"x", "image/gif", "x.gif").unwrap();

        assert!(db.remove_media(&record.id).unwrap());
        assert!(!db.remove_media(&record.id).unwrap());
    }
}
