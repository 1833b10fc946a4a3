//! Local fallback store: durable key-value persistence for the article
//! partitions, pages and the ancillary admin records.
//!
//! Every key holds one JSON document. Reads of a missing key yield the empty
//! value for that key; writes replace the whole document.

use std::{collections::BTreeMap, path::Path};

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Article, ArticleStatus, ContentError, ContentResult, Page};

/// Draft partition key.
pub const DRAFTS_KEY: &str = "hlc.articles.drafts";
/// Scheduled partition key.
pub const SCHEDULED_KEY: &str = "hlc.articles.scheduled";
/// Published partition key.
pub const PUBLISHED_KEY: &str = "hlc.articles.published";
/// Static pages key.
pub const PAGES_KEY: &str = "hlc.pages";
/// Media library index key.
pub const MEDIA_LIBRARY_KEY: &str = "hlc.media.library";
/// Backup schedule key.
pub const BACKUP_SCHEDULE_KEY: &str = "hlc.backup.schedule";

/// Keys owned by the store, in snapshot order.
pub const MANAGED_KEYS: &[&str] = &[
    DRAFTS_KEY,
    SCHEDULED_KEY,
    PUBLISHED_KEY,
    PAGES_KEY,
    MEDIA_LIBRARY_KEY,
    BACKUP_SCHEDULE_KEY,
];

const DEFAULT_BACKUP_INTERVAL_HOURS: u32 = 24;

/// Storage key of a partition.
pub fn partition_key(status: ArticleStatus) -> &'static str {
    match status {
        ArticleStatus::Draft => DRAFTS_KEY,
        ArticleStatus::Scheduled => SCHEDULED_KEY,
        ArticleStatus::Published => PUBLISHED_KEY,
    }
}

/// Raw string persistence underneath [`LocalStore`].
pub trait KeyValueBackend: Send + Sync {
    /// Stored value for `key`, if any.
    fn get(&self, key: &str) -> ContentResult<Option<String>>;

    /// Writes every entry or none of them.
    fn put_many(&self, entries: &[(&str, String)]) -> ContentResult<()>;

    /// Deletes `key`; missing keys are not an error.
    fn remove(&self, key: &str) -> ContentResult<()>;

    /// Writes a single entry.
    fn put(&self, key: &str, value: String) -> ContentResult<()> {
        self.put_many(&[(key, value)])
    }
}

/// SQLite-backed store, one row per key.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: &Path) -> ContentResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::init(conn)
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> ContentResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> ContentResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_entries (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl KeyValueBackend for SqliteBackend {
    fn get(&self, key: &str) -> ContentResult<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row("SELECT value FROM kv_entries WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put_many(&self, entries: &[(&str, String)]) -> ContentResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for (key, value) in entries {
            tx.execute(
                r#"
                INSERT INTO kv_entries (key, value, updated_at)
                VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ','now'))
                ON CONFLICT(key) DO UPDATE SET
                  value=excluded.value,
                  updated_at=excluded.updated_at
                "#,
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> ContentResult<()> {
        self.conn
            .lock()
            .execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Process-local backend; contents vanish with the process.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, String>>,
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> ContentResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put_many(&self, entries: &[(&str, String)]) -> ContentResult<()> {
        let mut guard = self.entries.write();
        for (key, value) in entries {
            guard.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> ContentResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// One entry of the media library index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    /// Stable identity, derived from the URL.
    pub id: String,
    /// Public URL of the uploaded file.
    pub url: String,
    /// Display filename.
    pub filename: String,
    /// Alternative text.
    #[serde(default)]
    pub alt: String,
    /// Registration time.
    pub uploaded_at: DateTime<Utc>,
}

/// When the last backup ran and how often one is wanted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSchedule {
    /// Hours between backups.
    pub interval_hours: u32,
    /// Completion time of the last backup.
    #[serde(default)]
    pub last_backup_at: Option<DateTime<Utc>>,
}

impl Default for BackupSchedule {
    fn default() -> Self {
        Self {
            interval_hours: DEFAULT_BACKUP_INTERVAL_HOURS,
            last_backup_at: None,
        }
    }
}

impl BackupSchedule {
    /// True when no backup ever ran or the interval has elapsed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_backup_at {
            None => true,
            Some(last) => now - last >= Duration::hours(i64::from(self.interval_hours.max(1))),
        }
    }
}

/// Full copy of every managed key, with a checksum over the entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Export time.
    pub created_at: DateTime<Utc>,
    /// Every managed key with its decoded value.
    pub entries: BTreeMap<String, serde_json::Value>,
    /// Hex sha256 over the serialized entries.
    pub checksum: String,
}

impl StoreSnapshot {
    fn checksum_of(entries: &BTreeMap<String, serde_json::Value>) -> ContentResult<String> {
        let payload = serde_json::to_vec(entries)?;
        Ok(hash_bytes(&payload))
    }

    /// Recomputes the checksum and compares it with the recorded one.
    pub fn verify(&self) -> ContentResult<bool> {
        Ok(Self::checksum_of(&self.entries)? == self.checksum)
    }
}

/// Typed access to the persisted keys.
pub struct LocalStore {
    backend: Box<dyn KeyValueBackend>,
}

impl LocalStore {
    /// Store over an arbitrary backend.
    pub fn new(backend: impl KeyValueBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// SQLite store at `path`.
    pub fn open(path: &Path) -> ContentResult<Self> {
        Ok(Self::new(SqliteBackend::open(path)?))
    }

    /// Non-durable store.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::default())
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> ContentResult<Option<T>> {
        match self.backend.get(key)? {
            Some(raw) if !raw.trim().is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> ContentResult<()> {
        self.backend.put(key, serde_json::to_string(value)?)
    }

    /// Articles of one partition; a missing key reads as empty.
    pub fn read_partition(&self, status: ArticleStatus) -> ContentResult<Vec<Article>> {
        Ok(self.read_json(partition_key(status))?.unwrap_or_default())
    }

    /// Replaces one partition.
    pub fn write_partition(&self, status: ArticleStatus, articles: &[Article]) -> ContentResult<()> {
        self.write_partitions(&[(status, articles)])
    }

    /// Writes several partitions in one backend call.
    pub fn write_partitions(&self, partitions: &[(ArticleStatus, &[Article])]) -> ContentResult<()> {
        let mut entries = Vec::with_capacity(partitions.len());
        for (status, articles) in partitions {
            entries.push((partition_key(*status), serde_json::to_string(articles)?));
        }
        self.backend.put_many(&entries)
    }

    /// Static pages; empty when never written.
    pub fn read_pages(&self) -> ContentResult<Vec<Page>> {
        Ok(self.read_json(PAGES_KEY)?.unwrap_or_default())
    }

    /// Replaces the page list.
    pub fn write_pages(&self, pages: &[Page]) -> ContentResult<()> {
        self.write_json(PAGES_KEY, pages)
    }

    /// Whether the pages key was ever written.
    pub fn pages_initialized(&self) -> ContentResult<bool> {
        Ok(self.backend.get(PAGES_KEY)?.is_some())
    }

    /// Media library entries.
    pub fn read_media_index(&self) -> ContentResult<Vec<MediaAsset>> {
        Ok(self.read_json(MEDIA_LIBRARY_KEY)?.unwrap_or_default())
    }

    /// Replaces the media library index.
    pub fn write_media_index(&self, assets: &[MediaAsset]) -> ContentResult<()> {
        self.write_json(MEDIA_LIBRARY_KEY, assets)
    }

    /// Backup schedule, or the default when never written.
    pub fn read_backup_schedule(&self) -> ContentResult<BackupSchedule> {
        Ok(self.read_json(BACKUP_SCHEDULE_KEY)?.unwrap_or_default())
    }

    /// Persists the backup schedule.
    pub fn write_backup_schedule(&self, schedule: &BackupSchedule) -> ContentResult<()> {
        self.write_json(BACKUP_SCHEDULE_KEY, schedule)
    }

    /// Copies every managed key that currently holds a value.
    pub fn export_snapshot(&self) -> ContentResult<StoreSnapshot> {
        let mut entries = BTreeMap::new();
        for key in MANAGED_KEYS {
            if let Some(value) = self.read_json::<serde_json::Value>(key)? {
                entries.insert((*key).to_string(), value);
            }
        }
        let checksum = StoreSnapshot::checksum_of(&entries)?;
        Ok(StoreSnapshot {
            created_at: Utc::now(),
            entries,
            checksum,
        })
    }

    /// Replaces every managed key with the snapshot contents. Keys the
    /// snapshot lacks are cleared.
    pub fn import_snapshot(&self, snapshot: &StoreSnapshot) -> ContentResult<()> {
        if !snapshot.verify()? {
            return Err(ContentError::Validation("snapshot checksum mismatch".to_string()));
        }
        if let Some(unknown) = snapshot
            .entries
            .keys()
            .find(|key| !MANAGED_KEYS.contains(&key.as_str()))
        {
            return Err(ContentError::Validation(format!("snapshot holds unknown key `{unknown}`")));
        }

        // Decode before writing so a malformed snapshot leaves the store intact.
        for status in ArticleStatus::ALL {
            if let Some(value) = snapshot.entries.get(partition_key(status)) {
                serde_json::from_value::<Vec<Article>>(value.clone())?;
            }
        }
        if let Some(value) = snapshot.entries.get(PAGES_KEY) {
            serde_json::from_value::<Vec<Page>>(value.clone())?;
        }

        let mut entries = Vec::with_capacity(snapshot.entries.len());
        for (key, value) in &snapshot.entries {
            entries.push((key.as_str(), serde_json::to_string(value)?));
        }
        self.backend.put_many(&entries)?;

        for key in MANAGED_KEYS {
            if !snapshot.entries.contains_key(*key) {
                self.backend.remove(key)?;
            }
        }
        tracing::info!(keys = snapshot.entries.len(), "restored local store from snapshot");
        Ok(())
    }
}

/// Hex-encoded sha256 of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, title: &str) -> Article {
        let mut article = Article::new(title, "<p>body</p>");
        article.id = id.to_string();
        article
    }

    #[test]
    fn missing_keys_read_as_empty() {
        let store = LocalStore::in_memory();
        assert!(store
            .read_partition(ArticleStatus::Draft)
            .expect("read drafts")
            .is_empty());
        assert!(store.read_pages().expect("read pages").is_empty());
        assert!(store.read_media_index().expect("read media").is_empty());
        assert_eq!(store.read_backup_schedule().expect("read backup"), BackupSchedule::default());
        assert!(!store.pages_initialized().expect("pages flag"));
    }

    #[test]
    fn sqlite_partition_round_trip_keeps_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalStore::open(&dir.path().join("store.sqlite3")).expect("open store");
        let list = vec![sample("b", "Second"), sample("a", "First"), sample("c", "Third")];

        store
            .write_partition(ArticleStatus::Published, &list)
            .expect("write published");
        let read = store
            .read_partition(ArticleStatus::Published)
            .expect("read published");
        assert_eq!(read, list);
    }

    #[test]
    fn sqlite_write_replaces_previous_value() {
        let store = LocalStore::new(SqliteBackend::open_in_memory().expect("memory sqlite"));
        store
            .write_partition(ArticleStatus::Draft, &[sample("a", "A"), sample("b", "B")])
            .expect("first write");
        store
            .write_partition(ArticleStatus::Draft, &[sample("c", "C")])
            .expect("second write");
        let drafts = store.read_partition(ArticleStatus::Draft).expect("read");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].id, "c");
    }

    #[test]
    fn corrupt_value_is_a_serialization_error() {
        let backend = MemoryBackend::default();
        backend
            .put(DRAFTS_KEY, "{not json".to_string())
            .expect("seed corrupt value");
        let store = LocalStore::new(backend);
        let err = store
            .read_partition(ArticleStatus::Draft)
            .expect_err("corrupt json");
        assert!(matches!(err, ContentError::Serialization(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn backup_schedule_due_after_interval() {
        let now = Utc::now();
        let mut schedule = BackupSchedule::default();
        assert!(schedule.is_due(now));
        schedule.last_backup_at = Some(now - Duration::hours(2));
        assert!(!schedule.is_due(now));
        schedule.last_backup_at = Some(now - Duration::hours(25));
        assert!(schedule.is_due(now));
    }

    #[test]
    fn snapshot_round_trip_and_tamper_detection() {
        let source = LocalStore::in_memory();
        source
            .write_partition(ArticleStatus::Draft, &[sample("d1", "Draft one")])
            .expect("seed drafts");
        source
            .write_pages(&Page::system_defaults(Utc::now()))
            .expect("seed pages");
        let snapshot = source.export_snapshot().expect("export");
        assert!(snapshot.verify().expect("verify"));

        let target = LocalStore::in_memory();
        target
            .write_partition(ArticleStatus::Published, &[sample("p1", "Stale")])
            .expect("seed stale");
        target.import_snapshot(&snapshot).expect("import");
        assert_eq!(target.read_partition(ArticleStatus::Draft).expect("drafts").len(), 1);
        assert!(target
            .read_partition(ArticleStatus::Published)
            .expect("published")
            .is_empty());
        assert_eq!(target.read_pages().expect("pages").len(), 3);

        let mut tampered = snapshot.clone();
        tampered
            .entries
            .insert(PUBLISHED_KEY.to_string(), serde_json::json!([]));
        let err = target.import_snapshot(&tampered).expect_err("tampered");
        assert!(matches!(err, ContentError::Validation(_)));
    }
}
