//! Whole-store persistence backends.
//!
//! The agent store is always read in full and written in full; there is no
//! incremental persistence. Three backends implement [`StoreBackend`]:
//!
//! - [`JsonFileBackend`] — one JSON document, replaced atomically via a
//!   temp file + rename.
//! - [`SqliteBackend`] — the same JSON document as a single blob row, with
//!   an optional CRC-32 checksum:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS agent_store (
//!     id         INTEGER PRIMARY KEY CHECK (id = 1),
//!     data       BLOB NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```
//!
//! - [`InMemoryBackend`] — for tests and throwaway runs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info, warn};

use crate::config::{BackendKind, StoreConfig};
use crate::error::{RecallError, Result};
use crate::memory::AgentStore;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Load and save the entire agent store.
pub trait StoreBackend: Send + Sync {
    /// Read the whole store. A missing or empty resource is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource exists but cannot be read or decoded.
    fn load(&self) -> Result<AgentStore>;

    /// Replace the whole store. Readers never observe a partial write.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails; the previous contents
    /// are left in place.
    fn save(&self, store: &AgentStore) -> Result<()>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Open the backend described by `config`.
///
/// # Errors
///
/// Returns [`RecallError::Database`] if an SQLite database cannot be opened.
pub fn open_backend(config: &StoreConfig) -> Result<Box<dyn StoreBackend>> {
    Ok(match config.backend {
        BackendKind::Json => Box::new(JsonFileBackend::new(&config.path, config.pretty)),
        BackendKind::Sqlite => Box::new(SqliteBackend::open(&config.path, config)?),
        BackendKind::Memory => Box::new(InMemoryBackend::new()),
    })
}

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

/// CRC-32 of `data` as a lowercase hex string.
fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32_compute(data))
}

/// Basic CRC-32 (ISO 3309 / ITU-T V.42) computation.
fn crc32_compute(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// The whole store as one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
    pretty: bool,
}

impl JsonFileBackend {
    /// Backend for the file at `path` (created on first save).
    #[must_use]
    pub fn new(path: impl AsRef<Path>, pretty: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pretty,
        }
    }

    /// Path of the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StoreBackend for JsonFileBackend {
    fn load(&self) -> Result<AgentStore> {
        let start = Instant::now();
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Store file missing, starting empty");
                return Ok(AgentStore::new());
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(AgentStore::new());
        }

        let store: AgentStore = serde_json::from_slice(&bytes)?;
        debug!(
            path = %self.path.display(),
            agents = store.agent_count(),
            bytes = bytes.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded agent store"
        );
        Ok(store)
    }

    fn save(&self, store: &AgentStore) -> Result<()> {
        let start = Instant::now();
        let json = if self.pretty {
            serde_json::to_vec_pretty(store)?
        } else {
            serde_json::to_vec(store)?
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.temp_path();
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(
            path = %self.path.display(),
            agents = store.agent_count(),
            records = store.total_records(),
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved agent store"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS agent_store (
    id         INTEGER PRIMARY KEY CHECK (id = 1),
    data       BLOB NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT
);";

/// The whole store as a single row in an SQLite database.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    checksum_enabled: bool,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("db_path", &self.db_path)
            .field("checksum_enabled", &self.checksum_enabled)
            .finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Open (or create) an SQLite database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RecallError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &StoreConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %db_path.display(), wal = config.wal_mode, "SQLite agent store opened");

        Ok(Self {
            conn: Mutex::new(conn),
            checksum_enabled: config.checksum_enabled,
            db_path,
        })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`RecallError::Database`] on SQLite failures.
    pub fn open_in_memory(checksum_enabled: bool) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            checksum_enabled,
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl StoreBackend for SqliteBackend {
    fn load(&self) -> Result<AgentStore> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT data, checksum FROM agent_store WHERE id = 1")?;
        let row = stmt.query_row([], |row| {
            Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Option<String>>(1)?))
        });

        let (data, stored_checksum) = match row {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(AgentStore::new()),
            Err(e) => return Err(e.into()),
        };

        if self.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(&data);
                if expected != actual {
                    warn!(
                        expected = %expected,
                        actual = %actual,
                        "Checksum mismatch — possible store corruption"
                    );
                }
            }
        }

        if data.is_empty() {
            return Ok(AgentStore::new());
        }
        serde_json::from_slice(&data).map_err(|e| RecallError::Serialization(e.to_string()))
    }

    fn save(&self, store: &AgentStore) -> Result<()> {
        let json = serde_json::to_vec(store)?;
        let checksum = self.checksum_enabled.then(|| crc32_hex(&json));
        let now = Utc::now().to_rfc3339();

        self.conn.lock().execute(
            "INSERT INTO agent_store (id, data, updated_at, checksum)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![json, now, checksum],
        )?;

        debug!(
            agents = store.agent_count(),
            records = store.total_records(),
            bytes = json.len(),
            "Saved agent store to SQLite"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Keeps the store in process memory.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    store: Mutex<AgentStore>,
}

impl InMemoryBackend {
    /// Start with an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given contents.
    #[must_use]
    pub fn with_store(store: AgentStore) -> Self {
        Self { store: Mutex::new(store) }
    }
}

impl StoreBackend for InMemoryBackend {
    fn load(&self) -> Result<AgentStore> {
        Ok(self.store.lock().clone())
    }

    fn save(&self, store: &AgentStore) -> Result<()> {
        *self.store.lock() = store.clone();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
