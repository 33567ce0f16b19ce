use log::warn;
use rusqlite::Connection;
use std::error::Error as StdError;
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::db;
use crate::queries::seen_slots;
use crate::slot::{SeenSlot, SlotRecord};

/// The seen-set could not be read or written
#[derive(Debug)]
pub enum StoreUnavailableError {
    /// SQLite reported an error
    Sqlite(rusqlite::Error),
    /// Non-SQLite backend failure (used by alternative stores)
    Other(String),
}

impl fmt::Display for StoreUnavailableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreUnavailableError::Sqlite(err) => write!(f, "Slot store unavailable: {}", err),
            StoreUnavailableError::Other(msg) => write!(f, "Slot store unavailable: {}", msg),
        }
    }
}

impl StdError for StoreUnavailableError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StoreUnavailableError::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreUnavailableError {
    fn from(err: rusqlite::Error) -> Self {
        StoreUnavailableError::Sqlite(err)
    }
}

pub type Result<T> = std::result::Result<T, StoreUnavailableError>;

/// Durable set of slot identifiers that have already been seen
pub trait SlotStore {
    fn contains(&self, identifier: &str) -> Result<bool>;

    /// Insert the record unless its identifier is already present
    ///
    /// Returns true only when this call performed the insert.
    fn insert_if_absent(&self, record: &SlotRecord) -> Result<bool>;

    /// Flag rows as included in a delivered notification
    fn mark_notified(&self, identifiers: &[String]) -> Result<()>;

    /// Every seen slot, oldest first
    fn seen_slots(&self) -> Result<Vec<SeenSlot>>;
}

/// SQLite-backed seen-set
///
/// The connection sits behind a mutex so the store can be shared; each
/// `insert_if_absent` is a single `INSERT ... ON CONFLICT DO NOTHING`.
pub struct SqliteSlotStore {
    conn: Mutex<Connection>,
}

impl SqliteSlotStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = db::open_database(db_path)?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = db::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection; the schema must already exist
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Lock the connection, taking it back if a panicking holder poisoned it
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            warn!("Slot store connection lock was poisoned by a panic; recovering it");
            poisoned.into_inner()
        })
    }
}

impl SlotStore for SqliteSlotStore {
    fn contains(&self, identifier: &str) -> Result<bool> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&seen_slots::exists(identifier))?;
        Ok(stmt.exists([])?)
    }

    fn insert_if_absent(&self, record: &SlotRecord) -> Result<bool> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let conn = self.lock();
        let inserted = conn.execute(&seen_slots::insert_if_absent(record, now_ms), [])?;
        Ok(inserted == 1)
    }

    fn mark_notified(&self, identifiers: &[String]) -> Result<()> {
        if identifiers.is_empty() {
            return Ok(());
        }
        let conn = self.lock();
        conn.execute(&seen_slots::mark_notified(identifiers), [])?;
        Ok(())
    }

    fn seen_slots(&self) -> Result<Vec<SeenSlot>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&seen_slots::select_all())?;
        let rows = stmt.query_map([], |row| {
            Ok(SeenSlot {
                identifier: row.get(0)?,
                start_time: row.get(1)?,
                end_time: row.get(2)?,
                instructor: row.get(3)?,
                notified: row.get::<_, i64>(4)? != 0,
                first_seen_at_ms: row.get(5)?,
            })
        })?;
        let mut slots = Vec::new();
        for row in rows {
            slots.push(row?);
        }
        Ok(slots)
    }
}
