use rusqlite::Connection;
use std::path::Path;

use crate::queries::ddl;

/// Open the file-based seen-slot database
/// Enables WAL mode and creates the schema if missing
pub fn open_database(db_path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Create an in-memory database with the schema applied (for tests and dry runs)
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(&ddl::create_seen_slots_table(), [])?;
    conn.execute(&ddl::create_seen_slots_first_seen_index(), [])?;
    Ok(())
}
