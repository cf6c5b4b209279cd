//! Connection tuning shared by every SQLite connection the job opens

use rusqlite::Connection;

/// WAL journal, NORMAL sync, in-memory temp store, 256MB mmap, 64MB page
/// cache, checkpoint every 1000 pages
pub fn apply_optimized_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "mmap_size", 268_435_456i64)?;
    conn.pragma_update(None, "cache_size", -64_000i64)?;
    conn.pragma_update(None, "wal_autocheckpoint", 1000i64)?;
    Ok(())
}

/// Pragmas for the connection that replaces the published snapshot
pub fn apply_publish_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "FULL")?;
    Ok(())
}
