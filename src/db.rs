use std::path::Path;

use rusqlite::{Connection, ErrorCode};

use crate::error::{Result, SpendError};
use crate::secure::Passphrase;

pub const SCHEMA_VERSION: i64 = 2;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    occurred_at_ms INTEGER NOT NULL,
    category TEXT NOT NULL CHECK (trim(category) <> ''),
    amount REAL NOT NULL CHECK (amount > 0),
    note TEXT,
    manual_time INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_transactions_occurred_at ON transactions(occurred_at_ms);

CREATE TABLE IF NOT EXISTS categories (
    name TEXT PRIMARY KEY,
    last_used INTEGER NOT NULL,
    usage_count INTEGER NOT NULL DEFAULT 0
);
";

const DEFAULT_CATEGORIES: &[&str] = &["Supermarket", "Transport", "Rent", "Bills", "Shopping", "Pharmacy"];

/// Opens the encrypted store and checks the key before handing it out.
pub fn get_connection(db_path: &Path, key: &Passphrase) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    apply_key(&conn, key)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

/// Keys a freshly opened connection. SQLCipher only reports a wrong key on
/// the first read, so this reads the schema table right away.
pub(crate) fn apply_key(conn: &Connection, key: &Passphrase) -> Result<()> {
    let literal = key.sql_literal();
    conn.execute_batch(&format!("PRAGMA key = {};", literal.as_str()))?;
    match conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0)) {
        Ok(_) => Ok(()),
        Err(e) if e.sqlite_error_code() == Some(ErrorCode::NotADatabase) => Err(SpendError::WrongKey),
        Err(e) => Err(e.into()),
    }
}

pub fn init_db(conn: &Connection, now_ms: i64) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

    // Seeds never overwrite real usage history on later starts.
    for name in DEFAULT_CATEGORIES {
        conn.execute(
            "INSERT OR IGNORE INTO categories (name, last_used, usage_count) VALUES (?1, ?2, 0)",
            rusqlite::params![name, now_ms],
        )?;
    }
    Ok(())
}
