//! Encrypted transaction store shared by every coordinator.
//!
//! Each mutation bumps a version number published on a `watch` channel; live
//! queries subscribe to it and re-read when it moves.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::backup::Backup;
use rusqlite::{Connection, OptionalExtension, Row};
use tokio::sync::watch;

use crate::db::{apply_key, get_connection, init_db};
use crate::error::{Result, SpendError};
use crate::models::{local_to_millis, millis_to_local, now_millis, CategoryUsage, Transaction};
use crate::secure::{get_or_create_passphrase, KeyStore, Passphrase};
use crate::settings::Settings;

pub struct Store {
    conn: Mutex<Connection>,
    changes: watch::Sender<u64>,
}

const TXN_COLUMNS: &str = "id, occurred_at_ms, category, amount, note, manual_time";

fn txn_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: Some(row.get(0)?),
        occurred_at: millis_to_local(row.get(1)?),
        category: row.get(2)?,
        amount: row.get(3)?,
        note: row.get(4)?,
        manual_time: row.get(5)?,
    })
}

impl Store {
    /// Opens `spendlog.db` in the configured data directory, creating the
    /// directory, the key and the schema as needed.
    pub fn open(settings: &Settings, keys: &dyn KeyStore) -> Result<Self> {
        std::fs::create_dir_all(&settings.data_dir)?;
        let key = get_or_create_passphrase(keys)?;
        Self::open_at(&settings.db_path(), &key)
    }

    /// Opens the store named by the user's settings file, keyed from the OS
    /// credential store.
    #[cfg(feature = "os-keyring")]
    pub fn open_default() -> Result<Self> {
        let settings = crate::settings::load_settings();
        let keys = crate::secure::KeyringStore::new(settings.keyring_service.clone());
        Self::open(&settings, &keys)
    }

    pub fn open_at(path: &Path, key: &Passphrase) -> Result<Self> {
        let conn = get_connection(path, key)?;
        init_db(&conn, now_millis())?;
        tracing::debug!(path = %path.display(), "opened store");
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            conn: Mutex::new(conn),
            changes,
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| SpendError::LockPoisoned)
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    /// Receiver that fires after every committed mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn insert_transaction(&self, txn: &Transaction) -> Result<i64> {
        let id = {
            let conn = self.conn()?;
            conn.execute(
                "INSERT INTO transactions (occurred_at_ms, category, amount, note, manual_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    local_to_millis(txn.occurred_at),
                    txn.category,
                    txn.amount,
                    txn.note,
                    txn.manual_time
                ],
            )?;
            conn.last_insert_rowid()
        };
        self.notify();
        Ok(id)
    }

    /// Returns false when no row has the transaction's id.
    pub fn update_transaction(&self, id: i64, txn: &Transaction) -> Result<bool> {
        let changed = self.conn()?.execute(
            "UPDATE transactions SET occurred_at_ms = ?1, category = ?2, amount = ?3, note = ?4, \
             manual_time = ?5 WHERE id = ?6",
            rusqlite::params![
                local_to_millis(txn.occurred_at),
                txn.category,
                txn.amount,
                txn.note,
                txn.manual_time,
                id
            ],
        )?;
        if changed > 0 {
            self.notify();
        }
        Ok(changed > 0)
    }

    pub fn delete_transaction(&self, id: i64) -> Result<bool> {
        let changed = self.conn()?.execute("DELETE FROM transactions WHERE id = ?1", [id])?;
        if changed > 0 {
            self.notify();
        }
        Ok(changed > 0)
    }

    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let txn = conn
            .query_row(
                &format!("SELECT {TXN_COLUMNS} FROM transactions WHERE id = ?1"),
                [id],
                txn_from_row,
            )
            .optional()?;
        Ok(txn)
    }

    /// Transactions with `start_ms <= occurred_at <= end_ms`, newest first.
    pub fn transactions_between(&self, start_ms: i64, end_ms: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TXN_COLUMNS} FROM transactions \
             WHERE occurred_at_ms BETWEEN ?1 AND ?2 ORDER BY occurred_at_ms DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map([start_ms, end_ms], txn_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Records one use of `name`: inserts it with a count of 1, or bumps the
    /// count and moves `last_used` forward.
    pub fn upsert_category(&self, name: &str, used_at_ms: i64) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO categories (name, last_used, usage_count) VALUES (?1, ?2, 1) \
             ON CONFLICT(name) DO UPDATE SET \
                 last_used = MAX(last_used, excluded.last_used), \
                 usage_count = usage_count + 1",
            rusqlite::params![name, used_at_ms],
        )?;
        self.notify();
        Ok(())
    }

    pub fn categories_by_recency(&self) -> Result<Vec<CategoryUsage>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT name, last_used, usage_count FROM categories ORDER BY last_used DESC, name ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CategoryUsage {
                    name: row.get(0)?,
                    last_used: row.get(1)?,
                    usage_count: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        self.conn()?.execute_batch(sql)?;
        Ok(())
    }

    /// Copies the live database into `dest`, encrypted with `key`.
    pub fn backup_to(&self, dest: &Path, key: &Passphrase) -> Result<()> {
        let conn = self.conn()?;
        let mut dest_conn = Connection::open(dest)?;
        apply_key(&dest_conn, key)?;
        let backup = Backup::new(&conn, &mut dest_conn)?;
        backup.run_to_completion(100, std::time::Duration::from_millis(10), None)?;
        tracing::info!(dest = %dest.display(), "backup written");
        Ok(())
    }
}
