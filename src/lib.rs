//! spendlog keeps a single user's expenses in an encrypted local store and
//! serves them back one month or one week at a time.
//!
//! A presentation layer opens a [`Store`], builds a [`TxnCoordinator`] on it
//! and renders the coordinator's live [`Snapshot`]s, using [`form`] and
//! [`listing`] for input checks and list shaping.

pub mod coordinator;
pub mod db;
pub mod error;
pub mod fmt;
pub mod form;
pub mod listing;
pub mod models;
pub mod period;
pub mod secure;
pub mod settings;
pub mod store;
pub mod suggest;

use std::sync::Once;

pub use coordinator::{PendingWrite, Snapshot, TxnCoordinator};
pub use error::{Result, SpendError};
pub use models::{CategoryUsage, Transaction};
pub use period::{DateRange, PeriodState, ViewMode};
pub use store::Store;

static TRACING_INIT: Once = Once::new();

/// Installs a fmt subscriber filtered by `RUST_LOG`, defaulting this crate to
/// `info`. Later calls do nothing.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("spendlog=info"));
        let _ = fmt().with_env_filter(filter).try_init();
    });
}
