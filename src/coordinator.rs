//! View-state coordinator for one transaction screen.
//!
//! Owns the period being shown and keeps a live snapshot of the transactions
//! inside it. Writes go through a queue drained by a single task, so they
//! reach the store in the order they were issued.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::{Local, NaiveDate, Weekday};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::{Result, SpendError};
use crate::models::{now_millis, CategoryUsage, Transaction};
use crate::period::{DateRange, PeriodState, ViewMode};
use crate::store::Store;
use crate::suggest::{rank_suggestions, MAX_SUGGESTIONS};

pub const RECENT_CATEGORIES: usize = 10;

/// Transactions inside `range`, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub range: DateRange,
    pub transactions: Vec<Transaction>,
}

enum WriteOp {
    Add(Transaction),
    Update { id: i64, txn: Transaction },
    Delete(i64),
}

impl WriteOp {
    fn name(&self) -> &'static str {
        match self {
            WriteOp::Add(_) => "add",
            WriteOp::Update { .. } => "update",
            WriteOp::Delete(_) => "delete",
        }
    }
}

struct WriteJob {
    op: WriteOp,
    done: oneshot::Sender<Result<()>>,
}

/// Completion of a queued write. Drop it to fire and forget, or await it to
/// learn whether the store accepted the write.
pub struct PendingWrite {
    rx: oneshot::Receiver<Result<()>>,
}

impl PendingWrite {
    fn failed(err: SpendError) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Err(err));
        Self { rx }
    }
}

impl Future for PendingWrite {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(Err(SpendError::WriterClosed)))
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct TxnCoordinator {
    store: Arc<Store>,
    period: watch::Sender<PeriodState>,
    snapshot: watch::Receiver<Snapshot>,
    writes: mpsc::UnboundedSender<WriteJob>,
    editing: Option<Transaction>,
    last_deleted: Option<Transaction>,
    recent: watch::Receiver<Vec<String>>,
    driver: JoinHandle<()>,
    recent_driver: JoinHandle<()>,
}

impl TxnCoordinator {
    /// Starts on the current month. Must be called inside a Tokio runtime.
    pub fn new(store: Arc<Store>, week_start: Weekday) -> Self {
        let initial = PeriodState::starting_at(today(), week_start);
        let (period, period_rx) = watch::channel(initial);
        let (snapshot_tx, snapshot) = watch::channel(Snapshot {
            range: initial.range(),
            transactions: Vec::new(),
        });
        let (writes, write_rx) = mpsc::unbounded_channel();

        let (recent_tx, recent) = watch::channel(Vec::new());

        let driver = tokio::spawn(drive_snapshots(store.clone(), period_rx, snapshot_tx));
        let recent_driver = tokio::spawn(drive_recent(store.clone(), RECENT_CATEGORIES, recent_tx));
        tokio::spawn(run_writer(store.clone(), write_rx));

        Self {
            store,
            period,
            snapshot,
            writes,
            editing: None,
            last_deleted: None,
            recent,
            driver,
            recent_driver,
        }
    }

    // ----- period -----

    pub fn period(&self) -> PeriodState {
        *self.period.borrow()
    }

    pub fn current_range(&self) -> DateRange {
        self.period.borrow().range()
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.period.send_if_modified(|p| {
            let changed = p.mode != mode;
            p.mode = mode;
            changed
        });
    }

    pub fn set_week_start(&self, day: Weekday) {
        self.period.send_if_modified(|p| {
            let changed = p.week_start != day;
            p.week_start = day;
            changed
        });
    }

    pub fn go_previous(&self) {
        self.period.send_modify(PeriodState::previous);
        tracing::debug!(period = %self.period.borrow().label(), "moved to previous period");
    }

    /// Returns false when already on the period containing today.
    pub fn go_next(&self) -> bool {
        let today = today();
        let moved = self.period.send_if_modified(|p| p.next_at(today));
        if moved {
            tracing::debug!(period = %self.period.borrow().label(), "moved to next period");
        }
        moved
    }

    /// Evaluated against the wall clock on every call.
    pub fn can_go_next(&self) -> bool {
        self.period.borrow().can_go_next_at(today())
    }

    // ----- live list -----

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.clone()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.snapshot.borrow().transactions.clone()
    }

    // ----- writes -----

    fn enqueue(&self, op: WriteOp) -> PendingWrite {
        let (done, rx) = oneshot::channel();
        match self.writes.send(WriteJob { op, done }) {
            Ok(()) => PendingWrite { rx },
            Err(_) => PendingWrite::failed(SpendError::WriterClosed),
        }
    }

    /// Stores `txn` under a new id and records a use of its category.
    pub fn add(&self, txn: Transaction) -> PendingWrite {
        self.enqueue(WriteOp::Add(txn))
    }

    pub fn delete(&self, id: i64) -> PendingWrite {
        self.enqueue(WriteOp::Delete(id))
    }

    /// Replaces any edit in progress.
    pub fn begin_edit(&mut self, txn: Transaction) {
        self.editing = Some(txn);
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn editing(&self) -> Option<&Transaction> {
        self.editing.as_ref()
    }

    /// Writes `updated` under the id captured by `begin_edit`, whatever id
    /// `updated` carries. Returns `None` when no edit is active.
    pub fn save_edit(&mut self, updated: Transaction) -> Option<PendingWrite> {
        let current = self.editing.take()?;
        let Some(id) = current.id else {
            tracing::warn!("edited transaction was never stored, dropping edit");
            return None;
        };
        let txn = Transaction {
            id: Some(id),
            ..updated
        };
        Some(self.enqueue(WriteOp::Update { id, txn }))
    }

    /// Keeps `txn` for a later undo, replacing anything kept before.
    pub fn remember_deleted(&mut self, txn: Transaction) {
        self.last_deleted = Some(txn);
    }

    pub fn last_deleted(&self) -> Option<&Transaction> {
        self.last_deleted.as_ref()
    }

    /// Re-adds the remembered transaction as a new record. `None` when
    /// nothing was remembered.
    pub fn restore_last_deleted(&mut self) -> Option<PendingWrite> {
        let txn = self.last_deleted.take()?;
        Some(self.add(Transaction { id: None, ..txn }))
    }

    // ----- categories -----

    async fn category_history(&self) -> Result<Vec<CategoryUsage>> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.categories_by_recency()).await?
    }

    /// Live list of the most recently used category names, refreshed after
    /// every store change.
    pub fn subscribe_recent(&self) -> watch::Receiver<Vec<String>> {
        self.recent.clone()
    }

    pub async fn recent_categories(&self, limit: usize) -> Result<Vec<String>> {
        let history = self.category_history().await?;
        Ok(history.into_iter().take(limit).map(|c| c.name).collect())
    }

    pub async fn suggestions(&self, input: &str) -> Result<Vec<String>> {
        let history = self.category_history().await?;
        Ok(rank_suggestions(&history, input, MAX_SUGGESTIONS))
    }
}

impl Drop for TxnCoordinator {
    fn drop(&mut self) {
        // The writer stops by itself once the queue sender is gone, after
        // finishing the writes already queued.
        self.driver.abort();
        self.recent_driver.abort();
    }
}

fn apply(store: &Store, op: WriteOp) -> Result<()> {
    match op {
        WriteOp::Add(txn) => {
            let id = store.insert_transaction(&txn)?;
            tracing::debug!(id, category = %txn.category, "transaction added");
            // The row is already committed; usage failures do not fail the add.
            if let Err(e) = store.upsert_category(&txn.category, now_millis()) {
                tracing::warn!(id, category = %txn.category, error = %e, "category usage not recorded");
            }
        }
        WriteOp::Update { id, txn } => {
            if !store.update_transaction(id, &txn)? {
                tracing::debug!(id, "update matched no transaction");
            }
        }
        WriteOp::Delete(id) => {
            if !store.delete_transaction(id)? {
                tracing::debug!(id, "delete matched no transaction");
            }
        }
    }
    Ok(())
}

async fn run_writer(store: Arc<Store>, mut rx: mpsc::UnboundedReceiver<WriteJob>) {
    while let Some(WriteJob { op, done }) = rx.recv().await {
        let name = op.name();
        let store = store.clone();
        let result = match tokio::task::spawn_blocking(move || apply(&store, op)).await {
            Ok(res) => res,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = &result {
            tracing::error!(op = name, error = %e, "write failed");
        }
        let _ = done.send(result);
    }
}

async fn drive_recent(store: Arc<Store>, limit: usize, out: watch::Sender<Vec<String>>) {
    let mut changes = store.subscribe();
    loop {
        changes.borrow_and_update();
        let s = store.clone();
        match tokio::task::spawn_blocking(move || s.categories_by_recency()).await {
            Ok(Ok(history)) => {
                let names: Vec<String> = history.into_iter().take(limit).map(|c| c.name).collect();
                out.send_if_modified(|current| {
                    if *current == names {
                        return false;
                    }
                    *current = names;
                    true
                });
            }
            Ok(Err(e)) => tracing::error!(error = %e, "recent categories query failed"),
            Err(e) => tracing::error!(error = %e, "recent categories task failed"),
        }

        if changes.changed().await.is_err() {
            break;
        }
    }
}

/// Follows the period and re-issues the range query whenever it changes.
/// A period change drops the query future for the old period, in-flight
/// read included.
async fn drive_snapshots(
    store: Arc<Store>,
    mut period_rx: watch::Receiver<PeriodState>,
    out: watch::Sender<Snapshot>,
) {
    let changes = store.subscribe();

    loop {
        let range = period_rx.borrow_and_update().range();
        tracing::debug!(start = %range.start, end = %range.end, "querying period");
        let query = watch_range(
            store.clone(),
            range,
            changes.clone(),
            period_rx.clone(),
            out.clone(),
        );

        tokio::select! {
            _ = query => break,
            res = period_rx.changed() => {
                if res.is_err() {
                    break;
                }
            }
        }
    }
}

/// Publishes `range` now and again after every store change, for as long as
/// `range` is still the selected period.
async fn watch_range(
    store: Arc<Store>,
    range: DateRange,
    mut changes: watch::Receiver<u64>,
    period: watch::Receiver<PeriodState>,
    out: watch::Sender<Snapshot>,
) {
    loop {
        changes.borrow_and_update();
        let s = store.clone();
        let (start, end) = (range.start_millis(), range.end_millis());
        match tokio::task::spawn_blocking(move || s.transactions_between(start, end)).await {
            Ok(Ok(transactions)) => {
                out.send_if_modified(|snap| {
                    if period.borrow().range() != range {
                        return false;
                    }
                    *snap = Snapshot { range, transactions };
                    true
                });
            }
            Ok(Err(e)) => tracing::error!(error = %e, "period query failed"),
            Err(e) => tracing::error!(error = %e, "period query task failed"),
        }

        if changes.changed().await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::Datelike;

    use crate::secure::Passphrase;

    fn test_store() -> (tempfile::TempDir, Arc<Store>) {
        let dir = tempfile::tempdir().unwrap();
        let key = Passphrase::from_bytes(vec![5; 32]);
        let store = Store::open_at(&dir.path().join("test.db"), &key).unwrap();
        (dir, Arc::new(store))
    }

    async fn wait_for<F>(rx: &mut watch::Receiver<Snapshot>, mut pred: F) -> Snapshot
    where
        F: FnMut(&Snapshot) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                {
                    let snap = rx.borrow_and_update();
                    if pred(&snap) {
                        return snap.clone();
                    }
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("snapshot condition not reached")
    }

    fn now_txn(category: &str, amount: f64) -> Transaction {
        let now = Local::now().naive_local();
        Transaction::new(now, category, amount)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_add_shows_up_in_current_period() {
        let (_dir, store) = test_store();
        let coord = TxnCoordinator::new(store, Weekday::Mon);
        let mut rx = coord.subscribe();
        coord.add(now_txn("Food", 10.0).with_note("lunch")).await.unwrap();
        let snap = wait_for(&mut rx, |s| s.transactions.len() == 1).await;
        let t = &snap.transactions[0];
        assert!(t.id.is_some());
        assert_eq!(t.category, "Food");
        assert_eq!(t.amount, 10.0);
        assert_eq!(t.note.as_deref(), Some("lunch"));
        assert_eq!(snap.range, coord.current_range());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_add_records_category_use() {
        let (_dir, store) = test_store();
        let coord = TxnCoordinator::new(store.clone(), Weekday::Mon);
        // Seeded categories carry the open time; step past it.
        tokio::time::sleep(Duration::from_millis(5)).await;
        coord.add(now_txn("Food", 1.0)).await.unwrap();
        coord.add(now_txn("Food", 2.0)).await.unwrap();
        let cats = store.categories_by_recency().unwrap();
        let food = cats.iter().find(|c| c.name == "Food").unwrap();
        assert_eq!(food.usage_count, 2);
        assert_eq!(coord.recent_categories(1).await.unwrap(), vec!["Food"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_other_periods_are_excluded() {
        let (_dir, store) = test_store();
        let coord = TxnCoordinator::new(store, Weekday::Mon);
        let mut rx = coord.subscribe();
        let month_start = Local::now().date_naive().with_day(1).unwrap();
        let two_back = month_start.checked_sub_months(chrono::Months::new(2)).unwrap();
        let old = Transaction::new(two_back.and_hms_opt(12, 0, 0).unwrap(), "Rent", 500.0);
        coord.add(old).await.unwrap();
        coord.add(now_txn("Food", 3.0)).await.unwrap();
        let snap = wait_for(&mut rx, |s| !s.transactions.is_empty()).await;
        assert!(snap.transactions.iter().all(|t| t.category == "Food"));

        coord.go_previous();
        coord.go_previous();
        let snap = wait_for(&mut rx, |s| s.transactions.iter().any(|t| t.category == "Rent")).await;
        assert!(snap.transactions.iter().all(|t| t.category == "Rent"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_navigation_is_clamped_at_today() {
        let (_dir, store) = test_store();
        let coord = TxnCoordinator::new(store, Weekday::Mon);
        assert!(!coord.can_go_next());
        assert!(!coord.go_next());
        coord.go_previous();
        assert!(coord.can_go_next());
        assert!(coord.go_next());
        assert!(!coord.go_next());
        assert_eq!(coord.period().start(), Local::now().date_naive().with_day(1).unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_week_mode_range_follows_week_start() {
        let (_dir, store) = test_store();
        let coord = TxnCoordinator::new(store, Weekday::Mon);
        coord.set_view_mode(ViewMode::Week);
        assert_eq!(coord.current_range().start.weekday(), Weekday::Mon);
        coord.set_week_start(Weekday::Sun);
        assert_eq!(coord.current_range().start.weekday(), Weekday::Sun);
        let mut rx = coord.subscribe();
        let range = coord.current_range();
        wait_for(&mut rx, |s| s.range == range).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_save_edit_pins_original_id() {
        let (_dir, store) = test_store();
        let mut coord = TxnCoordinator::new(store.clone(), Weekday::Mon);
        let mut rx = coord.subscribe();
        coord.add(now_txn("Food", 10.0)).await.unwrap();
        coord.add(now_txn("Bills", 20.0)).await.unwrap();
        let snap = wait_for(&mut rx, |s| s.transactions.len() == 2).await;
        let food = snap.transactions.iter().find(|t| t.category == "Food").unwrap().clone();
        let bills = snap.transactions.iter().find(|t| t.category == "Bills").unwrap().clone();

        coord.begin_edit(food.clone());
        let updated = Transaction {
            id: bills.id,
            amount: 11.0,
            ..food.clone()
        };
        coord.save_edit(updated).unwrap().await.unwrap();
        assert!(coord.editing().is_none());

        assert_eq!(store.get_transaction(food.id.unwrap()).unwrap().unwrap().amount, 11.0);
        assert_eq!(store.get_transaction(bills.id.unwrap()).unwrap().unwrap().amount, 20.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_save_without_edit_is_noop() {
        let (_dir, store) = test_store();
        let mut coord = TxnCoordinator::new(store, Weekday::Mon);
        assert!(coord.save_edit(now_txn("Food", 1.0)).is_none());
        coord.begin_edit(now_txn("Food", 1.0));
        coord.cancel_edit();
        assert!(coord.save_edit(now_txn("Food", 1.0)).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_begin_edit_replaces_previous() {
        let (_dir, store) = test_store();
        let mut coord = TxnCoordinator::new(store, Weekday::Mon);
        let mut a = now_txn("Food", 1.0);
        a.id = Some(1);
        let mut b = now_txn("Bills", 2.0);
        b.id = Some(2);
        coord.begin_edit(a);
        coord.begin_edit(b);
        assert_eq!(coord.editing().unwrap().id, Some(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_undo_reinserts_with_new_identity() {
        let (_dir, store) = test_store();
        let mut coord = TxnCoordinator::new(store, Weekday::Mon);
        let mut rx = coord.subscribe();
        coord.add(now_txn("Food", 10.0)).await.unwrap();
        let snap = wait_for(&mut rx, |s| s.transactions.len() == 1).await;
        let original = snap.transactions[0].clone();

        coord.remember_deleted(original.clone());
        coord.delete(original.id.unwrap()).await.unwrap();
        wait_for(&mut rx, |s| s.transactions.is_empty()).await;

        coord.restore_last_deleted().unwrap().await.unwrap();
        assert!(coord.last_deleted().is_none());
        let snap = wait_for(&mut rx, |s| s.transactions.len() == 1).await;
        let restored = &snap.transactions[0];
        assert_eq!(restored.category, "Food");
        assert_eq!(restored.amount, 10.0);
        assert_ne!(restored.id, original.id);
        assert!(coord.restore_last_deleted().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_delete_does_not_remember() {
        let (_dir, store) = test_store();
        let mut coord = TxnCoordinator::new(store, Weekday::Mon);
        coord.add(now_txn("Food", 10.0)).await.unwrap();
        coord.delete(1).await.unwrap();
        assert!(coord.last_deleted().is_none());
        assert!(coord.restore_last_deleted().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_remember_overwrites_previous() {
        let (_dir, store) = test_store();
        let mut coord = TxnCoordinator::new(store, Weekday::Mon);
        coord.remember_deleted(now_txn("Food", 1.0));
        coord.remember_deleted(now_txn("Bills", 2.0));
        assert_eq!(coord.last_deleted().unwrap().category, "Bills");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_writes_apply_in_issue_order() {
        let (_dir, store) = test_store();
        let coord = TxnCoordinator::new(store.clone(), Weekday::Mon);
        let mut rx = coord.subscribe();
        // Fire-and-forget: only the last one is awaited.
        let _ = coord.add(now_txn("Food", 1.0));
        let _ = coord.delete(1);
        coord.add(now_txn("Bills", 2.0)).await.unwrap();
        let snap = wait_for(&mut rx, |s| s.transactions.iter().any(|t| t.category == "Bills")).await;
        assert_eq!(snap.transactions.len(), 1);
        assert_eq!(snap.transactions[0].id, Some(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_suggestions_rank_recent_and_prefix() {
        let (_dir, store) = test_store();
        let coord = TxnCoordinator::new(store, Weekday::Mon);
        tokio::time::sleep(Duration::from_millis(5)).await;
        coord.add(now_txn("Transport", 1.0)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        coord.add(now_txn("Food", 1.0)).await.unwrap();

        let by_prefix = coord.suggestions("fo").await.unwrap();
        assert_eq!(by_prefix[0], "Food");

        let recent = coord.suggestions("").await.unwrap();
        assert_eq!(recent.len(), MAX_SUGGESTIONS);
        assert_eq!(recent[0], "Food");
        assert_eq!(recent[1], "Transport");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rapid_period_changes_settle_on_current_range() {
        let (_dir, store) = test_store();
        let coord = TxnCoordinator::new(store, Weekday::Mon);
        let mut rx = coord.subscribe();
        let month_start = Local::now().date_naive().with_day(1).unwrap();
        for back in 0..4 {
            let day = month_start.checked_sub_months(chrono::Months::new(back)).unwrap();
            let _ = coord.add(Transaction::new(day.and_hms_opt(12, 0, 0).unwrap(), "Rent", 100.0));
        }
        coord.add(now_txn("Food", 3.0)).await.unwrap();
        wait_for(&mut rx, |s| s.transactions.len() == 2).await;

        for _ in 0..50 {
            coord.go_previous();
        }
        coord.set_view_mode(ViewMode::Week);
        coord.set_view_mode(ViewMode::Month);
        for _ in 0..48 {
            coord.go_next();
        }
        let current = coord.current_range();
        let snap = wait_for(&mut rx, |s| s.range == current).await;
        assert_eq!(snap.transactions.len(), 1);
        assert!(snap.transactions.iter().all(|t| current.contains(t.occurred_at)));

        // Nothing from a superseded period arrives later, even after a write.
        coord.add(now_txn("Food", 4.0)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        let latest = rx.borrow_and_update().clone();
        assert_eq!(latest.range, current);
        assert_eq!(latest.transactions.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rejected_write_reaches_caller_and_queue_keeps_going() {
        let (_dir, store) = test_store();
        let coord = TxnCoordinator::new(store.clone(), Weekday::Mon);
        let rejected = coord.add(now_txn("Food", f64::NAN)).await;
        assert!(matches!(rejected, Err(SpendError::Db(_))));
        let blank = coord.add(now_txn("  ", 5.0)).await;
        assert!(matches!(blank, Err(SpendError::Db(_))));

        coord.add(now_txn("Food", 5.0)).await.unwrap();
        let stored = store.transactions_between(0, i64::MAX).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].amount, 5.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_add_succeeds_when_usage_cannot_be_recorded() {
        let (_dir, store) = test_store();
        let coord = TxnCoordinator::new(store.clone(), Weekday::Mon);
        store.execute_raw("DROP TABLE categories;").unwrap();
        coord.add(now_txn("Food", 5.0)).await.unwrap();
        assert_eq!(store.transactions_between(0, i64::MAX).unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_recent_categories_are_live() {
        let (_dir, store) = test_store();
        let coord = TxnCoordinator::new(store, Weekday::Mon);
        let mut recent = coord.subscribe_recent();
        tokio::time::timeout(Duration::from_secs(5), async {
            while recent.borrow_and_update().len() != 6 {
                recent.changed().await.unwrap();
            }
        })
        .await
        .expect("seeded categories not published");

        tokio::time::sleep(Duration::from_millis(5)).await;
        coord.add(now_txn("Food", 1.0)).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while recent.borrow_and_update().first().map(String::as_str) != Some("Food") {
                recent.changed().await.unwrap();
            }
        })
        .await
        .expect("new category not published");
        assert_eq!(recent.borrow().len(), 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_queued_writes_finish_after_drop() {
        let (_dir, store) = test_store();
        let coord = TxnCoordinator::new(store.clone(), Weekday::Mon);
        let _ = coord.add(now_txn("Food", 1.0));
        let _ = coord.add(now_txn("Bills", 2.0));
        drop(coord);
        tokio::time::timeout(Duration::from_secs(5), async {
            while store.transactions_between(0, i64::MAX).unwrap().len() < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("queued writes were not applied");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pending_write_reports_closed_writer() {
        let pending = PendingWrite::failed(SpendError::WriterClosed);
        assert!(matches!(pending.await, Err(SpendError::WriterClosed)));
    }
}
