use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, TimeZone, Utc};

/// One recorded expense. `id` is `None` until the store assigns one.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Option<i64>,
    pub occurred_at: NaiveDateTime,
    pub category: String,
    pub amount: f64,
    pub note: Option<String>,
    /// Whether the user explicitly picked `occurred_at` instead of taking "now".
    pub manual_time: bool,
}

impl Transaction {
    pub fn new(occurred_at: NaiveDateTime, category: impl Into<String>, amount: f64) -> Self {
        Self {
            id: None,
            occurred_at,
            category: category.into(),
            amount,
            note: None,
            manual_time: false,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_manual_time(mut self, manual: bool) -> Self {
        self.manual_time = manual;
        self
    }

    pub fn occurred_at_millis(&self) -> i64 {
        local_to_millis(self.occurred_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryUsage {
    pub name: String,
    pub last_used: i64,
    pub usage_count: i64,
}

/// Local wall-clock time to epoch milliseconds. Times skipped by a DST jump
/// are shifted forward by an hour; repeated times take the earlier instant.
pub fn local_to_millis(dt: NaiveDateTime) -> i64 {
    match Local.from_local_datetime(&dt) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t.timestamp_millis(),
        LocalResult::None => Local
            .from_local_datetime(&(dt + Duration::hours(1)))
            .earliest()
            .map(|t| t.timestamp_millis())
            .unwrap_or_else(|| dt.and_utc().timestamp_millis()),
    }
}

pub fn millis_to_local(ms: i64) -> NaiveDateTime {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|utc| utc.with_timezone(&Local).naive_local())
        .unwrap_or_default()
}

pub fn now_millis() -> i64 {
    Local::now().timestamp_millis()
}
