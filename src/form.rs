//! Entry-form rules: what a draft must look like before it becomes a
//! transaction.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{Result, SpendError};
use crate::models::Transaction;

/// Trims, lowercases, then capitalizes the first letter: "  fOOD " -> "Food".
pub fn normalize_category(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Keeps digits and a single decimal separator as the user types. Commas are
/// read as decimal points.
pub fn sanitize_amount_input(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut seen_dot = false;
    for c in input.chars() {
        match c {
            '0'..='9' => out.push(c),
            '.' | ',' if !seen_dot => {
                seen_dot = true;
                out.push('.');
            }
            _ => {}
        }
    }
    out
}

pub fn parse_amount(input: &str) -> Result<f64> {
    let normalized = input.trim().replace(',', ".");
    let amount: f64 = normalized
        .parse()
        .map_err(|_| SpendError::InvalidInput(format!("not a number: {input:?}")))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(SpendError::InvalidInput(format!("amount must be positive: {input:?}")));
    }
    Ok(amount)
}

/// Time-of-day as the pickers show it: seconds and below dropped.
pub fn picker_time(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

/// Raw form contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub category: String,
    pub amount: String,
    pub note: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub manual_time: bool,
}

/// A valid draft, possibly waiting on the user to confirm a future date.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Ready(Transaction),
    ConfirmFuture(Transaction),
}

impl Submission {
    pub fn transaction(&self) -> &Transaction {
        match self {
            Submission::Ready(t) | Submission::ConfirmFuture(t) => t,
        }
    }

    /// The transaction to submit once the user has agreed to a future date.
    pub fn confirm(self) -> Transaction {
        match self {
            Submission::Ready(t) | Submission::ConfirmFuture(t) => t,
        }
    }

    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Submission::ConfirmFuture(_))
    }
}

impl Draft {
    /// Empty form defaulted to `now`.
    pub fn empty(now: NaiveDateTime) -> Self {
        Self {
            category: String::new(),
            amount: String::new(),
            note: String::new(),
            date: now.date(),
            time: picker_time(now.time()),
            manual_time: false,
        }
    }

    /// Form preloaded for editing an existing transaction.
    pub fn from_transaction(txn: &Transaction) -> Self {
        Self {
            category: txn.category.clone(),
            amount: txn.amount.to_string(),
            note: txn.note.clone().unwrap_or_default(),
            date: txn.occurred_at.date(),
            time: picker_time(txn.occurred_at.time()),
            manual_time: txn.manual_time,
        }
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
        self.manual_time = true;
    }

    pub fn set_time(&mut self, time: NaiveTime) {
        self.time = picker_time(time);
        self.manual_time = true;
    }

    pub fn occurred_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Checks the draft against `now`. Blank categories and non-positive or
    /// unparsable amounts are rejected; dates after `now` need confirmation.
    pub fn validate(&self, now: NaiveDateTime) -> Result<Submission> {
        let category = normalize_category(&self.category);
        if category.is_empty() {
            return Err(SpendError::InvalidInput("category is required".to_string()));
        }
        let amount = parse_amount(&self.amount)?;
        let note = Some(self.note.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let txn = Transaction {
            id: None,
            occurred_at: self.occurred_at(),
            category,
            amount,
            note,
            manual_time: self.manual_time,
        };
        if txn.occurred_at > now {
            Ok(Submission::ConfirmFuture(txn))
        } else {
            Ok(Submission::Ready(txn))
        }
    }
}
