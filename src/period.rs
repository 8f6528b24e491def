//! Month and week windows over local time, and the navigation state that
//! moves between them.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::local_to_millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    Month,
    Week,
}

/// Closed interval `[start, end]` in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn start_millis(&self) -> i64 {
        local_to_millis(self.start)
    }

    pub fn end_millis(&self) -> i64 {
        local_to_millis(self.end)
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    // 23:59:59.999999999 is always a valid time.
    date.and_hms_nano_opt(23, 59, 59, 999_999_999)
        .unwrap_or_else(|| start_of_day(date))
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    let last = days_in_month(date.year(), date.month());
    NaiveDate::from_ymd_opt(date.year(), date.month(), last).unwrap_or(date)
}

/// Most recent date on or before `anchor` that falls on `week_start`.
pub fn week_start_on_or_before(anchor: NaiveDate, week_start: Weekday) -> NaiveDate {
    let back = (anchor.weekday().num_days_from_monday() + 7 - week_start.num_days_from_monday()) % 7;
    anchor.checked_sub_days(Days::new(u64::from(back))).unwrap_or(anchor)
}

pub fn month_range(anchor: NaiveDate) -> DateRange {
    DateRange {
        start: start_of_day(first_of_month(anchor)),
        end: end_of_day(last_of_month(anchor)),
    }
}

pub fn week_range(anchor: NaiveDate, week_start: Weekday) -> DateRange {
    let start = week_start_on_or_before(anchor, week_start);
    let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
    DateRange {
        start: start_of_day(start),
        end: end_of_day(end),
    }
}

/// Which window the list shows. The month and week anchors move
/// independently, so switching modes returns to where each was left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodState {
    pub mode: ViewMode,
    pub month_anchor: NaiveDate,
    pub week_anchor: NaiveDate,
    pub week_start: Weekday,
}

impl PeriodState {
    /// Current month view, as on process start.
    pub fn starting_at(today: NaiveDate, week_start: Weekday) -> Self {
        Self {
            mode: ViewMode::Month,
            month_anchor: first_of_month(today),
            week_anchor: today,
            week_start,
        }
    }

    pub fn range(&self) -> DateRange {
        match self.mode {
            ViewMode::Month => month_range(self.month_anchor),
            ViewMode::Week => week_range(self.week_anchor, self.week_start),
        }
    }

    /// First day of the shown period.
    pub fn start(&self) -> NaiveDate {
        self.start_for(self.month_anchor, self.week_anchor)
    }

    fn start_for(&self, month_anchor: NaiveDate, week_anchor: NaiveDate) -> NaiveDate {
        match self.mode {
            ViewMode::Month => first_of_month(month_anchor),
            ViewMode::Week => week_start_on_or_before(week_anchor, self.week_start),
        }
    }

    /// First day of the period containing `today`.
    pub fn current_start(&self, today: NaiveDate) -> NaiveDate {
        self.start_for(today, today)
    }

    pub fn can_go_next_at(&self, today: NaiveDate) -> bool {
        self.start() < self.current_start(today)
    }

    pub fn previous(&mut self) {
        match self.mode {
            ViewMode::Month => {
                if let Some(prev) = self.month_anchor.checked_sub_months(Months::new(1)) {
                    self.month_anchor = prev;
                }
            }
            ViewMode::Week => {
                if let Some(prev) = self.week_anchor.checked_sub_days(Days::new(7)) {
                    self.week_anchor = prev;
                }
            }
        }
    }

    /// Moves one unit forward unless that would pass the period holding
    /// `today`. Returns whether the anchor moved.
    pub fn next_at(&mut self, today: NaiveDate) -> bool {
        if !self.can_go_next_at(today) {
            return false;
        }
        match self.mode {
            ViewMode::Month => match self.month_anchor.checked_add_months(Months::new(1)) {
                Some(next) => self.month_anchor = next,
                None => return false,
            },
            ViewMode::Week => match self.week_anchor.checked_add_days(Days::new(7)) {
                Some(next) => self.week_anchor = next,
                None => return false,
            },
        }
        true
    }

    /// Header text, e.g. "February 2024" or "12 Feb - 18 Feb 2024".
    pub fn label(&self) -> String {
        match self.mode {
            ViewMode::Month => self.month_anchor.format("%B %Y").to_string(),
            ViewMode::Week => {
                let range = self.range();
                format!(
                    "{} - {}",
                    range.start.format("%d %b"),
                    range.end.format("%d %b %Y")
                )
            }
        }
    }
}
