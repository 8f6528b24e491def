use std::collections::BTreeSet;

use crate::models::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::NewestFirst => SortOrder::OldestFirst,
            SortOrder::OldestFirst => SortOrder::NewestFirst,
        }
    }
}

/// Search text, category filter and sort order applied on top of a period
/// snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub search: String,
    /// Empty means every category.
    pub categories: BTreeSet<String>,
    pub sort: SortOrder,
}

impl ListQuery {
    fn matches(&self, txn: &Transaction, needle: &str) -> bool {
        let text_ok = needle.is_empty()
            || txn.category.to_lowercase().contains(needle)
            || txn
                .note
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(needle));
        let category_ok = self.categories.is_empty() || self.categories.contains(&txn.category);
        text_ok && category_ok
    }

    pub fn apply(&self, txns: &[Transaction]) -> Vec<Transaction> {
        let needle = self.search.trim().to_lowercase();
        let mut shown: Vec<Transaction> = txns
            .iter()
            .filter(|t| self.matches(t, &needle))
            .cloned()
            .collect();
        match self.sort {
            SortOrder::NewestFirst => shown.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at)),
            SortOrder::OldestFirst => shown.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at)),
        }
        shown
    }
}

pub fn total(txns: &[Transaction]) -> f64 {
    txns.iter().map(|t| t.amount).sum()
}

/// Categories present in `txns`, sorted, for the filter picker.
pub fn distinct_categories(txns: &[Transaction]) -> Vec<String> {
    txns.iter()
        .map(|t| t.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
