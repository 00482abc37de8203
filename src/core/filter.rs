//! Transaction filtering for list and report views.
//!
//! **Empty lists mean "no restriction".** A filter with `clients: vec![]` keeps
//! transactions of every client; it does not drop them all. Callers building a
//! filter from UI selections must pass an empty list when nothing is selected.

use crate::entities::{TransactionModel, TransactionType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Criteria a transaction must satisfy to be shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Earliest day to include
    pub start_date: Option<NaiveDate>,
    /// Last day to include (the whole day counts)
    pub end_date: Option<NaiveDate>,
    /// Allowed client ids, empty = all
    #[serde(default)]
    pub clients: Vec<i64>,
    /// Allowed campaign ids, empty = all
    #[serde(default)]
    pub campaigns: Vec<i64>,
    /// Allowed transaction types, empty = all
    #[serde(default)]
    pub types: Vec<TransactionType>,
    /// Allowed category names, empty = all
    #[serde(default)]
    pub categories: Vec<String>,
}

impl TransactionFilter {
    /// Filter restricted to the inclusive date range `[start, end]`.
    #[must_use]
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Self::default()
        }
    }

    /// True when the filter lets every transaction through.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.clients.is_empty()
            && self.campaigns.is_empty()
            && self.types.is_empty()
            && self.categories.is_empty()
    }

    /// Whether `transaction` passes every criterion.
    #[must_use]
    pub fn matches(&self, transaction: &TransactionModel) -> bool {
        if self.start_date.is_some_and(|start| transaction.date < start) {
            return false;
        }
        // Dates carry no time of day, so `<=` already covers the whole end day
        if self.end_date.is_some_and(|end| transaction.date > end) {
            return false;
        }

        allows(&self.clients, &transaction.client_id)
            && (self.campaigns.is_empty()
                || transaction
                    .campaign_id
                    .is_some_and(|id| self.campaigns.contains(&id)))
            && allows(&self.types, &transaction.transaction_type)
            && allows(&self.categories, &transaction.category)
    }
}

fn allows<T: PartialEq>(allowed: &[T], value: &T) -> bool {
    allowed.is_empty() || allowed.contains(value)
}

/// Keeps the transactions matching `filter`, preserving their order.
#[must_use]
pub fn filter_transactions(
    transactions: &[TransactionModel],
    filter: &TransactionFilter,
) -> Vec<TransactionModel> {
    transactions
        .iter()
        .filter(|t| filter.matches(t))
        .cloned()
        .collect()
}
