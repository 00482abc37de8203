//! Derived financial metrics.
//!
//! Pure functions over already-loaded transactions: currency formatting, ROI,
//! campaign status colours, per-day time series and simple totals. Nothing here
//! touches the database, so every function is cheap to call on each render.

use crate::config::settings::DisplayConfig;
use crate::entities::{CampaignStatus, TransactionModel, TransactionType};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// How currency amounts are rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyStyle {
    /// Symbol placed before the digits
    pub symbol: String,
    /// Thousands separator
    pub grouping_separator: char,
}

impl Default for CurrencyStyle {
    fn default() -> Self {
        Self {
            symbol: "$".to_string(),
            grouping_separator: ',',
        }
    }
}

impl From<&DisplayConfig> for CurrencyStyle {
    fn from(display: &DisplayConfig) -> Self {
        Self {
            symbol: display.currency_symbol.clone(),
            grouping_separator: display.grouping_separator,
        }
    }
}

/// Formats an amount as whole dollars, e.g. `$12,346` or `-$1,000`.
#[must_use]
pub fn format_currency(amount: f64) -> String {
    format_currency_with(amount, &CurrencyStyle::default())
}

/// Formats an amount with no fractional digits using `style`.
///
/// Rounds half away from zero. Amounts that round to zero never carry a minus
/// sign. Non-finite input renders as `NaN` or `∞` after the symbol instead of failing.
#[must_use]
pub fn format_currency_with(amount: f64, style: &CurrencyStyle) -> String {
    let symbol = &style.symbol;
    if amount.is_nan() {
        return format!("{symbol}NaN");
    }

    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    if amount.is_infinite() {
        return format!("{sign}{symbol}∞");
    }

    let digits = format!("{:.0}", rounded.abs());
    format!(
        "{sign}{symbol}{}",
        group_digits(&digits, style.grouping_separator)
    )
}

fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// Return on investment as a ratio: `(revenue - cost) / cost`.
///
/// A zero cost yields exactly `0.0` rather than an infinity.
#[must_use]
pub fn calculate_roi(revenue: f64, cost: f64) -> f64 {
    if cost == 0.0 {
        return 0.0;
    }

    (revenue - cost) / cost
}

/// Badge colour classes for a campaign status.
#[must_use]
pub const fn status_color(status: CampaignStatus) -> &'static str {
    match status {
        CampaignStatus::Active => "bg-green-100 text-green-800",
        CampaignStatus::Completed => "bg-blue-100 text-blue-800",
        CampaignStatus::Paused => "bg-yellow-100 text-yellow-800",
    }
}

/// Income and expense booked on a single day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    /// Calendar day
    pub date: NaiveDate,
    /// Sum of income amounts on that day
    pub income: f64,
    /// Sum of expense amounts on that day
    pub expense: f64,
}

/// Buckets transactions into one point per day of `[start, end]`, inclusive.
///
/// Days without transactions are present with zero totals. Transactions outside
/// the range are ignored. An inverted range (`start > end`) yields no points.
#[must_use]
pub fn generate_time_series_data(
    transactions: &[TransactionModel],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<TimeSeriesPoint> {
    if start > end {
        return Vec::new();
    }

    let mut points: Vec<TimeSeriesPoint> = start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|date| TimeSeriesPoint {
            date,
            income: 0.0,
            expense: 0.0,
        })
        .collect();

    for transaction in transactions {
        if transaction.date < start || transaction.date > end {
            continue;
        }
        let Ok(offset) = usize::try_from((transaction.date - start).num_days()) else {
            continue;
        };
        if let Some(point) = points.get_mut(offset) {
            match transaction.transaction_type {
                TransactionType::Income => point.income += transaction.amount,
                TransactionType::Expense => point.expense += transaction.amount,
            }
        }
    }

    points
}

/// Earliest and latest transaction dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateBounds {
    /// Earliest date
    pub first_date: NaiveDate,
    /// Latest date
    pub last_date: NaiveDate,
}

/// Returns the date span covered by `transactions`, or today for both ends when empty.
#[must_use]
pub fn get_first_and_last_transaction_dates(transactions: &[TransactionModel]) -> DateBounds {
    get_first_and_last_transaction_dates_or(transactions, Local::now().date_naive())
}

/// Same as [`get_first_and_last_transaction_dates`] with an explicit fallback day.
#[must_use]
pub fn get_first_and_last_transaction_dates_or(
    transactions: &[TransactionModel],
    fallback: NaiveDate,
) -> DateBounds {
    let first_date = transactions.iter().map(|t| t.date).min();
    let last_date = transactions.iter().map(|t| t.date).max();

    match (first_date, last_date) {
        (Some(first_date), Some(last_date)) => DateBounds {
            first_date,
            last_date,
        },
        _ => DateBounds {
            first_date: fallback,
            last_date: fallback,
        },
    }
}

/// Income, expense and their difference.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Totals {
    /// Sum of income amounts
    pub income: f64,
    /// Sum of expense amounts
    pub expense: f64,
    /// `income - expense`
    pub net: f64,
}

/// Sums income and expense over `transactions`.
#[must_use]
pub fn income_expense_totals(transactions: &[TransactionModel]) -> Totals {
    let (income, expense) =
        transactions
            .iter()
            .fold((0.0, 0.0), |(income, expense), t| match t.transaction_type {
                TransactionType::Income => (income + t.amount, expense),
                TransactionType::Expense => (income, expense + t.amount),
            });

    Totals {
        income,
        expense,
        net: transactions
            .iter()
            .fold(0.0, |net, t| net + t.signed_amount()),
    }
}

/// Spend and revenue of one campaign, derived from its transactions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CampaignTotals {
    /// Sum of expense transactions
    pub spent: f64,
    /// Sum of income transactions
    pub revenue: f64,
}

impl CampaignTotals {
    /// ROI of the campaign, zero when nothing was spent.
    #[must_use]
    pub fn roi(&self) -> f64 {
        calculate_roi(self.revenue, self.spent)
    }
}

/// Derives a campaign's spend and revenue from the transactions tagged with it.
#[must_use]
pub fn campaign_totals(campaign_id: i64, transactions: &[TransactionModel]) -> CampaignTotals {
    let tagged: Vec<TransactionModel> = transactions
        .iter()
        .filter(|t| t.campaign_id == Some(campaign_id))
        .cloned()
        .collect();
    let totals = income_expense_totals(&tagged);

    CampaignTotals {
        spent: totals.expense,
        revenue: totals.income,
    }
}

/// Sum of income booked against a client.
#[must_use]
pub fn client_revenue(client_id: i64, transactions: &[TransactionModel]) -> f64 {
    transactions
        .iter()
        .filter(|t| t.client_id == client_id && t.transaction_type == TransactionType::Income)
        .map(|t| t.amount)
        .sum()
}

/// Income and expense for one category name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// Category name
    pub category: String,
    /// Income booked under the category
    pub income: f64,
    /// Expense booked under the category
    pub expense: f64,
}

/// Groups totals by category, ordered by category name.
#[must_use]
pub fn totals_by_category(transactions: &[TransactionModel]) -> Vec<CategoryTotal> {
    let mut grouped: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for t in transactions {
        let entry = grouped.entry(t.category.as_str()).or_insert((0.0, 0.0));
        match t.transaction_type {
            TransactionType::Income => entry.0 += t.amount,
            TransactionType::Expense => entry.1 += t.amount,
        }
    }

    grouped
        .into_iter()
        .map(|(category, (income, expense))| CategoryTotal {
            category: category.to_string(),
            income,
            expense,
        })
        .collect()
}
