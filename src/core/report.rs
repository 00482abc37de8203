//! Dashboard report generation.
//!
//! This module composes the metric functions into the dashboard view: totals,
//! ROI, a per-day series for the chart, category and client breakdowns and
//! per-campaign performance. Campaign spend and revenue are derived from the
//! transactions rather than read from the cached campaign columns.

use crate::{
    core::{
        campaign, client,
        filter::{TransactionFilter, filter_transactions},
        metrics::{
            self, CategoryTotal, CurrencyStyle, DateBounds, TimeSeriesPoint, Totals,
            calculate_roi, format_currency_with, status_color,
        },
        transaction,
    },
    entities::CampaignStatus,
    errors::Result,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;

const TOP_CLIENT_LIMIT: usize = 5;

/// Revenue attributed to one client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRevenue {
    /// Client id
    pub client_id: i64,
    /// Client name
    pub name: String,
    /// Income booked against the client
    pub revenue: f64,
}

/// Performance figures of one campaign.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignPerformance {
    /// Campaign id
    pub campaign_id: i64,
    /// Campaign name
    pub name: String,
    /// Current status
    pub status: CampaignStatus,
    /// Badge colour classes for the status
    pub status_color: &'static str,
    /// Planned budget
    pub budget: f64,
    /// Derived spend
    pub spent: f64,
    /// Derived revenue
    pub revenue: f64,
    /// ROI ratio, zero when nothing was spent
    pub roi: f64,
    /// Share of the budget spent, in percent
    pub budget_used_percent: f64,
}

/// Everything the dashboard shows for one filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    /// Date span covered
    pub range: DateBounds,
    /// Income, expense and net
    pub totals: Totals,
    /// Overall ROI ratio (income over expense)
    pub roi: f64,
    /// One point per day of `range`
    pub time_series: Vec<TimeSeriesPoint>,
    /// Totals per category
    pub by_category: Vec<CategoryTotal>,
    /// Highest-revenue clients, best first
    pub top_clients: Vec<ClientRevenue>,
    /// Every campaign with its derived figures
    pub campaigns: Vec<CampaignPerformance>,
    /// Number of transactions that passed the filter
    pub transaction_count: usize,
}

/// Builds the dashboard for the owner's transactions matching `filter`.
///
/// The date range comes from the filter when given; otherwise it spans the
/// first and last matching transaction (today when nothing matched).
pub async fn generate_dashboard(
    db: &DatabaseConnection,
    owner_id: &str,
    filter: &TransactionFilter,
) -> Result<DashboardReport> {
    let all = transaction::list_transactions(db, owner_id).await?;
    let transactions = filter_transactions(&all, filter);

    let observed = metrics::get_first_and_last_transaction_dates(&transactions);
    let range = DateBounds {
        first_date: filter.start_date.unwrap_or(observed.first_date),
        last_date: filter.end_date.unwrap_or(observed.last_date),
    };

    let totals = metrics::income_expense_totals(&transactions);

    let clients = client::list_clients(db, owner_id).await?;
    let mut top_clients: Vec<ClientRevenue> = clients
        .into_iter()
        .map(|c| ClientRevenue {
            client_id: c.id,
            revenue: metrics::client_revenue(c.id, &transactions),
            name: c.name,
        })
        .filter(|c| c.revenue > 0.0)
        .collect();
    top_clients.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    top_clients.truncate(TOP_CLIENT_LIMIT);

    let campaigns = campaign::list_campaigns(db, owner_id)
        .await?
        .into_iter()
        .map(|c| {
            let derived = metrics::campaign_totals(c.id, &transactions);
            CampaignPerformance {
                campaign_id: c.id,
                name: c.name,
                status: c.status,
                status_color: status_color(c.status),
                budget: c.budget,
                spent: derived.spent,
                revenue: derived.revenue,
                roi: derived.roi(),
                budget_used_percent: calculate_budget_used(derived.spent, c.budget),
            }
        })
        .collect();

    Ok(DashboardReport {
        time_series: metrics::generate_time_series_data(
            &transactions,
            range.first_date,
            range.last_date,
        ),
        by_category: metrics::totals_by_category(&transactions),
        roi: calculate_roi(totals.income, totals.expense),
        transaction_count: transactions.len(),
        range,
        totals,
        top_clients,
        campaigns,
    })
}

/// Share of a budget that has been spent, in percent.
///
/// A zero budget reports 0%. Values above 100 mean overspending.
#[must_use]
pub fn calculate_budget_used(spent: f64, budget: f64) -> f64 {
    if budget == 0.0 {
        return 0.0;
    }

    (spent / budget) * 100.0
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80%`
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // Cast safety: clamped_progress ∈ [0, 100], length is small (10-20).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    let filled_str = "█".repeat(filled);
    let empty_str = "░".repeat(empty);

    format!("[{filled_str}{empty_str}] {progress_percent:.1}%")
}

/// Renders the dashboard as plain text, one section per block.
#[must_use]
pub fn format_dashboard_summary(report: &DashboardReport, style: &CurrencyStyle) -> String {
    let money = |amount: f64| format_currency_with(amount, style);
    let mut lines = vec![
        format!(
            "Dashboard {} → {} ({} transactions)",
            report.range.first_date, report.range.last_date, report.transaction_count
        ),
        format!(
            "  Income: {} | Expense: {} | Net: {} | ROI: {:.1}%",
            money(report.totals.income),
            money(report.totals.expense),
            money(report.totals.net),
            report.roi * 100.0
        ),
    ];

    if !report.top_clients.is_empty() {
        lines.push(String::new());
        lines.push("Top clients".to_string());
        lines.extend(
            report
                .top_clients
                .iter()
                .map(|c| format!("  {} - {}", c.name, money(c.revenue))),
        );
    }

    if !report.campaigns.is_empty() {
        lines.push(String::new());
        lines.push("Campaigns".to_string());
        lines.extend(report.campaigns.iter().map(|c| {
            format!(
                "  {} ({:?}) {} spent {} of {}, revenue {}",
                c.name,
                c.status,
                format_progress_bar(c.budget_used_percent, Some(10)),
                money(c.spent),
                money(c.budget),
                money(c.revenue)
            )
        }));
    }

    lines.join("\n")
}
