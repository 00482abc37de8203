//! Campaign business logic - Handles all campaign-related operations.
//!
//! A campaign always points at a client of the same owner; this is checked on
//! create and update. The cached `spent` / `revenue` columns are kept in step with
//! the campaign's transactions by [`sync_campaign_totals`], and the derived sums
//! are what reports use.

use crate::{
    core::{client, metrics, validation},
    entities::{Campaign, CampaignStatus, Transaction, campaign, transaction},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::info;

/// Fields of the create/edit campaign form.
#[derive(Debug, Clone)]
pub struct CampaignInput {
    /// Client the campaign is run for
    pub client_id: i64,
    /// Campaign name
    pub name: String,
    /// Advertising platform
    pub platform: String,
    /// First day
    pub start_date: NaiveDate,
    /// Last day, `None` while ongoing
    pub end_date: Option<NaiveDate>,
    /// Planned budget
    pub budget: f64,
    /// Status
    pub status: CampaignStatus,
}

struct ValidCampaign {
    client_id: i64,
    name: String,
    platform: String,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    budget: f64,
    status: CampaignStatus,
}

async fn validate(
    db: &DatabaseConnection,
    owner_id: &str,
    input: CampaignInput,
) -> Result<ValidCampaign> {
    let name = validation::required("name", &input.name)?;
    let platform = validation::required("platform", &input.platform)?;
    let budget = validation::non_negative_amount(input.budget)?;
    validation::date_order(input.start_date, input.end_date)?;

    if client::get_client_by_id(db, owner_id, input.client_id)
        .await?
        .is_none()
    {
        return Err(Error::validation("client_id", "must be one of your clients"));
    }

    Ok(ValidCampaign {
        client_id: input.client_id,
        name,
        platform,
        start_date: input.start_date,
        end_date: input.end_date,
        budget,
        status: input.status,
    })
}

/// Creates a campaign for one of the owner's clients.
pub async fn create_campaign(
    db: &DatabaseConnection,
    owner_id: &str,
    input: CampaignInput,
) -> Result<campaign::Model> {
    let valid = validate(db, owner_id, input).await?;

    let model = campaign::ActiveModel {
        user_id: Set(owner_id.to_string()),
        client_id: Set(valid.client_id),
        name: Set(valid.name),
        platform: Set(valid.platform),
        start_date: Set(valid.start_date),
        end_date: Set(valid.end_date),
        budget: Set(valid.budget),
        spent: Set(0.0),
        revenue: Set(0.0),
        status: Set(valid.status),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!(
        "Created campaign {} for client {}",
        created.id, created.client_id
    );
    Ok(created)
}

/// Finds one of the owner's campaigns.
pub async fn get_campaign_by_id(
    db: &DatabaseConnection,
    owner_id: &str,
    campaign_id: i64,
) -> Result<Option<campaign::Model>> {
    Campaign::find_by_id(campaign_id)
        .filter(campaign::Column::UserId.eq(owner_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the owner's campaigns, most recent start date first.
pub async fn list_campaigns(
    db: &DatabaseConnection,
    owner_id: &str,
) -> Result<Vec<campaign::Model>> {
    Campaign::find()
        .filter(campaign::Column::UserId.eq(owner_id))
        .order_by_desc(campaign::Column::StartDate)
        .order_by_asc(campaign::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists the campaigns of one client.
pub async fn list_campaigns_for_client(
    db: &DatabaseConnection,
    owner_id: &str,
    client_id: i64,
) -> Result<Vec<campaign::Model>> {
    Campaign::find()
        .filter(campaign::Column::UserId.eq(owner_id))
        .filter(campaign::Column::ClientId.eq(client_id))
        .order_by_desc(campaign::Column::StartDate)
        .order_by_asc(campaign::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies the edit form to an existing campaign. Cached totals are left untouched.
pub async fn update_campaign(
    db: &DatabaseConnection,
    owner_id: &str,
    campaign_id: i64,
    input: CampaignInput,
) -> Result<campaign::Model> {
    let existing = get_campaign_by_id(db, owner_id, campaign_id)
        .await?
        .ok_or_else(|| Error::not_found("Campaign", campaign_id))?;
    let valid = validate(db, owner_id, input).await?;

    let mut active: campaign::ActiveModel = existing.into();
    active.client_id = Set(valid.client_id);
    active.name = Set(valid.name);
    active.platform = Set(valid.platform);
    active.start_date = Set(valid.start_date);
    active.end_date = Set(valid.end_date);
    active.budget = Set(valid.budget);
    active.status = Set(valid.status);

    active.update(db).await.map_err(Into::into)
}

/// Changes only the status, e.g. from the list view's pause/resume action.
pub async fn set_campaign_status(
    db: &DatabaseConnection,
    owner_id: &str,
    campaign_id: i64,
    status: CampaignStatus,
) -> Result<campaign::Model> {
    let existing = get_campaign_by_id(db, owner_id, campaign_id)
        .await?
        .ok_or_else(|| Error::not_found("Campaign", campaign_id))?;

    let mut active: campaign::ActiveModel = existing.into();
    active.status = Set(status);
    active.update(db).await.map_err(Into::into)
}

/// Deletes a campaign. Its transactions are kept and detached from it.
pub async fn delete_campaign(
    db: &DatabaseConnection,
    owner_id: &str,
    campaign_id: i64,
) -> Result<()> {
    let txn = db.begin().await?;

    let existing = Campaign::find_by_id(campaign_id)
        .filter(campaign::Column::UserId.eq(owner_id))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Campaign", campaign_id))?;

    Transaction::update_many()
        .col_expr(
            transaction::Column::CampaignId,
            Expr::value(Option::<i64>::None),
        )
        .filter(transaction::Column::CampaignId.eq(campaign_id))
        .exec(&txn)
        .await?;

    existing.delete(&txn).await?;
    txn.commit().await?;
    Ok(())
}

/// Recomputes `spent` and `revenue` from the campaign's transactions and stores them.
pub async fn sync_campaign_totals(
    db: &DatabaseConnection,
    owner_id: &str,
    campaign_id: i64,
) -> Result<campaign::Model> {
    let existing = get_campaign_by_id(db, owner_id, campaign_id)
        .await?
        .ok_or_else(|| Error::not_found("Campaign", campaign_id))?;

    let transactions = Transaction::find()
        .filter(transaction::Column::CampaignId.eq(campaign_id))
        .all(db)
        .await?;
    let totals = metrics::campaign_totals(campaign_id, &transactions);

    let mut active: campaign::ActiveModel = existing.into();
    active.spent = Set(totals.spent);
    active.revenue = Set(totals.revenue);
    active.update(db).await.map_err(Into::into)
}

/// Whether the campaign is still running on `today`.
#[must_use]
pub fn is_ongoing(campaign: &campaign::Model, today: NaiveDate) -> bool {
    campaign.status == CampaignStatus::Active
        && campaign.start_date <= today
        && campaign.end_date.is_none_or(|end| end >= today)
}
