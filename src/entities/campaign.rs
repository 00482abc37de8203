//! Campaign entity - A marketing initiative run for a client.
//!
//! `spent` and `revenue` are cached sums over the campaign's transactions. A
//! missing `end_date` means the campaign is still running.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Currently running
    #[sea_orm(string_value = "active")]
    Active,
    /// Finished
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Temporarily stopped
    #[sea_orm(string_value = "paused")]
    Paused,
}

/// Campaign database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "Campaign")]
pub struct Model {
    /// Unique identifier for the campaign
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user id
    #[sea_orm(column_name = "userId")]
    pub user_id: String,
    /// Client the campaign is run for
    #[sea_orm(column_name = "clientId")]
    pub client_id: i64,
    /// Campaign name
    pub name: String,
    /// Advertising platform (e.g. "Google Ads", "Meta")
    pub platform: String,
    /// First day of the campaign
    #[sea_orm(column_name = "startDate")]
    pub start_date: Date,
    /// Last day of the campaign, `None` while ongoing
    #[sea_orm(column_name = "endDate")]
    pub end_date: Option<Date>,
    /// Planned budget
    pub budget: f64,
    /// Cached sum of expense transactions
    pub spent: f64,
    /// Cached sum of income transactions
    pub revenue: f64,
    /// Current status
    pub status: CampaignStatus,
    /// When the campaign was created
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Campaign and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each campaign belongs to one client
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    /// One campaign has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
