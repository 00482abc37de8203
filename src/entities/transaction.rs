//! Transaction entity - A single income or expense record.
//!
//! Amounts are stored non-negative; `transaction_type` decides the sign when
//! aggregating. `category` is free text so deleting a category never orphans rows.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received
    #[sea_orm(string_value = "income")]
    Income,
    /// Money spent
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "Transaction")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user id
    #[sea_orm(column_name = "userId")]
    pub user_id: String,
    /// Client the transaction is booked against
    #[sea_orm(column_name = "clientId")]
    pub client_id: i64,
    /// Optional campaign the transaction belongs to
    #[sea_orm(column_name = "campaignId")]
    pub campaign_id: Option<i64>,
    /// Calendar day of the transaction
    pub date: Date,
    /// Non-negative amount in dollars
    pub amount: f64,
    /// Income or expense
    #[sea_orm(column_name = "type")]
    pub transaction_type: TransactionType,
    /// Category name
    pub category: String,
    /// Free-text description
    pub description: String,
    /// When the row was created
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Amount with the sign implied by the transaction type.
    #[must_use]
    pub fn signed_amount(&self) -> f64 {
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one client
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    /// A transaction may belong to one campaign
    #[sea_orm(
        belongs_to = "super::campaign::Entity",
        from = "Column::CampaignId",
        to = "super::campaign::Column::Id"
    )]
    Campaign,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
