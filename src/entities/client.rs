//! Client entity - A paying customer owned by an app user.
//!
//! `total_revenue` is a cached sum of the client's income transactions and can be
//! refreshed with `core::client::sync_client_revenue`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Client database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "Client")]
pub struct Model {
    /// Unique identifier for the client
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user id
    #[sea_orm(column_name = "userId")]
    pub user_id: String,
    /// Contact name
    pub name: String,
    /// Company the contact works for
    pub company: String,
    /// Contact email
    pub email: String,
    /// Optional phone number
    pub phone: Option<String>,
    /// Cached sum of income transactions
    #[sea_orm(column_name = "totalRevenue")]
    pub total_revenue: f64,
    /// When the client was created
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Client and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each client belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One client has many campaigns
    #[sea_orm(has_many = "super::campaign::Entity")]
    Campaigns,
    /// One client has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaigns.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
