//! User entity - Mirrors the auth provider's account as a profile row.
//!
//! The provider owns the account lifecycle; this row only carries the display
//! name and the role used by the admin console.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role stored on the profile row
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular account
    #[sea_orm(string_value = "user")]
    User,
    /// Account allowed into the admin console
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// User profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "User")]
pub struct Model {
    /// Provider-issued user id
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    /// Display name
    pub name: String,
    /// Login email as reported by the provider
    pub email: String,
    /// Access role, `user` unless promoted by an admin
    pub role: UserRole,
    /// When the profile row was created
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTimeUtc,
    /// When the profile row was last modified
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTimeUtc,
}

/// A user owns every other row in the schema
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many clients
    #[sea_orm(has_many = "super::client::Entity")]
    Clients,
    /// One user has many transaction categories
    #[sea_orm(has_many = "super::transaction_category::Entity")]
    Categories,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl Related<super::transaction_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this profile may use the admin console.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
