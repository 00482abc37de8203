//! Transaction category entity - Named categories offered in the transaction form.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which transaction types a category applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    /// Only offered for income
    #[sea_orm(string_value = "income")]
    Income,
    /// Only offered for expenses
    #[sea_orm(string_value = "expense")]
    Expense,
    /// Offered for both
    #[sea_orm(string_value = "both")]
    Both,
}

impl CategoryType {
    /// Whether a category of this type can be picked for `transaction_type`.
    #[must_use]
    pub const fn applies_to(self, transaction_type: super::transaction::TransactionType) -> bool {
        use super::transaction::TransactionType;
        matches!(
            (self, transaction_type),
            (Self::Both, _)
                | (Self::Income, TransactionType::Income)
                | (Self::Expense, TransactionType::Expense)
        )
    }
}

/// Transaction category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "TransactionCategory")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user id
    #[sea_orm(column_name = "userId")]
    pub user_id: String,
    /// Category name, unique per owner
    pub name: String,
    /// Applicable transaction types
    #[sea_orm(column_name = "type")]
    pub category_type: CategoryType,
}

/// Defines relationships between `TransactionCategory` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each category belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
