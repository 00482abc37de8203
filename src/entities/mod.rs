//! Entity module - Contains all SeaORM entity definitions for the database.
//! Every table is scoped by the owning user's id (`userId`).
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod campaign;
pub mod client;
pub mod transaction;
pub mod transaction_category;
pub mod user;

// Re-export specific types to avoid conflicts
pub use campaign::{
    CampaignStatus, Column as CampaignColumn, Entity as Campaign, Model as CampaignModel,
};
pub use client::{Column as ClientColumn, Entity as Client, Model as ClientModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
    TransactionType,
};
pub use transaction_category::{
    CategoryType, Column as TransactionCategoryColumn, Entity as TransactionCategory,
    Model as TransactionCategoryModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, UserRole};
