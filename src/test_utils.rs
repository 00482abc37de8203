//! Shared test utilities for the finance hub.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    auth::profile::{NewProfile, ProfileStore},
    core::{
        campaign::{self, CampaignInput},
        client::{self, ClientInput},
        transaction::{self, TransactionInput},
    },
    entities::{self, CampaignStatus, TransactionType, UserRole},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Owner of every row created by the helpers below.
pub const TEST_OWNER: &str = "test_user";

/// Creates an in-memory `SQLite` database with all tables initialized
/// and the [`TEST_OWNER`] profile in place.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    create_test_user(&db, TEST_OWNER).await?;
    Ok(db)
}

fn profile(id: &str, role: UserRole) -> NewProfile {
    NewProfile {
        id: id.to_string(),
        name: format!("User {id}"),
        email: format!("{id}@example.com"),
        role,
    }
}

/// Creates a regular user profile.
pub async fn create_test_user(db: &DatabaseConnection, id: &str) -> Result<entities::UserModel> {
    db.create_profile(profile(id, UserRole::User)).await
}

/// Creates an admin profile.
pub async fn create_test_admin(db: &DatabaseConnection, id: &str) -> Result<entities::UserModel> {
    db.create_profile(profile(id, UserRole::Admin)).await
}

/// Loads a profile that must exist.
pub async fn get_test_user(db: &DatabaseConnection, id: &str) -> Result<entities::UserModel> {
    db.find_profile(id)
        .await?
        .ok_or_else(|| Error::not_found("User", id))
}

/// Creates a client for [`TEST_OWNER`].
///
/// # Defaults
/// * `company`: "Acme"
/// * `email`: "contact@acme.io"
/// * `phone`: None
pub async fn create_test_client(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::ClientModel> {
    create_custom_client(db, TEST_OWNER, name).await
}

/// Creates a client for any owner.
pub async fn create_custom_client(
    db: &DatabaseConnection,
    owner_id: &str,
    name: &str,
) -> Result<entities::ClientModel> {
    client::create_client(
        db,
        owner_id,
        ClientInput {
            name: name.to_string(),
            company: "Acme".to_string(),
            email: "contact@acme.io".to_string(),
            phone: None,
        },
    )
    .await
}

/// Sets up a complete test environment with a client.
/// Returns (db, client) for common test scenarios.
pub async fn setup_with_client() -> Result<(DatabaseConnection, entities::ClientModel)> {
    let db = setup_test_db().await?;
    let client = create_test_client(&db, "Test Client").await?;
    Ok((db, client))
}

/// Creates a campaign with sensible defaults.
///
/// # Defaults
/// * `platform`: "Google Ads"
/// * `start_date`: 2025-01-01, no end date
/// * `budget`: 1000.0
/// * `status`: Active
pub async fn create_test_campaign(
    db: &DatabaseConnection,
    client_id: i64,
    name: &str,
) -> Result<entities::CampaignModel> {
    campaign::create_campaign(
        db,
        TEST_OWNER,
        CampaignInput {
            client_id,
            name: name.to_string(),
            platform: "Google Ads".to_string(),
            start_date: date("2025-01-01"),
            end_date: None,
            budget: 1_000.0,
            status: CampaignStatus::Active,
        },
    )
    .await
}

/// Records a transaction dated 2025-01-01.
///
/// # Defaults
/// * `category`: "General"
/// * `description`: "Test transaction"
pub async fn create_test_transaction(
    db: &DatabaseConnection,
    client_id: i64,
    campaign_id: Option<i64>,
    amount: f64,
    transaction_type: TransactionType,
) -> Result<entities::TransactionModel> {
    create_dated_transaction(db, client_id, campaign_id, "2025-01-01", amount, transaction_type)
        .await
}

/// Records a transaction on a given `YYYY-MM-DD` date.
pub async fn create_dated_transaction(
    db: &DatabaseConnection,
    client_id: i64,
    campaign_id: Option<i64>,
    on: &str,
    amount: f64,
    transaction_type: TransactionType,
) -> Result<entities::TransactionModel> {
    transaction::create_transaction(
        db,
        TEST_OWNER,
        TransactionInput {
            client_id,
            campaign_id,
            date: date(on),
            amount,
            transaction_type,
            category: "General".to_string(),
            description: "Test transaction".to_string(),
        },
    )
    .await
}

/// In-memory transaction for the pure metric and filter functions.
///
/// # Defaults
/// * `user_id`: [`TEST_OWNER`]
/// * `client_id`: 1
/// * `campaign_id`: None
/// * `category`: "General"
pub fn sample_transaction(
    id: i64,
    on: &str,
    amount: f64,
    transaction_type: TransactionType,
) -> entities::TransactionModel {
    entities::TransactionModel {
        id,
        user_id: TEST_OWNER.to_string(),
        client_id: 1,
        campaign_id: None,
        date: date(on),
        amount,
        transaction_type,
        category: "General".to_string(),
        description: String::new(),
        created_at: chrono::DateTime::default(),
    }
}

/// In-memory client for search tests.
pub fn sample_client(id: i64, name: &str, company: &str, email: &str) -> entities::ClientModel {
    entities::ClientModel {
        id,
        user_id: TEST_OWNER.to_string(),
        name: name.to_string(),
        company: company.to_string(),
        email: email.to_string(),
        phone: None,
        total_revenue: 0.0,
        created_at: chrono::DateTime::default(),
    }
}

/// In-memory campaign with a 1000.0 budget starting 2025-01-01.
pub fn sample_campaign(
    id: i64,
    client_id: i64,
    status: CampaignStatus,
) -> entities::CampaignModel {
    entities::CampaignModel {
        id,
        user_id: TEST_OWNER.to_string(),
        client_id,
        name: format!("Campaign {id}"),
        platform: "Google Ads".to_string(),
        start_date: date("2025-01-01"),
        end_date: None,
        budget: 1_000.0,
        spent: 0.0,
        revenue: 0.0,
        status,
        created_at: chrono::DateTime::default(),
    }
}

#[allow(clippy::unwrap_used)]
fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}
