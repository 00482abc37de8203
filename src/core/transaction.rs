//! Transaction business logic - Handles all transaction-related operations.
//!
//! This module provides functions for creating, retrieving, updating and deleting
//! income/expense records. Amounts are stored non-negative; the transaction type
//! carries the direction. Every write checks that the client (and the campaign,
//! when given) belong to the same owner, and that a campaign belongs to the
//! transaction's client. Cached campaign/client totals are not touched here; see
//! `campaign::sync_campaign_totals` and `client::sync_client_revenue`.

use crate::{
    core::{campaign, category, client, filter::TransactionFilter, validation},
    entities::{Transaction, TransactionType, transaction},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;

/// Fields of the create/edit transaction form.
#[derive(Debug, Clone)]
pub struct TransactionInput {
    /// Client the transaction is booked against
    pub client_id: i64,
    /// Optional campaign of that client
    pub campaign_id: Option<i64>,
    /// Calendar day
    pub date: NaiveDate,
    /// Non-negative amount
    pub amount: f64,
    /// Income or expense
    pub transaction_type: TransactionType,
    /// Category name
    pub category: String,
    /// Free-text description
    pub description: String,
}

struct ValidTransaction {
    client_id: i64,
    campaign_id: Option<i64>,
    date: NaiveDate,
    amount: f64,
    transaction_type: TransactionType,
    category: String,
    description: String,
}

async fn validate(
    db: &DatabaseConnection,
    owner_id: &str,
    input: TransactionInput,
) -> Result<ValidTransaction> {
    let amount = validation::non_negative_amount(input.amount)?;
    let category_name = validation::required("category", &input.category)?;

    if client::get_client_by_id(db, owner_id, input.client_id)
        .await?
        .is_none()
    {
        return Err(Error::validation("client_id", "must be one of your clients"));
    }

    if let Some(campaign_id) = input.campaign_id {
        let campaign = campaign::get_campaign_by_id(db, owner_id, campaign_id)
            .await?
            .ok_or_else(|| Error::validation("campaign_id", "must be one of your campaigns"))?;
        if campaign.client_id != input.client_id {
            return Err(Error::validation(
                "campaign_id",
                "belongs to a different client",
            ));
        }
    }

    // Unknown names are accepted as free text; known ones must fit the type
    if let Some(known) = category::find_category_by_name(db, owner_id, &category_name).await? {
        if !known.category_type.applies_to(input.transaction_type) {
            return Err(Error::validation(
                "category",
                format!("'{}' cannot be used for this transaction type", known.name),
            ));
        }
    }

    Ok(ValidTransaction {
        client_id: input.client_id,
        campaign_id: input.campaign_id,
        date: input.date,
        amount,
        transaction_type: input.transaction_type,
        category: category_name,
        description: input.description.trim().to_string(),
    })
}

/// Records a transaction for the owner after validating the form input.
pub async fn create_transaction(
    db: &DatabaseConnection,
    owner_id: &str,
    input: TransactionInput,
) -> Result<transaction::Model> {
    let valid = validate(db, owner_id, input).await?;

    let model = transaction::ActiveModel {
        user_id: Set(owner_id.to_string()),
        client_id: Set(valid.client_id),
        campaign_id: Set(valid.campaign_id),
        date: Set(valid.date),
        amount: Set(valid.amount),
        transaction_type: Set(valid.transaction_type),
        category: Set(valid.category),
        description: Set(valid.description),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    debug!(
        "Recorded {:?} of {} for client {}",
        created.transaction_type, created.amount, created.client_id
    );
    Ok(created)
}

/// Retrieves one of the owner's transactions by id.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    owner_id: &str,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .filter(transaction::Column::UserId.eq(owner_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the owner's transactions, newest date first.
pub async fn list_transactions(
    db: &DatabaseConnection,
    owner_id: &str,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::UserId.eq(owner_id))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads the owner's transactions and applies `filter`, keeping the newest-first order.
pub async fn list_filtered_transactions(
    db: &DatabaseConnection,
    owner_id: &str,
    filter: &TransactionFilter,
) -> Result<Vec<transaction::Model>> {
    let all = list_transactions(db, owner_id).await?;
    Ok(crate::core::filter::filter_transactions(&all, filter))
}

/// Applies the edit form to an existing transaction.
pub async fn update_transaction(
    db: &DatabaseConnection,
    owner_id: &str,
    transaction_id: i64,
    input: TransactionInput,
) -> Result<transaction::Model> {
    let existing = get_transaction_by_id(db, owner_id, transaction_id)
        .await?
        .ok_or_else(|| Error::not_found("Transaction", transaction_id))?;
    let valid = validate(db, owner_id, input).await?;

    let mut active: transaction::ActiveModel = existing.into();
    active.client_id = Set(valid.client_id);
    active.campaign_id = Set(valid.campaign_id);
    active.date = Set(valid.date);
    active.amount = Set(valid.amount);
    active.transaction_type = Set(valid.transaction_type);
    active.category = Set(valid.category);
    active.description = Set(valid.description);

    active.update(db).await.map_err(Into::into)
}

/// Deletes one of the owner's transactions.
pub async fn delete_transaction(
    db: &DatabaseConnection,
    owner_id: &str,
    transaction_id: i64,
) -> Result<()> {
    let result = Transaction::delete_many()
        .filter(transaction::Column::Id.eq(transaction_id))
        .filter(transaction::Column::UserId.eq(owner_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("Transaction", transaction_id));
    }
    Ok(())
}
