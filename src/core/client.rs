//! Client business logic - Handles all client-related operations.
//!
//! Every query is scoped to the owning user. Deleting a client removes its
//! transactions and campaigns in the same database transaction so no dangling
//! foreign keys remain.

use crate::{
    core::{metrics, validation},
    entities::{Campaign, Client, Transaction, campaign, client, transaction},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Fields of the create/edit client form.
#[derive(Debug, Clone, Default)]
pub struct ClientInput {
    /// Contact name
    pub name: String,
    /// Company name
    pub company: String,
    /// Contact email
    pub email: String,
    /// Optional phone number
    pub phone: Option<String>,
}

struct ValidClient {
    name: String,
    company: String,
    email: String,
    phone: Option<String>,
}

fn validate(input: ClientInput) -> Result<ValidClient> {
    Ok(ValidClient {
        name: validation::required("name", &input.name)?,
        company: validation::required("company", &input.company)?,
        email: validation::email("email", &input.email)?,
        phone: validation::optional(input.phone),
    })
}

/// Creates a client for `owner_id` after validating the form input.
pub async fn create_client(
    db: &DatabaseConnection,
    owner_id: &str,
    input: ClientInput,
) -> Result<client::Model> {
    let valid = validate(input)?;

    let model = client::ActiveModel {
        user_id: Set(owner_id.to_string()),
        name: Set(valid.name),
        company: Set(valid.company),
        email: Set(valid.email),
        phone: Set(valid.phone),
        total_revenue: Set(0.0),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!("Created client {} for user {owner_id}", created.id);
    Ok(created)
}

/// Finds one of the owner's clients, `None` if it does not exist or belongs to someone else.
pub async fn get_client_by_id(
    db: &DatabaseConnection,
    owner_id: &str,
    client_id: i64,
) -> Result<Option<client::Model>> {
    Client::find_by_id(client_id)
        .filter(client::Column::UserId.eq(owner_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the owner's clients alphabetically by name.
pub async fn list_clients(db: &DatabaseConnection, owner_id: &str) -> Result<Vec<client::Model>> {
    Client::find()
        .filter(client::Column::UserId.eq(owner_id))
        .order_by_asc(client::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Case-insensitive match of `query` against name, company and email.
///
/// A blank query matches every client.
#[must_use]
pub fn matches_search(client: &client::Model, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    [&client.name, &client.company, &client.email]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Narrows an already-loaded client list by the search box text.
#[must_use]
pub fn search_clients(clients: &[client::Model], query: &str) -> Vec<client::Model> {
    clients
        .iter()
        .filter(|c| matches_search(c, query))
        .cloned()
        .collect()
}

/// Applies the edit form to an existing client.
pub async fn update_client(
    db: &DatabaseConnection,
    owner_id: &str,
    client_id: i64,
    input: ClientInput,
) -> Result<client::Model> {
    let valid = validate(input)?;
    let existing = get_client_by_id(db, owner_id, client_id)
        .await?
        .ok_or_else(|| Error::not_found("Client", client_id))?;

    let mut active: client::ActiveModel = existing.into();
    active.name = Set(valid.name);
    active.company = Set(valid.company);
    active.email = Set(valid.email);
    active.phone = Set(valid.phone);

    active.update(db).await.map_err(Into::into)
}

/// Deletes a client together with its campaigns and transactions.
pub async fn delete_client(db: &DatabaseConnection, owner_id: &str, client_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let existing = Client::find_by_id(client_id)
        .filter(client::Column::UserId.eq(owner_id))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Client", client_id))?;

    let removed_transactions = Transaction::delete_many()
        .filter(transaction::Column::ClientId.eq(client_id))
        .filter(transaction::Column::UserId.eq(owner_id))
        .exec(&txn)
        .await?
        .rows_affected;
    let removed_campaigns = Campaign::delete_many()
        .filter(campaign::Column::ClientId.eq(client_id))
        .filter(campaign::Column::UserId.eq(owner_id))
        .exec(&txn)
        .await?
        .rows_affected;

    existing.delete(&txn).await?;
    txn.commit().await?;

    debug!(
        "Deleted client {client_id} with {removed_campaigns} campaigns and {removed_transactions} transactions"
    );
    Ok(())
}

/// Ids of the campaigns run for a client, in creation order.
pub async fn client_campaign_ids(
    db: &DatabaseConnection,
    owner_id: &str,
    client_id: i64,
) -> Result<Vec<i64>> {
    Campaign::find()
        .select_only()
        .column(campaign::Column::Id)
        .filter(campaign::Column::ClientId.eq(client_id))
        .filter(campaign::Column::UserId.eq(owner_id))
        .order_by_asc(campaign::Column::Id)
        .into_tuple::<i64>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Recomputes `total_revenue` from the client's income transactions and stores it.
pub async fn sync_client_revenue(
    db: &DatabaseConnection,
    owner_id: &str,
    client_id: i64,
) -> Result<client::Model> {
    let existing = get_client_by_id(db, owner_id, client_id)
        .await?
        .ok_or_else(|| Error::not_found("Client", client_id))?;

    let transactions = Transaction::find()
        .filter(transaction::Column::ClientId.eq(client_id))
        .filter(transaction::Column::UserId.eq(owner_id))
        .all(db)
        .await?;
    let revenue = metrics::client_revenue(client_id, &transactions);

    let mut active: client::ActiveModel = existing.into();
    active.total_revenue = Set(revenue);
    active.update(db).await.map_err(Into::into)
}
