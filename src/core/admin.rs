//! Admin console operations.
//!
//! Every function takes the acting user's profile and refuses to run unless that
//! profile has the `admin` role.

use crate::{
    entities::{Campaign, Client, Transaction, User, UserRole, campaign, client, transaction, user},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::warn;

/// Row counts owned by one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OwnerCounts {
    /// Number of clients
    pub clients: u64,
    /// Number of campaigns
    pub campaigns: u64,
    /// Number of transactions
    pub transactions: u64,
}

fn require_admin(actor: &user::Model) -> Result<()> {
    if actor.is_admin() {
        return Ok(());
    }
    warn!("User {} tried to use the admin console", actor.id);
    Err(Error::Forbidden {
        message: "admin role required".to_string(),
    })
}

/// Lists every profile, oldest first.
pub async fn list_users(db: &DatabaseConnection, actor: &user::Model) -> Result<Vec<user::Model>> {
    require_admin(actor)?;
    User::find()
        .order_by_asc(user::Column::CreatedAt)
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Changes a user's role. Admins cannot demote themselves.
pub async fn set_user_role(
    db: &DatabaseConnection,
    actor: &user::Model,
    user_id: &str,
    role: UserRole,
) -> Result<user::Model> {
    require_admin(actor)?;
    if actor.id == user_id && role != UserRole::Admin {
        return Err(Error::Forbidden {
            message: "admins cannot remove their own admin role".to_string(),
        });
    }

    let existing = User::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;

    let mut active: user::ActiveModel = existing.into();
    active.role = Set(role);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Counts the rows a user owns.
pub async fn owner_counts(
    db: &DatabaseConnection,
    actor: &user::Model,
    user_id: &str,
) -> Result<OwnerCounts> {
    require_admin(actor)?;

    Ok(OwnerCounts {
        clients: Client::find()
            .filter(client::Column::UserId.eq(user_id))
            .count(db)
            .await?,
        campaigns: Campaign::find()
            .filter(campaign::Column::UserId.eq(user_id))
            .count(db)
            .await?,
        transactions: Transaction::find()
            .filter(transaction::Column::UserId.eq(user_id))
            .count(db)
            .await?,
    })
}
