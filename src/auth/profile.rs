//! Profile rows backing the signed-in account.

use crate::{
    core::validation,
    entities::{User, UserRole, user},
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::{DatabaseConnection, Set, prelude::*};
use tracing::info;

/// Fields of a profile created on first sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    /// Provider user id
    pub id: String,
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Initial role
    pub role: UserRole,
}

/// Storage for user profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Looks a profile up by provider id.
    async fn find_profile(&self, id: &str) -> Result<Option<user::Model>>;

    /// Inserts a new profile row.
    async fn create_profile(&self, profile: NewProfile) -> Result<user::Model>;

    /// Renames a profile and returns the stored row.
    async fn update_profile_name(&self, id: &str, name: &str) -> Result<user::Model>;
}

#[async_trait]
impl ProfileStore for DatabaseConnection {
    async fn find_profile(&self, id: &str) -> Result<Option<user::Model>> {
        User::find_by_id(id.to_string())
            .one(self)
            .await
            .map_err(Into::into)
    }

    async fn create_profile(&self, profile: NewProfile) -> Result<user::Model> {
        let now = chrono::Utc::now();
        let model = user::ActiveModel {
            id: Set(profile.id),
            name: Set(profile.name),
            email: Set(profile.email),
            role: Set(profile.role),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(self).await?;
        info!("Created profile for user {}", created.id);
        Ok(created)
    }

    async fn update_profile_name(&self, id: &str, name: &str) -> Result<user::Model> {
        let name = validation::required("name", name)?;
        let existing = self
            .find_profile(id)
            .await?
            .ok_or_else(|| Error::not_found("User", id))?;

        let mut active: user::ActiveModel = existing.into();
        active.name = Set(name);
        active.updated_at = Set(chrono::Utc::now());
        active.update(self).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use std::sync::Arc;

    fn new_profile(id: &str) -> NewProfile {
        NewProfile {
            id: id.to_string(),
            name: "Ana".to_string(),
            email: "ana@acme.io".to_string(),
            role: UserRole::User,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_profile() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(db.find_profile("uid-ana").await?.is_none());
        let created = db.create_profile(new_profile("uid-ana")).await?;
        assert_eq!(created.role, UserRole::User);

        let found = db.find_profile("uid-ana").await?;
        assert_eq!(found, Some(created));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_profile_name() -> Result<()> {
        let db = setup_test_db().await?;
        let created = db.create_profile(new_profile("uid-ana")).await?;

        let renamed = db.update_profile_name("uid-ana", "  Ana María ").await?;
        assert_eq!(renamed.name, "Ana María");
        assert!(renamed.updated_at >= created.updated_at);

        let blank = db.update_profile_name("uid-ana", " ").await;
        assert!(matches!(blank, Err(Error::Validation { .. })));

        let missing = db.update_profile_name("nobody", "Bob").await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_shared_connection_serves_profiles_and_queries() -> Result<()> {
        let db = Arc::new(setup_test_db().await?);
        let profiles: Arc<dyn ProfileStore> = db.clone();

        let created = profiles.create_profile(new_profile("uid-ana")).await?;
        assert_eq!(get_test_user(&db, "uid-ana").await?, created);

        let client = create_custom_client(&db, "uid-ana", "Globex").await?;
        assert_eq!(client.user_id, "uid-ana");
        assert_eq!(profiles.find_profile("uid-ana").await?, Some(created));

        Ok(())
    }
}
