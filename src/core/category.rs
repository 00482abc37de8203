//! Transaction category business logic.
//!
//! Category names are unique per owner, compared trimmed and case-insensitively.
//! Transactions store the category as text, so renaming or deleting a category
//! leaves existing transactions untouched.

use crate::{
    config::settings::CategoryConfig,
    core::validation,
    entities::{CategoryType, TransactionCategory, TransactionType, transaction_category},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Lists the owner's categories alphabetically.
pub async fn list_categories(
    db: &DatabaseConnection,
    owner_id: &str,
) -> Result<Vec<transaction_category::Model>> {
    TransactionCategory::find()
        .filter(transaction_category::Column::UserId.eq(owner_id))
        .order_by_asc(transaction_category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Categories offered in the form for a given transaction type.
pub async fn categories_for_type(
    db: &DatabaseConnection,
    owner_id: &str,
    transaction_type: TransactionType,
) -> Result<Vec<transaction_category::Model>> {
    let all = list_categories(db, owner_id).await?;
    Ok(all
        .into_iter()
        .filter(|c| c.category_type.applies_to(transaction_type))
        .collect())
}

/// Finds a category by name, ignoring case and surrounding whitespace.
pub async fn find_category_by_name(
    db: &DatabaseConnection,
    owner_id: &str,
    name: &str,
) -> Result<Option<transaction_category::Model>> {
    let wanted = name.trim().to_lowercase();
    let all = list_categories(db, owner_id).await?;
    Ok(all
        .into_iter()
        .find(|c| c.name.to_lowercase() == wanted))
}

async fn ensure_unique(
    db: &DatabaseConnection,
    owner_id: &str,
    name: &str,
    except_id: Option<i64>,
) -> Result<()> {
    if let Some(existing) = find_category_by_name(db, owner_id, name).await? {
        if Some(existing.id) != except_id {
            return Err(Error::validation("name", "a category with this name already exists"));
        }
    }
    Ok(())
}

/// Creates a category, rejecting blank or duplicate names.
pub async fn create_category(
    db: &DatabaseConnection,
    owner_id: &str,
    name: &str,
    category_type: CategoryType,
) -> Result<transaction_category::Model> {
    let name = validation::required("name", name)?;
    ensure_unique(db, owner_id, &name, None).await?;

    let model = transaction_category::ActiveModel {
        user_id: Set(owner_id.to_string()),
        name: Set(name),
        category_type: Set(category_type),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Renames a category or changes its type.
pub async fn update_category(
    db: &DatabaseConnection,
    owner_id: &str,
    category_id: i64,
    name: &str,
    category_type: CategoryType,
) -> Result<transaction_category::Model> {
    let name = validation::required("name", name)?;
    let existing = TransactionCategory::find_by_id(category_id)
        .filter(transaction_category::Column::UserId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("TransactionCategory", category_id))?;
    ensure_unique(db, owner_id, &name, Some(category_id)).await?;

    let mut active: transaction_category::ActiveModel = existing.into();
    active.name = Set(name);
    active.category_type = Set(category_type);
    active.update(db).await.map_err(Into::into)
}

/// Deletes a category.
pub async fn delete_category(
    db: &DatabaseConnection,
    owner_id: &str,
    category_id: i64,
) -> Result<()> {
    let result = TransactionCategory::delete_many()
        .filter(transaction_category::Column::Id.eq(category_id))
        .filter(transaction_category::Column::UserId.eq(owner_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("TransactionCategory", category_id));
    }
    Ok(())
}

/// Inserts the configured default categories the owner does not have yet.
///
/// Returns how many categories were added.
pub async fn seed_default_categories(
    db: &DatabaseConnection,
    owner_id: &str,
    defaults: &[CategoryConfig],
) -> Result<usize> {
    let mut added = 0;
    for default in defaults {
        if find_category_by_name(db, owner_id, &default.name)
            .await?
            .is_some()
        {
            continue;
        }
        create_category(db, owner_id, &default.name, default.category_type).await?;
        added += 1;
    }

    if added > 0 {
        info!("Seeded {added} default categories for user {owner_id}");
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::default_categories;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_category_unique_per_owner() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "someone_else").await?;

        create_category(&db, TEST_OWNER, "Hosting", CategoryType::Expense).await?;
        let duplicate = create_category(&db, TEST_OWNER, "  hosting ", CategoryType::Both).await;
        assert!(matches!(duplicate, Err(Error::Validation { field, .. }) if field == "name"));

        // Another owner may reuse the name
        create_category(&db, "someone_else", "Hosting", CategoryType::Expense).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_category_names_match_across_unicode_case() -> Result<()> {
        let db = setup_test_db().await?;
        create_category(&db, TEST_OWNER, "Ópera", CategoryType::Expense).await?;

        let found = find_category_by_name(&db, TEST_OWNER, " ópera ").await?;
        assert_eq!(found.map(|c| c.name), Some("Ópera".to_string()));

        let duplicate = create_category(&db, TEST_OWNER, "ÓPERA", CategoryType::Income).await;
        assert!(matches!(duplicate, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_category_blank_name() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_category(&db, TEST_OWNER, "   ", CategoryType::Both).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_categories_for_type() -> Result<()> {
        let db = setup_test_db().await?;
        create_category(&db, TEST_OWNER, "Retainer", CategoryType::Income).await?;
        create_category(&db, TEST_OWNER, "Hosting", CategoryType::Expense).await?;
        create_category(&db, TEST_OWNER, "Other", CategoryType::Both).await?;

        let income: Vec<String> = categories_for_type(&db, TEST_OWNER, TransactionType::Income)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(income, vec!["Other", "Retainer"]);

        let expense: Vec<String> = categories_for_type(&db, TEST_OWNER, TransactionType::Expense)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(expense, vec!["Hosting", "Other"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_category_keeps_own_name() -> Result<()> {
        let db = setup_test_db().await?;
        let hosting = create_category(&db, TEST_OWNER, "Hosting", CategoryType::Expense).await?;
        create_category(&db, TEST_OWNER, "Software", CategoryType::Expense).await?;

        let retyped =
            update_category(&db, TEST_OWNER, hosting.id, "Hosting", CategoryType::Both).await?;
        assert_eq!(retyped.category_type, CategoryType::Both);

        let clash =
            update_category(&db, TEST_OWNER, hosting.id, "software", CategoryType::Both).await;
        assert!(matches!(clash, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_category() -> Result<()> {
        let db = setup_test_db().await?;
        let hosting = create_category(&db, TEST_OWNER, "Hosting", CategoryType::Expense).await?;

        delete_category(&db, TEST_OWNER, hosting.id).await?;
        assert!(list_categories(&db, TEST_OWNER).await?.is_empty());

        let again = delete_category(&db, TEST_OWNER, hosting.id).await;
        assert!(matches!(again, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_default_categories_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let defaults = default_categories();
        create_category(&db, TEST_OWNER, "services", CategoryType::Income).await?;

        let added = seed_default_categories(&db, TEST_OWNER, &defaults).await?;
        assert_eq!(added, defaults.len() - 1);

        let added_again = seed_default_categories(&db, TEST_OWNER, &defaults).await?;
        assert_eq!(added_again, 0);
        assert_eq!(list_categories(&db, TEST_OWNER).await?.len(), defaults.len());

        Ok(())
    }
}
