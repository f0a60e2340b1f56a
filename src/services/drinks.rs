//! Drink catalog service
//!
//! Lifecycle of the drink catalog: create, edit, favorite, reorder, and the
//! cascading delete. Every operation re-reads current state before writing;
//! nothing here trusts a cached copy from the rendering surface.

use crate::changes::{ChangeBus, StoreChange};
use crate::database::{Drink, DrinkInput, Repository};
use crate::error::{AppError, Result};
use chrono::Utc;
use uuid::Uuid;

/// Service for managing the drink catalog
#[derive(Clone)]
pub struct DrinksService {
    repo: Repository,
    changes: ChangeBus,
}

impl DrinksService {
    pub fn new(repo: Repository, changes: ChangeBus) -> Self {
        Self { repo, changes }
    }

    /// All drinks in display order.
    pub async fn list(&self) -> Result<Vec<Drink>> {
        self.repo.list_drinks().await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Drink>> {
        self.repo.get_drink(id).await
    }

    /// Create a drink. It joins the end of the display order.
    pub async fn create(&self, input: DrinkInput) -> Result<Drink> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Drink name cannot be empty".to_string()));
        }

        let drink = Drink {
            id: format!("drink-{}", Uuid::new_v4()),
            name,
            emoji: input.emoji,
            category: input.category,
            default_ml: input.default_ml,
            abv: input.abv,
            favorite: input.favorite,
            sort_order: self.repo.count_drinks().await?,
            created_at: Utc::now(),
        };

        self.repo.insert_drink(&drink).await?;
        self.changes.publish(StoreChange::Drinks);

        tracing::info!("Created drink {} ({})", drink.name, drink.id);
        Ok(drink)
    }

    /// Edit a drink. Identity, position, and creation time are preserved;
    /// all other fields are replaced.
    pub async fn update(&self, id: &str, input: DrinkInput) -> Result<Drink> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Drink name cannot be empty".to_string()));
        }

        let existing = self
            .repo
            .get_drink(id)
            .await?
            .ok_or_else(|| AppError::DrinkNotFound(id.to_string()))?;

        let drink = Drink {
            name,
            emoji: input.emoji,
            category: input.category,
            default_ml: input.default_ml,
            abv: input.abv,
            favorite: input.favorite,
            ..existing
        };

        self.repo.update_drink(&drink).await?;
        self.changes.publish(StoreChange::Drinks);

        tracing::info!("Updated drink {}", drink.id);
        Ok(drink)
    }

    pub async fn toggle_favorite(&self, id: &str) -> Result<Drink> {
        let mut drink = self
            .repo
            .get_drink(id)
            .await?
            .ok_or_else(|| AppError::DrinkNotFound(id.to_string()))?;

        drink.favorite = !drink.favorite;
        self.repo.update_drink(&drink).await?;
        self.changes.publish(StoreChange::Drinks);

        Ok(drink)
    }

    /// Delete a drink, cascading to its events. Refused for the sole
    /// remaining drink. When the deleted drink was the default, the
    /// lowest-sort-order survivor takes over, inside the same transaction
    /// as the deletes.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if self.repo.count_drinks().await? <= 1 {
            return Err(AppError::Precondition(
                "At least one drink must exist".to_string(),
            ));
        }

        if self.repo.get_drink(id).await?.is_none() {
            return Err(AppError::DrinkNotFound(id.to_string()));
        }

        let was_default = match self.repo.get_settings().await? {
            Some(settings) => settings.default_drink_id == id,
            None => false,
        };

        let reassign_to = if was_default {
            // list_drinks is sort-order ascending; the first survivor wins.
            self.repo
                .list_drinks()
                .await?
                .into_iter()
                .find(|d| d.id != id)
                .map(|d| d.id)
        } else {
            None
        };

        self.repo
            .delete_drink_cascade(id, reassign_to.as_deref())
            .await?;

        self.changes.publish(StoreChange::Drinks);
        self.changes.publish(StoreChange::Events);
        if reassign_to.is_some() {
            self.changes.publish(StoreChange::Settings);
        }

        tracing::info!("Deleted drink {}", id);
        Ok(())
    }

    /// Move the dragged drink to the target's position: remove it from the
    /// ordered list and reinsert it where the target originally sat, then
    /// persist dense 0..N-1 sort orders in one write. Unknown ids are a
    /// silent no-op, matching the drag interaction this backs.
    pub async fn reorder(&self, dragged_id: &str, target_id: &str) -> Result<()> {
        let ordered = self.repo.list_drinks().await?;

        let from_index = ordered.iter().position(|d| d.id == dragged_id);
        let to_index = ordered.iter().position(|d| d.id == target_id);
        let (Some(from_index), Some(to_index)) = (from_index, to_index) else {
            return Ok(());
        };

        let mut ids: Vec<String> = ordered.into_iter().map(|d| d.id).collect();
        let moved = ids.remove(from_index);
        ids.insert(to_index, moved);

        self.repo.set_sort_orders(&ids).await?;
        self.changes.publish(StoreChange::Drinks);

        Ok(())
    }
}
