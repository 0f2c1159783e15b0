use crate::config::ServerConfig;
use crate::db::{CategoryCollection, ItemCollection};
use crate::errors::{AppError, AppResult};
use crate::models::{Category, CategoryQuery, Item, ItemQuery};
use crate::validation::ValidatedItem;
use std::path::Path;

/// Result of a write against one of the collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Created(T),
    Updated,
    Deleted,
    NotFound,
    StoreFailure(String),
}

impl<T> Outcome<T> {
    fn from_store_error(action: &str, error: AppError) -> Self {
        tracing::error!(error = %error, action, "store operation failed");
        Self::StoreFailure(error.to_string())
    }
}

#[derive(Debug)]
pub struct InventoryService {
    items: ItemCollection,
    categories: CategoryCollection,
}

impl InventoryService {
    pub fn new(items_path: &Path, categories_path: &Path) -> AppResult<Self> {
        let items = ItemCollection::open(items_path)?;
        let categories = CategoryCollection::open(categories_path)?;
        tracing::info!(
            items = %items.path().display(),
            categories = %categories.path().display(),
            "inventory collections loaded"
        );
        Ok(Self { items, categories })
    }

    pub fn from_config(config: &ServerConfig) -> AppResult<Self> {
        Self::new(&config.items_db_path, &config.categories_db_path)
    }

    pub fn list_items(&self) -> AppResult<Vec<Item>> {
        self.items.find(&ItemQuery::default()).map_err(|error| {
            tracing::error!(error = %error, "failed to list items");
            error
        })
    }

    pub fn create_item(&self, item: ValidatedItem) -> Outcome<Item> {
        match self.items.insert(item.payload()) {
            Ok(created) => {
                tracing::info!(item_id = %created.id, name = %created.name, "item created");
                Outcome::Created(created)
            }
            Err(error) => Outcome::from_store_error("create_item", error),
        }
    }

    /// Replaces the whole record; partial updates are not supported.
    pub fn update_item(&self, id: &str, item: ValidatedItem) -> Outcome<Item> {
        match self.items.update(id, item.payload()) {
            Ok(0) => {
                tracing::warn!(item_id = %id, "update target not found");
                Outcome::NotFound
            }
            Ok(_) => {
                tracing::info!(item_id = %id, "item updated");
                Outcome::Updated
            }
            Err(error) => Outcome::from_store_error("update_item", error),
        }
    }

    pub fn delete_item(&self, id: &str) -> Outcome<Item> {
        match self.items.delete(id) {
            Ok(0) => {
                tracing::warn!(item_id = %id, "delete target not found");
                Outcome::NotFound
            }
            Ok(_) => {
                tracing::info!(item_id = %id, "item deleted");
                Outcome::Deleted
            }
            Err(error) => Outcome::from_store_error("delete_item", error),
        }
    }

    pub fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.categories.find(&CategoryQuery::default()).map_err(|error| {
            tracing::error!(error = %error, "failed to list categories");
            error
        })
    }

    pub fn create_category(&self, name: &str) -> Outcome<Category> {
        match self.categories.insert(name) {
            Ok(created) => {
                tracing::info!(category_id = %created.id, category = %created.category, "category created");
                Outcome::Created(created)
            }
            Err(error) => {
                if error.is_unique_violation() {
                    tracing::warn!(category = %name, "duplicate category rejected");
                }
                Outcome::from_store_error("create_category", error)
            }
        }
    }
}
