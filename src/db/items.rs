use super::{new_document_id, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Item, ItemPayload, ItemQuery};
use rusqlite::params;
use std::path::Path;

const SCHEMA_SQL: &str = include_str!("items.sql");

#[derive(Debug)]
pub struct ItemCollection {
    db: Database,
}

impl ItemCollection {
    pub fn open(path: &Path) -> AppResult<Self> {
        Ok(Self {
            db: Database::open(path, SCHEMA_SQL)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.db.path()
    }

    pub fn find(&self, query: &ItemQuery) -> AppResult<Vec<Item>> {
        let conn = self.db.conn()?;
        let mut sql = String::from("SELECT id, name, quantity, category FROM items WHERE 1 = 1");
        let mut params_vec: Vec<String> = Vec::new();

        if let Some(name) = &query.name {
            sql.push_str(" AND name = ?");
            params_vec.push(name.clone());
        }
        if let Some(category) = &query.category {
            sql.push_str(" AND category = ?");
            params_vec.push(category.clone());
        }
        sql.push_str(" ORDER BY rowid ASC");

        let mut statement = conn.prepare(&sql)?;
        let rows = statement.query_map(rusqlite::params_from_iter(params_vec.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (id, name, quantity, category) = row?;
            let quantity = u64::try_from(quantity)
                .map_err(|_| AppError::Store(format!("item {id} has a negative quantity")))?;
            result.push(Item {
                id,
                name,
                quantity,
                category,
            });
        }
        Ok(result)
    }

    pub fn insert(&self, payload: &ItemPayload) -> AppResult<Item> {
        let id = new_document_id();
        let quantity = to_sql_quantity(payload.quantity)?;

        let conn = self.db.conn()?;
        conn.execute(
            "INSERT INTO items (id, name, quantity, category) VALUES (?1, ?2, ?3, ?4)",
            params![id, payload.name, quantity, payload.category],
        )?;

        Ok(Item {
            id,
            name: payload.name.clone(),
            quantity: payload.quantity,
            category: payload.category.clone(),
        })
    }

    /// Replaces all fields of the item. Returns the number of matched records.
    pub fn update(&self, id: &str, payload: &ItemPayload) -> AppResult<usize> {
        let quantity = to_sql_quantity(payload.quantity)?;
        let conn = self.db.conn()?;
        let matched = conn.execute(
            "UPDATE items SET name = ?1, quantity = ?2, category = ?3 WHERE id = ?4",
            params![payload.name, quantity, payload.category, id],
        )?;
        Ok(matched)
    }

    pub fn delete(&self, id: &str) -> AppResult<usize> {
        let conn = self.db.conn()?;
        let removed = conn.execute("DELETE FROM items WHERE id = ?1", [id])?;
        Ok(removed)
    }
}

fn to_sql_quantity(quantity: u64) -> AppResult<i64> {
    i64::try_from(quantity).map_err(|_| AppError::Store(format!("quantity {quantity} is out of range")))
}
