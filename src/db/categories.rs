use super::{new_document_id, Database};
use crate::errors::AppResult;
use crate::models::{Category, CategoryQuery};
use rusqlite::params;
use std::path::Path;

const SCHEMA_SQL: &str = include_str!("categories.sql");

/// Category names are unique; the store rejects a duplicate insert.
#[derive(Debug)]
pub struct CategoryCollection {
    db: Database,
}

impl CategoryCollection {
    pub fn open(path: &Path) -> AppResult<Self> {
        Ok(Self {
            db: Database::open(path, SCHEMA_SQL)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.db.path()
    }

    pub fn find(&self, query: &CategoryQuery) -> AppResult<Vec<Category>> {
        let conn = self.db.conn()?;
        let mut sql = String::from("SELECT id, category FROM categories WHERE 1 = 1");
        let mut params_vec: Vec<String> = Vec::new();

        if let Some(category) = &query.category {
            sql.push_str(" AND category = ?");
            params_vec.push(category.clone());
        }
        sql.push_str(" ORDER BY rowid ASC");

        let mut statement = conn.prepare(&sql)?;
        let rows = statement.query_map(rusqlite::params_from_iter(params_vec.iter()), |row| {
            Ok(Category {
                id: row.get(0)?,
                category: row.get(1)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn insert(&self, name: &str) -> AppResult<Category> {
        let id = new_document_id();
        let conn = self.db.conn()?;
        conn.execute(
            "INSERT INTO categories (id, category) VALUES (?1, ?2)",
            params![id, name],
        )?;

        Ok(Category {
            id,
            category: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::CategoryCollection;
    use crate::models::CategoryQuery;

    #[test]
    fn duplicate_category_name_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let categories = CategoryCollection::open(&dir.path().join("categories.db")).expect("categories");

        categories.insert("Tools").expect("first insert");
        let error = categories.insert("Tools").expect_err("duplicate insert must fail");
        assert!(error.is_unique_violation(), "unexpected error: {error}");

        let tools = categories
            .find(&CategoryQuery {
                category: Some("Tools".to_string()),
            })
            .expect("find");
        assert_eq!(tools.len(), 1);
    }

    #[test]
    fn find_lists_every_category_in_insertion_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let categories = CategoryCollection::open(&dir.path().join("categories.db")).expect("categories");
        categories.insert("Tools").expect("insert");
        categories.insert("Toys").expect("insert");

        let names: Vec<String> = categories
            .find(&CategoryQuery::default())
            .expect("find")
            .into_iter()
            .map(|category| category.category)
            .collect();
        assert_eq!(names, vec!["Tools".to_string(), "Toys".to_string()]);
    }
}
