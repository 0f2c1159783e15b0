mod categories;
mod items;

pub use categories::CategoryCollection;
pub use items::ItemCollection;

use crate::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// One SQLite file holding a single collection. The connection mutex serializes
/// writers, so every single-document write is atomic.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl Database {
    pub fn open(path: &Path, schema_sql: &str) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(schema_sql).map_err(AppError::from)?;

        tracing::debug!(path = %path.display(), "opened collection store");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))
    }
}

fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
