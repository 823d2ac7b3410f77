// src/db/helpers.rs

use crate::db::Database;
use crate::error::AppError;
use log::warn;
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Lock the database, recovering from poisoning if necessary.
pub fn lock_db<'a>(db: &'a Mutex<Database>, context: &str) -> MutexGuard<'a, Database> {
    match db.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("{context}: database mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Execute a database operation with lock handling and error logging.
///
/// # Example
/// ```ignore
/// with_connection(&db, "load settings", Settings::load)
/// ```
pub fn with_connection<F, T>(db: &Mutex<Database>, operation: &str, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Connection) -> Result<T, AppError>,
{
    let db = lock_db(db, operation);
    f(db.connection()).map_err(|e| {
        log::error!("Failed to {operation}: {e}");
        e
    })
}
