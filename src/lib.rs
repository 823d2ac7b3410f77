pub mod constants;
pub mod db;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod models;
pub mod native_host;
pub mod scheduler;
pub mod service;
pub mod settings_store;
#[cfg(test)]
mod test_utils;
pub mod tracker;
pub mod validation;

use crate::db::{migrations, Database};
use crate::error::AppError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Location of the settings database, creating the data directory if needed.
pub fn get_db_path() -> Result<PathBuf, AppError> {
    let proj_dirs =
        ProjectDirs::from("com", "tabsweep", "Tabsweep").ok_or(AppError::NoProjectDirs)?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;
    Ok(data_dir.join("tabsweep.db"))
}

/// Open the database at `path` and bring its schema up to date.
pub fn open_database(path: &Path) -> Result<Database, AppError> {
    let db = Database::open(path)?;
    migrations::run(db.connection())?;
    Ok(db)
}
