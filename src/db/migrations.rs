use super::schema::SCHEMA;
use crate::error::AppError;
use crate::models::Settings;
use rusqlite::Connection;

pub fn run(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch(SCHEMA)?;
    seed_default_settings(conn)?;
    Ok(())
}

fn seed_default_settings(conn: &Connection) -> Result<(), AppError> {
    let count: i32 = conn.query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))?;

    if count == 0 {
        Settings::default().save(conn)?;
    }
    Ok(())
}
