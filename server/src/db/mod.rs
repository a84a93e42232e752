pub mod migrations;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

const DB_FILE: &str = "entrega.db";

/// Shared handle to the single SQLite connection.
///
/// rusqlite is synchronous, so every query path locks the mutex inside
/// `tokio::task::spawn_blocking`. Holding the lock across an await point
/// is not possible with this shape, which is the point.
pub type DbPool = Arc<Mutex<Connection>>;

/// Open the marketplace database under `data_dir`, creating the file on
/// first run, and bring the schema up to date.
///
/// WAL journaling and foreign key enforcement are set per connection;
/// snapshot reads and status transitions both assume them.
pub fn init_db(data_dir: &str) -> Result<DbPool, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = Path::new(data_dir).join(DB_FILE);

    let mut conn = Connection::open(&db_path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    migrations::migrations().to_latest(&mut conn)?;
    tracing::info!(path = %db_path.display(), "Database ready");

    Ok(Arc::new(Mutex::new(conn)))
}
