use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError};
use log::{debug, error};

use crate::config::DatabaseConf;

pub type DatabasePool = Pool<ConnectionManager<SqliteConnection>>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        office TEXT NOT NULL,
        designation TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS attendance (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        timestamp DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        status TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id)
    );
    CREATE INDEX IF NOT EXISTS attendance_user_timestamp
        ON attendance (user_id, timestamp);
";

/// Applied to every connection the pool hands out. Foreign keys stay off so
/// attendance for an unregistered id is still accepted.
#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        let pragmas = format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = OFF;",
            BUSY_TIMEOUT.as_millis()
        );
        conn.batch_execute(&pragmas)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn create_pool(conf: &DatabaseConf) -> Result<DatabasePool, PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(&conf.url);

    match Pool::builder()
        .max_size(conf.pool_size)
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
    {
        Ok(pool) => {
            debug!("Connected to database {}", conf.url);
            Ok(pool)
        }
        Err(error) => {
            error!("Could not connect to database {}: {}", conf.url, error);
            Err(error)
        }
    }
}

pub fn init_schema(conn: &mut SqliteConnection) -> QueryResult<()> {
    conn.batch_execute(SCHEMA)
}
