use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use diesel::r2d2::PoolError;
use log::info;
use thiserror::Error;

use crate::api::{self, AppState};
use crate::common::db::{create_pool, init_schema, DatabasePool};
use crate::config::{Config, DatabaseConf};
use crate::hardware::camera::CommandCamera;
use crate::hardware::scanner::Scanner;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Database schema could not be created: {0}")]
    Schema(#[from] diesel::result::Error),
}

/// Opens the pool and makes sure both tables exist.
fn prepare_database(conf: &DatabaseConf) -> Result<DatabasePool, LaunchError> {
    let db_pool = create_pool(conf)?;
    let mut conn = db_pool.get()?;
    init_schema(&mut *conn)?;
    drop(conn);
    Ok(db_pool)
}

pub fn launch(conf: &Config) -> Result<(), LaunchError> {
    // Print welcome message
    info!("Starting App in {}", conf.app.environment);

    let db_pool = prepare_database(&conf.database)?;

    let qr_dir = PathBuf::from(&conf.qr.directory);
    fs::create_dir_all(&qr_dir)?;

    let camera = Arc::new(CommandCamera::new(conf.camera.clone()));
    let scanner = Arc::new(Scanner::new(camera, conf.camera.poll_interval()));

    let state = Arc::new(AppState {
        db_pool,
        scanner,
        qr_dir,
        qr_url_prefix: conf.qr.mount_path().to_string(),
    });

    // Build a multi-threaded Tokio runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("attendance-worker")
        .enable_all()
        .build()?;

    runtime.block_on(api::init(&conf.server, state))?;

    info!("Server stopped");
    Ok(())
}
