use std::fs::File;
use std::str::FromStr;

use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode, WriteLogger};
use thiserror::Error;

use crate::config::LogConf;

#[derive(Error, Debug)]
pub enum LogSetupError {
    #[error("Unknown log level: {0}")]
    UnknownLevel(String),

    #[error("Log file could not be created: {0}")]
    File(#[from] std::io::Error),

    #[error("Logger already initialised: {0}")]
    AlreadySet(#[from] log::SetLoggerError),
}

pub fn setup(conf: &LogConf) -> Result<(), LogSetupError> {
    let level = LevelFilter::from_str(&conf.level)
        .map_err(|_| LogSetupError::UnknownLevel(conf.level.clone()))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            level,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(
            level,
            Config::default(),
            File::create(&conf.file)?,
        ),
    ])?;

    Ok(())
}
