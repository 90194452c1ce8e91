use std::process::ExitCode;

use config::Config;

mod api;
mod app;
mod common;
mod config;
mod enums;
mod handlers;
mod hardware;
mod log;
mod models;
mod schema;

#[cfg(test)]
mod test_utils;

fn main() -> ExitCode {
    let conf = match Config::from_any() {
        Ok(conf) => conf,
        Err(e) => {
            eprintln!("Could not load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Setup simplelog
    if let Err(e) = log::setup(&conf.log) {
        eprintln!("Could not set up logging: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = app::launch(&conf) {
        ::log::error!("{}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
