//! Command-line front end: load a URL list, select entries, download them
//! into images.zip.
mod app;
mod cli;
mod effects;
mod render;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use zipper_logging::{zipper_error, DEFAULT_LOG_FILE};

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    zipper_logging::initialize(cli.log.into(), cli.log_level(), Path::new(DEFAULT_LOG_FILE));

    match app::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            zipper_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
