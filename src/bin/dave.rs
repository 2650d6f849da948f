// src/bin/dave.rs

use colored::*;
use dave::cli::args::{self, CliError};
use dave::cli::handlers;

/// The main entry point of the `dave` application.
/// It sets up logging, parses arguments, runs the selected phases,
/// and performs centralized error handling.
fn main() {
    env_logger::init();

    let options = match args::parse_options(std::env::args_os()) {
        Ok(options) => options,
        Err(e) => {
            if let CliError::Clap(clap_error) = &e {
                // clap renders help, version and usage errors itself.
                let _ = clap_error.print();
                std::process::exit(e.exit_code());
            }
            fail(e.into())
        }
    };
    log::debug!("Options: {:?}", options);

    if let Err(e) = handlers::run::handle(&options) {
        fail(e);
    }
}

fn fail(e: anyhow::Error) -> ! {
    eprintln!("\n{}: {:#}", "Error".red().bold(), e);
    std::process::exit(1);
}
