//! Scene Annotator command-line entry point.

use std::process::ExitCode;

use clap::Parser;
use scene_annotator::cli::Opts;

fn main() -> ExitCode {
    let opts = Opts::parse();

    let config = match opts.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = if opts.verbose {
        log::LevelFilter::Debug
    } else {
        config.preferences.log_level.to_level_filter()
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = opts.run(&config) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
