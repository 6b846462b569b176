//! Runs the moving-bar demo.
//!
//! Configuration is read from `$TRIFLIP_CONFIG` or the user config
//! directory; see `triflip_core::config`.

use std::process::ExitCode;

use tracing::{error, info};
use triflip_core::{init_logging, init_minimal_logging, ConfigLoader};

fn main() -> ExitCode {
    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(e) => {
            init_minimal_logging();
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging, false) {
        init_minimal_logging();
        error!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match triflip_demo::run(&config) {
        Ok(stats) => {
            info!(
                frames_submitted = stats.frames_submitted,
                flips_completed = stats.flips_completed,
                page_waits = stats.page_waits,
                "Demo finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Demo failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
