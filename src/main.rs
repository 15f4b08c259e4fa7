use breakwind::cli::CliArgs;
use breakwind::util::{init_logging, parse_level, LoggingConfig};
use breakwind::{Pipeline, PipelineOptions, VERSION};

use clap::Parser;
use std::env;
use tracing::{debug, error, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("breakwind v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let pipeline = Pipeline::new(PipelineOptions {
        config_path: args.config.clone(),
        output_path: args.output.clone(),
        post_command: args.post_command.clone(),
    });

    let exit_code = if args.watch {
        match pipeline.watch().await {
            Ok(()) => 0,
            Err(err) => {
                error!(error = %err, "Watcher could not be started");
                1
            }
        }
    } else {
        match pipeline.run_once().await {
            Ok(_) => 0,
            Err(err) => {
                error!(error = %err, "Generation failed");
                1
            }
        }
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("BREAKWIND_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    };

    let use_json = env::var("BREAKWIND_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level,
        use_json,
        ..Default::default()
    });
}
