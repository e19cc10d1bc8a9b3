use anyhow::Result;
use blogrank::{app, utils, Args};
use clap::Parser;
use tracing::error;

fn main() -> Result<()> {
    let args = Args::parse();
    utils::setup_logging(args.verbose);

    if let Err(e) = utils::validate_args(&args) {
        error!(action = "validate", component = "args", error = %e, "Invalid arguments");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    match app::run(&args) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(action = "fail", component = "blogrank", error = ?e, "Analysis failed");
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
