//! App Packager - builds application images and installers.

use app_packager::cli::{self, Args, OutputManager};
use std::process;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli::run(args).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            OutputManager::new(false).error(&format!("Fatal error: {e}"));
            process::exit(1);
        }
    }
}
