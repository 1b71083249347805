//! Entry point; delegates to `interfaces::cli`.

use std::process::ExitCode;

use matching_engine::interfaces::cli;

#[tokio::main]
async fn main() -> ExitCode {
    cli::run().await
}
