//! # codemart
//!
//! Command line storefront client.
//!
//! ```text
//! codemart products --search steam
//! codemart quote steam-wallet 25 --add
//! codemart checkout --first-name Ada --last-name Lovelace --email ada@example.com
//! ```
//!
//! Output goes to stdout, logs to stderr (`RUST_LOG` controls verbosity).

use clap::Parser;
use std::process::ExitCode;

use codemart_cli::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    codemart_cli::init_tracing();
    let cli = Cli::parse();

    match codemart_cli::run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error[{}]: {}", err.code.as_str(), err.message);
            ExitCode::from(err.code.exit_code())
        }
    }
}
