//! wxramp CLI entrypoint.
//!
//! Thin wrapper over the `cli` module: parse args, run the batch, and exit
//! non-zero when configuration fails or any file in the batch fails.
//! For programmatic use, prefer the library API (`wxramp::api`).

use clap::Parser;

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::CliArgs::parse();
    cli::run(args)?;
    Ok(())
}
