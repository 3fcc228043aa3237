use clap::Parser;
use rsrank::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
