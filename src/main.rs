use clap::Parser;
use sievetrader::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
