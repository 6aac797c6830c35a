use clap::Parser;
use rudder::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
