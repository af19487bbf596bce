use clap::{Parser, Subcommand};
use gap::experiment::Sweep;
use gap::generate::Generate;
use gap::resolution::Solve;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct GapTools {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Generate(Generate),
    Solve(Solve),
    Sweep(Sweep),
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    enable_tracing();
    let cli = GapTools::parse();
    match cli.command {
        Command::Generate(generate) => generate.generate(),
        Command::Solve(solve) => solve.solve(),
        Command::Sweep(sweep) => sweep.sweep(),
    }
}
