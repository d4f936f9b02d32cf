use clap::Parser;
use dbm_ticket_flow::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    cli.run()
}
