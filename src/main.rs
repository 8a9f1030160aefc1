mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    keyphrase::logging::init(cli.verbose);

    match cli.command {
        Commands::Run(args) => commands::run::run_scenarios(args)?,
        Commands::List => commands::list::run_list()?,
        Commands::Keygen(args) => commands::keygen::run_keygen(args)?,
    }

    Ok(())
}
