mod cli;

use clap::Parser;
use storage_fs::Config;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Bootstrap => cli::commands::bootstrap(&config),
        Commands::Clean => cli::commands::clean(&config),
        Commands::Reset => cli::commands::reset(config),
        Commands::Reindex => cli::commands::reindex(config),
        Commands::Load { iri } => cli::commands::load(config, &iri),
        Commands::Save { input } => cli::commands::save(config, &input),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.config {
        Some(path) => Ok(Config::load_from(path, cli.path.clone())?),
        None => Ok(Config::for_path(cli.path.clone())),
    }
}
