mod cli;
mod db;
mod error;
mod fmt;
mod generator;
mod models;
mod reports;
mod settings;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let db = cli.db.as_deref();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(db, data_dir),
        Commands::Generate {
            entries,
            from_date,
            to_date,
            seed,
        } => cli::generate::run(db, entries, from_date, to_date, seed),
        Commands::Report { name, format } => cli::report::run(db, name, format),
        Commands::Records {
            cashback_only,
            format,
        } => cli::records::run(db, cashback_only, format),
        Commands::Status => cli::status::run(db),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
