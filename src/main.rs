use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::process;
#[macro_use]
extern crate log;

mod config;
mod features;
use config::Config;
use features::{
    seed_administrators, seed_customers, ConsoleTerminal, MemoryStore, RecordStore, Session,
    SqliteStore, Termination,
};

fn main() {
    env_logger::init();
    let config = Config::parse();
    match run(&config) {
        Ok(termination) => info!("session ended: {termination:?}"),
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn run(config: &Config) -> anyhow::Result<Termination> {
    if config.in_memory {
        info!("using an in-memory record store");
        start_session(MemoryStore::new(), config)
    } else {
        let store = SqliteStore::open(&config.database)
            .with_context(|| format!("Unable to open {}", config.database.display()))?;
        start_session(store, config)
    }
}

fn start_session<S: RecordStore>(mut store: S, config: &Config) -> anyhow::Result<Termination> {
    if let Some(path) = &config.seed_customers {
        let file = File::open(path).with_context(|| format!("Unable to read {}", path.display()))?;
        let inserted = seed_customers(file, &mut store)
            .with_context(|| format!("Unable to seed customers from {}", path.display()))?;
        info!("seeded {inserted} customers from {}", path.display());
    }

    if let Some(path) = &config.seed_administrators {
        let file = File::open(path).with_context(|| format!("Unable to read {}", path.display()))?;
        let inserted = seed_administrators(file, &mut store)
            .with_context(|| format!("Unable to seed administrators from {}", path.display()))?;
        info!("seeded {inserted} administrators from {}", path.display());
    }

    let session = Session::new(store, ConsoleTerminal::stdio(), config.retry_policy());
    session.run().context("Terminal failure")
}
