use crate::features::RetryPolicy;
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Single-terminal banking console
#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub(crate) struct Config {
    /// SQLite database holding the customer and administrator tables
    #[clap(long, env = "ATM_DATABASE", default_value = "atm.db")]
    pub(crate) database: PathBuf,

    /// Keep the tables in memory instead of opening the database
    #[clap(long)]
    pub(crate) in_memory: bool,

    /// CSV file of customers (login,pin_code,holder_name,balance) loaded at startup
    #[clap(long, value_name = "CSV")]
    pub(crate) seed_customers: Option<PathBuf>,

    /// CSV file of administrators (login,pin_code) loaded at startup
    #[clap(long, value_name = "CSV")]
    pub(crate) seed_administrators: Option<PathBuf>,

    /// Invalid answers tolerated per prompt before the session ends (default: unlimited)
    #[clap(long, env = "ATM_MAX_INPUT_ATTEMPTS", value_name = "N")]
    pub(crate) max_input_attempts: Option<NonZeroUsize>,
}

impl Config {
    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        match self.max_input_attempts {
            Some(max_attempts) => RetryPolicy::bounded(max_attempts),
            None => RetryPolicy::unbounded(),
        }
    }
}
