mod account;
mod auth;
mod identity;
mod input;
mod seed;
mod session;
mod sqlite;
mod store;
mod terminal;
mod transaction;

pub(crate) use self::{
    input::RetryPolicy,
    seed::{seed_administrators, seed_customers},
    session::{Session, Termination},
    sqlite::SqliteStore,
    store::{MemoryStore, RecordStore},
    terminal::ConsoleTerminal,
};
