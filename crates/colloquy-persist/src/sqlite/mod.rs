mod client;
pub mod migrations;

pub use client::SqlitePersistenceClient;
