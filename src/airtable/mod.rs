// flowsync/src/airtable/mod.rs
mod client;
pub(crate) mod models;

pub use client::AirtableClient;
