// flowsync/src/webflow/mod.rs
mod client;
mod models;

pub use client::WebflowClient;
