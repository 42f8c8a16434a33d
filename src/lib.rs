pub mod analyzers;
pub mod config;
pub mod fetch;
pub mod filter;
pub mod ingest;
pub mod output;
pub mod records;
pub mod schema;
