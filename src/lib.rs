pub mod config;
pub mod errors;
pub mod etherscan;
pub mod ingestion;
pub mod intelligence;
pub mod models;
pub mod services;
pub mod sink;
