pub mod client;
pub mod config;
pub mod generate;
pub mod setup;
