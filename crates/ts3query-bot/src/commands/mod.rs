//! `ts3bot` subcommand implementations.

pub mod config;
pub mod query;
pub mod run;
