pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod report;
pub mod rules;
pub mod tracker;
