pub mod api;
pub mod chart;
pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod logging;
pub mod models;
pub mod pumpfun;
pub mod validation;

pub use error::{Error, Result};

// Declare tests module only when testing
#[cfg(test)]
pub mod tests;
