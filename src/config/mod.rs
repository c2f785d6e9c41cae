//! Configuration module for CrawlerView
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; an empty file yields the built-in defaults.
//!
//! # Example
//!
//! ```no_run
//! use crawlerview::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawlerview.toml")).unwrap();
//! println!("Retries per identity: {}", config.fetch.max_retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, IdentityEntry, RobotsConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
