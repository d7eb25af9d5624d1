pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{AppConfig, CliConfig};
pub use crate::core::{engine::LookupEngine, race::RaceCoordinator, race::RaceSettings};
pub use utils::error::{CepError, Result};
