pub mod toml_config;

use crate::core::output::OutputFormat;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::path::PathBuf;

pub use toml_config::AppConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "cep-race")]
#[command(about = "Query several CEP lookup services at once and print the first answer")]
pub struct CliConfig {
    /// CEP to look up, e.g. 01001000 or 01001-000
    pub cep: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Overall race deadline in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Per-source request timeout in milliseconds
    #[arg(long)]
    pub source_timeout_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit log lines as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// 載入檔案配置（若有），套用命令列覆蓋後再驗證
    pub fn load_app_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                AppConfig::from_file(path)?
            }
            None => AppConfig::default(),
        };

        if let Some(timeout_ms) = self.timeout_ms {
            config.race.timeout_ms = timeout_ms;
        }
        if let Some(source_timeout_ms) = self.source_timeout_ms {
            config.race.source_timeout_ms = source_timeout_ms;
        }

        config.validate()?;
        Ok(config)
    }
}
