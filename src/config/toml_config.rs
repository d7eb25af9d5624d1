use crate::adapters::{build_client, HttpSource};
use crate::core::engine::LookupEngine;
use crate::core::race::{RaceCoordinator, RaceSettings};
use crate::domain::model::{Cep, SourceDefinition, SourceKind};
use crate::domain::ports::AddressSource;
use crate::utils::error::{CepError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub race: RaceConfig,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub source_timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url_template: String,
    pub kind: SourceKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_user_agent() -> String {
    format!("cep-race/{}", env!("CARGO_PKG_VERSION"))
}

fn default_enabled() -> bool {
    true
}

fn default_sources() -> Vec<SourceConfig> {
    [SourceDefinition::api_cep(), SourceDefinition::via_cep()]
        .into_iter()
        .map(SourceConfig::from)
        .collect()
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            source_timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            race: RaceConfig::default(),
            sources: default_sources(),
        }
    }
}

impl From<SourceDefinition> for SourceConfig {
    fn from(definition: SourceDefinition) -> Self {
        Self {
            name: definition.name,
            url_template: definition.url_template,
            kind: definition.kind,
            enabled: true,
        }
    }
}

impl SourceConfig {
    pub fn definition(&self) -> SourceDefinition {
        SourceDefinition::new(self.name.clone(), self.url_template.clone(), self.kind)
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置；`[[sources]]` 一旦出現就完全取代預設來源
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CepError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CEP_SOURCE_HOST})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        Self::substitute_vars(content, |name| std::env::var(name).ok())
    }

    fn substitute_vars<F>(content: &str, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CepError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_positive_number("race.timeout_ms", self.race.timeout_ms, 1)?;
        validation::validate_positive_number(
            "race.source_timeout_ms",
            self.race.source_timeout_ms,
            1,
        )?;
        validation::validate_non_empty_string("race.user_agent", &self.race.user_agent)?;

        if !self.sources.iter().any(|s| s.enabled) {
            return Err(CepError::ConfigError {
                message: "at least one source must be enabled".to_string(),
            });
        }

        validation::validate_unique_names("sources.name", self.sources.iter().map(|s| s.name.as_str()))?;

        // 以範例 CEP 渲染樣板，確認結果是合法的 http(s) URL
        let sample = Cep::parse("01001000")?;
        for source in &self.sources {
            validation::validate_non_empty_string("sources.name", &source.name)?;

            let definition = source.definition();
            if !definition.has_placeholder() {
                return Err(CepError::InvalidConfigValueError {
                    field: format!("sources[{}].url_template", source.name),
                    value: source.url_template.clone(),
                    reason: "Template must contain {cep} or {cep_hyphen}".to_string(),
                });
            }
            validation::validate_url(
                &format!("sources[{}].url_template", source.name),
                &definition.render_url(&sample),
            )?;
        }

        Ok(())
    }

    pub fn race_settings(&self) -> RaceSettings {
        RaceSettings {
            overall_timeout: Duration::from_millis(self.race.timeout_ms),
            source_timeout: Duration::from_millis(self.race.source_timeout_ms),
        }
    }

    pub fn enabled_definitions(&self) -> Vec<SourceDefinition> {
        self.sources
            .iter()
            .filter(|s| s.enabled)
            .map(SourceConfig::definition)
            .collect()
    }

    /// 所有來源共用同一個 HTTP client
    pub fn build_sources(&self) -> Result<Vec<Arc<dyn AddressSource>>> {
        let client = build_client(
            &self.race.user_agent,
            Duration::from_millis(self.race.source_timeout_ms),
        )?;

        Ok(self
            .enabled_definitions()
            .into_iter()
            .map(|definition| {
                Arc::new(HttpSource::new(definition, client.clone())) as Arc<dyn AddressSource>
            })
            .collect())
    }

    pub fn build_engine(&self) -> Result<LookupEngine> {
        let coordinator = RaceCoordinator::new(self.build_sources()?, self.race_settings())?;
        Ok(LookupEngine::new(coordinator))
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
