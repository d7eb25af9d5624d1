use crate::core::race::RaceCoordinator;
use crate::domain::model::{Cep, LookupReply};
use crate::utils::error::{CepError, Result};

pub struct LookupEngine {
    coordinator: RaceCoordinator,
}

impl LookupEngine {
    pub fn new(coordinator: RaceCoordinator) -> Self {
        Self { coordinator }
    }

    /// 缺少或格式錯誤的輸入在任何設定載入或網路請求之前就被拒絕
    pub fn parse_query(raw_query: Option<&str>) -> Result<Cep> {
        let raw = raw_query.ok_or_else(|| CepError::InvalidInputError {
            message: "a CEP argument is required".to_string(),
        })?;
        Cep::parse(raw)
    }

    /// 驗證輸入後才開始競賽；輸入不合法時不會發出任何請求
    pub async fn run(&self, raw_query: Option<&str>) -> Result<LookupReply> {
        let cep = Self::parse_query(raw_query)?;
        self.lookup(&cep).await
    }

    pub async fn lookup(&self, cep: &Cep) -> Result<LookupReply> {
        tracing::info!(
            "🔎 Looking up CEP {} across {}",
            cep,
            self.coordinator.source_names().join(", ")
        );

        self.coordinator.race(cep).await.into_result()
    }
}
