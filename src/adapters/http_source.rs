use crate::domain::model::{AddressRecord, Cep, SourceDefinition};
use crate::domain::ports::AddressSource;
use crate::utils::error::{CepError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// 以 HTTP GET 查詢單一來源的 `AddressSource` 實作
pub struct HttpSource {
    definition: SourceDefinition,
    client: Client,
}

impl HttpSource {
    pub fn new(definition: SourceDefinition, client: Client) -> Self {
        Self { definition, client }
    }

    fn request_error(&self, message: impl Into<String>) -> CepError {
        CepError::RequestError {
            source_name: self.definition.name.clone(),
            message: message.into(),
        }
    }
}

pub fn build_client(user_agent: &str, connect_timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .user_agent(user_agent)
        .connect_timeout(connect_timeout)
        .build()?;
    Ok(client)
}

#[async_trait]
impl AddressSource for HttpSource {
    fn name(&self) -> &str {
        &self.definition.name
    }

    async fn lookup(&self, cep: &Cep) -> Result<AddressRecord> {
        let url = self.definition.render_url(cep);
        tracing::debug!(source = %self.definition.name, %url, "Sending lookup request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.request_error(e.to_string()))?;

        let status = response.status();
        tracing::debug!(source = %self.definition.name, status = status.as_u16(), "Received response");

        if !status.is_success() {
            return Err(self.request_error(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.request_error(e.to_string()))?;

        let record = self
            .definition
            .kind
            .decode(&body)
            .map_err(|e| CepError::DecodeError {
                source_name: self.definition.name.clone(),
                message: e.to_string(),
            })?;

        if record.is_not_found() {
            return Err(CepError::NotFoundError {
                source_name: self.definition.name.clone(),
                cep: cep.to_string(),
            });
        }

        Ok(record)
    }
}
