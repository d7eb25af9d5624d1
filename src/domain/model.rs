use crate::utils::error::{CepError, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// 經過驗證的 CEP（巴西郵遞區號），以 8 位數字保存
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cep(String);

impl Cep {
    /// 接受 `01001000` 或 `01001-000`，前後空白會被忽略
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CepError::InvalidInputError {
                message: "CEP cannot be empty".to_string(),
            });
        }

        let digits: String = match trimmed.split_once('-') {
            Some((head, tail)) if head.len() == 5 && tail.len() == 3 => format!("{}{}", head, tail),
            Some(_) => {
                return Err(CepError::InvalidInputError {
                    message: format!("'{}' is not in the NNNNN-NNN format", trimmed),
                })
            }
            None => trimmed.to_string(),
        };

        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CepError::InvalidInputError {
                message: format!("'{}' must contain exactly 8 digits", trimmed),
            });
        }

        Ok(Self(digits))
    }

    pub fn digits(&self) -> &str {
        &self.0
    }

    pub fn hyphenated(&self) -> String {
        format!("{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 回應內容的解碼規則
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    ApiCep,
    ViaCep,
    Raw,
}

impl SourceKind {
    pub fn decode(&self, body: &[u8]) -> std::result::Result<AddressRecord, serde_json::Error> {
        Ok(match self {
            SourceKind::ApiCep => AddressRecord::ApiCep(serde_json::from_slice(body)?),
            SourceKind::ViaCep => AddressRecord::ViaCep(serde_json::from_slice(body)?),
            SourceKind::Raw => AddressRecord::Raw(serde_json::from_slice(body)?),
        })
    }
}

pub const CEP_PLACEHOLDER: &str = "{cep}";
pub const CEP_HYPHEN_PLACEHOLDER: &str = "{cep_hyphen}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDefinition {
    pub name: String,
    pub url_template: String,
    pub kind: SourceKind,
}

impl SourceDefinition {
    pub fn new(name: impl Into<String>, url_template: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            kind,
        }
    }

    pub fn api_cep() -> Self {
        Self::new(
            "API CEP",
            "https://cdn.apicep.com/file/apicep/{cep_hyphen}.json",
            SourceKind::ApiCep,
        )
    }

    pub fn via_cep() -> Self {
        Self::new(
            "Via CEP",
            "https://viacep.com.br/ws/{cep}/json/",
            SourceKind::ViaCep,
        )
    }

    pub fn has_placeholder(&self) -> bool {
        self.url_template.contains(CEP_PLACEHOLDER)
            || self.url_template.contains(CEP_HYPHEN_PLACEHOLDER)
    }

    pub fn render_url(&self, cep: &Cep) -> String {
        // 先替換較長的佔位符，避免 {cep} 誤吃 {cep_hyphen}
        self.url_template
            .replace(CEP_HYPHEN_PLACEHOLDER, &cep.hyphenated())
            .replace(CEP_PLACEHOLDER, cep.digits())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiCepAddress {
    pub code: String,
    pub state: String,
    pub city: String,
    pub district: String,
    pub address: String,
    pub status: i64,
    pub ok: bool,
    #[serde(rename = "statusText")]
    pub status_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViaCepAddress {
    pub cep: String,
    pub logradouro: String,
    pub complemento: String,
    pub bairro: String,
    pub localidade: String,
    pub uf: String,
    pub ibge: String,
    pub gia: String,
    pub ddd: String,
    pub siafi: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erro: Option<serde_json::Value>,
}

/// 各來源回應的標記聯集
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "lowercase")]
pub enum AddressRecord {
    ApiCep(ApiCepAddress),
    ViaCep(ViaCepAddress),
    Raw(serde_json::Value),
}

impl AddressRecord {
    /// 服務以 2xx 回應但表示查無此 CEP
    pub fn is_not_found(&self) -> bool {
        match self {
            AddressRecord::ApiCep(r) => !r.ok || (r.status != 0 && r.status != 200),
            AddressRecord::ViaCep(r) => match &r.erro {
                Some(serde_json::Value::Bool(flag)) => *flag,
                Some(serde_json::Value::String(flag)) => flag == "true",
                Some(_) => true,
                None => false,
            },
            AddressRecord::Raw(_) => false,
        }
    }

    pub fn fields(&self) -> Vec<(String, String)> {
        fn pair(key: &str, value: &str) -> (String, String) {
            (key.to_string(), value.to_string())
        }

        match self {
            AddressRecord::ApiCep(r) => vec![
                pair("code", &r.code),
                pair("state", &r.state),
                pair("city", &r.city),
                pair("district", &r.district),
                pair("address", &r.address),
                pair("status", &r.status.to_string()),
                pair("ok", &r.ok.to_string()),
                pair("statusText", &r.status_text),
            ],
            AddressRecord::ViaCep(r) => vec![
                pair("cep", &r.cep),
                pair("logradouro", &r.logradouro),
                pair("complemento", &r.complemento),
                pair("bairro", &r.bairro),
                pair("localidade", &r.localidade),
                pair("uf", &r.uf),
                pair("ibge", &r.ibge),
                pair("gia", &r.gia),
                pair("ddd", &r.ddd),
                pair("siafi", &r.siafi),
            ],
            AddressRecord::Raw(serde_json::Value::Object(map)) => map
                .iter()
                .map(|(k, v)| match v {
                    serde_json::Value::String(s) => (k.clone(), s.clone()),
                    other => (k.clone(), other.to_string()),
                })
                .collect(),
            AddressRecord::Raw(other) => vec![pair("value", &other.to_string())],
        }
    }
}

impl fmt::Display for AddressRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .fields()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        f.write_str(&rendered.join(" "))
    }
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

/// 贏得競賽的來源結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupReply {
    pub source: String,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    #[serde(rename = "address")]
    pub record: AddressRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source_name: String,
    pub cause: String,
}

impl SourceFailure {
    pub fn from_error(source_name: &str, error: &CepError) -> Self {
        let cause = match error {
            CepError::RequestError { message, .. } | CepError::DecodeError { message, .. } => {
                message.clone()
            }
            CepError::NotFoundError { cep, .. } => format!("no address for CEP {}", cep),
            other => other.to_string(),
        };
        Self {
            source_name: source_name.to_string(),
            cause,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RaceOutcome {
    Resolved(LookupReply),
    /// 截止時間到且沒有任何成功結果；`failures` 為截止前已回報的失敗
    TimedOut {
        after: Duration,
        failures: Vec<SourceFailure>,
    },
    Exhausted(Vec<SourceFailure>),
}

impl RaceOutcome {
    pub fn into_result(self) -> Result<LookupReply> {
        match self {
            RaceOutcome::Resolved(reply) => Ok(reply),
            RaceOutcome::TimedOut { after, .. } => Err(CepError::TimeoutError {
                timeout_ms: after.as_millis() as u64,
            }),
            RaceOutcome::Exhausted(failures) => Err(CepError::AllSourcesFailed { failures }),
        }
    }
}
