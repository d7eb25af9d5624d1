use crate::domain::model::LookupReply;
use crate::utils::error::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// 將結果輸出為單一行
pub fn render(reply: &LookupReply, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!("{}: {}", reply.source, reply.record)),
        OutputFormat::Json => Ok(serde_json::to_string(reply)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AddressRecord, ViaCepAddress};
    use std::time::Duration;

    fn reply() -> LookupReply {
        LookupReply {
            source: "Via CEP".to_string(),
            elapsed: Duration::from_millis(42),
            record: AddressRecord::ViaCep(ViaCepAddress {
                cep: "01001-000".to_string(),
                logradouro: "Praça da Sé".to_string(),
                uf: "SP".to_string(),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_text_output_is_one_line() {
        let line = render(&reply(), OutputFormat::Text).unwrap();

        assert!(line.starts_with("Via CEP: cep=01001-000 logradouro=Praça da Sé"));
        assert!(line.contains("uf=SP"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_json_output_tags_the_record_kind() {
        let line = render(&reply(), OutputFormat::Json).unwrap();
        assert!(!line.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["source"], "Via CEP");
        assert_eq!(value["elapsed_ms"], 42);
        assert_eq!(value["address"]["kind"], "viacep");
        assert_eq!(value["address"]["record"]["uf"], "SP");
        assert!(value["address"]["record"].get("erro").is_none());
    }
}
