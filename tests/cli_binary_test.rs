use anyhow::Result;
use httpmock::prelude::*;
use std::io::Write;
use std::process::{Command, Output};
use std::time::Duration;
use tempfile::NamedTempFile;

const API_PATH: &str = "/file/apicep/01001-000.json";
const VIA_PATH: &str = "/ws/01001000/json/";

fn write_config(api: &MockServer, via: &MockServer) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"
[[sources]]
name = "API CEP"
url_template = "{}"
kind = "apicep"

[[sources]]
name = "Via CEP"
url_template = "{}"
kind = "viacep"
"#,
        api.url("/file/apicep/{cep_hyphen}.json"),
        via.url("/ws/{cep}/json/")
    )?;
    Ok(file)
}

/// 以預設日誌設定執行 binary
fn run_cli(args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_cep-race"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()?;
    Ok(output)
}

fn lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn viacep_body() -> serde_json::Value {
    serde_json::json!({
        "cep": "01001000",
        "logradouro": "Praça da Sé",
        "bairro": "Sé",
        "localidade": "São Paulo",
        "uf": "SP"
    })
}

#[test]
fn test_success_prints_exactly_one_stdout_line() -> Result<()> {
    let api = MockServer::start();
    let via = MockServer::start();
    api.mock(|when, then| {
        when.method(GET).path(API_PATH);
        then.status(200).delay(Duration::from_secs(3));
    });
    via.mock(|when, then| {
        when.method(GET).path(VIA_PATH);
        then.status(200).json_body(viacep_body());
    });
    let config = write_config(&api, &via)?;
    let config_path = config.path().to_str().unwrap();

    let output = run_cli(&["01001000", "--config", config_path, "--timeout-ms", "2000"])?;

    assert_eq!(output.status.code(), Some(0));
    let stdout = lines(&output.stdout);
    assert_eq!(stdout.len(), 1);
    assert!(stdout[0].starts_with("Via CEP: cep=01001000"));
    assert!(stdout[0].contains("uf=SP"));
    assert!(lines(&output.stderr).is_empty());
    Ok(())
}

#[test]
fn test_json_format_prints_one_parseable_line() -> Result<()> {
    let api = MockServer::start();
    let via = MockServer::start();
    api.mock(|when, then| {
        when.method(GET).path(API_PATH);
        then.status(503);
    });
    via.mock(|when, then| {
        when.method(GET).path(VIA_PATH);
        then.status(200).json_body(viacep_body());
    });
    let config = write_config(&api, &via)?;
    let config_path = config.path().to_str().unwrap();

    let output = run_cli(&["01001-000", "--config", config_path, "--format", "json"])?;

    assert_eq!(output.status.code(), Some(0));
    let stdout = lines(&output.stdout);
    assert_eq!(stdout.len(), 1);
    let value: serde_json::Value = serde_json::from_str(&stdout[0])?;
    assert_eq!(value["source"], "Via CEP");
    assert_eq!(value["address"]["record"]["uf"], "SP");
    Ok(())
}

#[test]
fn test_invalid_input_exits_2_with_one_diagnostic() -> Result<()> {
    let api = MockServer::start();
    let via = MockServer::start();
    let api_mock = api.mock(|when, then| {
        when.method(GET);
        then.status(200);
    });
    let via_mock = via.mock(|when, then| {
        when.method(GET);
        then.status(200);
    });
    let config = write_config(&api, &via)?;
    let config_path = config.path().to_str().unwrap();

    let output = run_cli(&["12-34", "--config", config_path])?;

    assert_eq!(output.status.code(), Some(2));
    assert!(lines(&output.stdout).is_empty());
    let stderr = lines(&output.stderr);
    assert_eq!(stderr.len(), 1);
    assert!(stderr[0].contains("Invalid CEP"));
    assert_eq!(api_mock.hits(), 0);
    assert_eq!(via_mock.hits(), 0);
    Ok(())
}

#[test]
fn test_missing_cep_wins_over_broken_config() -> Result<()> {
    let mut config = NamedTempFile::new()?;
    write!(config, "[race\ntimeout_ms = ")?;
    let config_path = config.path().to_str().unwrap();

    let output = run_cli(&["--config", config_path])?;

    assert_eq!(output.status.code(), Some(2));
    let stderr = lines(&output.stderr);
    assert_eq!(stderr.len(), 1);
    assert!(stderr[0].contains("a CEP argument is required"));
    Ok(())
}

#[test]
fn test_timeout_exits_3_with_one_diagnostic() -> Result<()> {
    let api = MockServer::start();
    let via = MockServer::start();
    api.mock(|when, then| {
        when.method(GET).path(API_PATH);
        then.status(200).delay(Duration::from_secs(3));
    });
    via.mock(|when, then| {
        when.method(GET).path(VIA_PATH);
        then.status(200).json_body(viacep_body()).delay(Duration::from_secs(3));
    });
    let config = write_config(&api, &via)?;
    let config_path = config.path().to_str().unwrap();

    let output = run_cli(&[
        "01001000",
        "--config",
        config_path,
        "--timeout-ms",
        "200",
        "--source-timeout-ms",
        "5000",
    ])?;

    assert_eq!(output.status.code(), Some(3));
    assert!(lines(&output.stdout).is_empty());
    let stderr = lines(&output.stderr);
    assert_eq!(stderr.len(), 1);
    assert!(stderr[0].contains("200ms"));
    Ok(())
}

#[test]
fn test_all_sources_failing_exits_4() -> Result<()> {
    let api = MockServer::start();
    let via = MockServer::start();
    api.mock(|when, then| {
        when.method(GET).path(API_PATH);
        then.status(500);
    });
    via.mock(|when, then| {
        when.method(GET).path(VIA_PATH);
        then.status(200).body("not json");
    });
    let config = write_config(&api, &via)?;
    let config_path = config.path().to_str().unwrap();

    let output = run_cli(&["01001000", "--config", config_path])?;

    assert_eq!(output.status.code(), Some(4));
    assert!(lines(&output.stdout).is_empty());
    let stderr = lines(&output.stderr);
    assert_eq!(stderr.len(), 1);
    assert!(stderr[0].contains("[API CEP] HTTP 500"));
    Ok(())
}
