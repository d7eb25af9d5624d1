use cep_race::core::output;
use cep_race::utils::logger;
use cep_race::{CepError, CliConfig, LookupEngine};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(&cli).await {
        tracing::debug!("Lookup failed: {} (Category: {:?})", e, e.category());

        // 終止時只輸出一行診斷訊息
        eprintln!("❌ {} 💡 {}", e.user_friendly_message(), e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: &CliConfig) -> Result<(), CepError> {
    // 輸入檢查先於設定載入，缺少 CEP 一律回報為輸入錯誤
    let cep = LookupEngine::parse_query(cli.cep.as_deref())?;

    let config = cli.load_app_config()?;
    let engine = config.build_engine()?;

    let reply = engine.lookup(&cep).await?;
    println!("{}", output::render(&reply, cli.format)?);
    Ok(())
}
