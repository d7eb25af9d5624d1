use crate::domain::model::{AddressRecord, Cep, LookupReply, RaceOutcome, SourceFailure};
use crate::domain::ports::AddressSource;
use crate::utils::error::{CepError, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceSettings {
    /// 整場競賽的截止時間，決定使用者看到的結果
    pub overall_timeout: Duration,
    /// 每個來源各自的逾時，逾時即視為該來源失敗
    pub source_timeout: Duration,
}

impl Default for RaceSettings {
    fn default() -> Self {
        Self {
            overall_timeout: Duration::from_millis(1000),
            source_timeout: Duration::from_millis(1000),
        }
    }
}

struct Delivery {
    source: String,
    elapsed: Duration,
    result: Result<AddressRecord>,
}

/// 同時向所有來源發出查詢，採用第一個成功的回應
pub struct RaceCoordinator {
    sources: Vec<Arc<dyn AddressSource>>,
    settings: RaceSettings,
}

impl RaceCoordinator {
    pub fn new(sources: Vec<Arc<dyn AddressSource>>, settings: RaceSettings) -> Result<Self> {
        if sources.is_empty() {
            return Err(CepError::ConfigError {
                message: "at least one source is required to race".to_string(),
            });
        }
        Ok(Self { sources, settings })
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn race(&self, cep: &Cep) -> RaceOutcome {
        let started = Instant::now();
        let cancel = CancellationToken::new();
        // 容量等於來源數，送出端永遠不會阻塞
        let (tx, mut rx) = mpsc::channel::<Delivery>(self.sources.len());
        let mut tasks = JoinSet::new();

        for source in &self.sources {
            let source = Arc::clone(source);
            let cep = cep.clone();
            let tx = tx.clone();
            let cancel = cancel.child_token();
            let source_timeout = self.settings.source_timeout;

            tasks.spawn(async move {
                let name = source.name().to_string();
                let result = tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!(source = %name, "Lookup cancelled");
                        return;
                    }
                    attempt = tokio::time::timeout(source_timeout, source.lookup(&cep)) => match attempt {
                        Ok(result) => result,
                        Err(_) => Err(CepError::RequestError {
                            source_name: name.clone(),
                            message: format!("timed out after {}ms", source_timeout.as_millis()),
                        }),
                    },
                };

                let delivery = Delivery {
                    source: name,
                    elapsed: started.elapsed(),
                    result,
                };
                // 協調者已結束時接收端會關閉，忽略送出失敗
                let _ = tx.send(delivery).await;
            });
        }
        drop(tx);

        tracing::debug!(
            cep = %cep,
            sources = self.sources.len(),
            timeout_ms = self.settings.overall_timeout.as_millis() as u64,
            "Race started"
        );

        let mut failures = Vec::new();
        let raced = tokio::time::timeout(
            self.settings.overall_timeout,
            first_success(&mut rx, &mut failures),
        )
        .await;

        let outcome = match raced {
            Ok(Some(reply)) => {
                tracing::info!(
                    source = %reply.source,
                    elapsed_ms = reply.elapsed.as_millis() as u64,
                    "🏁 Race resolved"
                );
                RaceOutcome::Resolved(reply)
            }
            Ok(None) => {
                tracing::info!(failed = failures.len(), "All sources failed");
                RaceOutcome::Exhausted(failures)
            }
            Err(_) => {
                tracing::info!(
                    timeout_ms = self.settings.overall_timeout.as_millis() as u64,
                    failed = failures.len(),
                    "⏰ Race timed out"
                );
                RaceOutcome::TimedOut {
                    after: self.settings.overall_timeout,
                    failures,
                }
            }
        };

        cancel.cancel();
        tasks.shutdown().await;
        tracing::debug!("Outstanding lookups stopped");

        outcome
    }
}

async fn first_success(
    rx: &mut mpsc::Receiver<Delivery>,
    failures: &mut Vec<SourceFailure>,
) -> Option<LookupReply> {
    while let Some(delivery) = rx.recv().await {
        match delivery.result {
            Ok(record) => {
                return Some(LookupReply {
                    source: delivery.source,
                    elapsed: delivery.elapsed,
                    record,
                })
            }
            Err(e) => {
                tracing::debug!(source = %delivery.source, error = %e, "Source lost the race");
                failures.push(SourceFailure::from_error(&delivery.source, &e));
            }
        }
    }
    // 所有送出端都已關閉：每個來源都失敗了
    None
}
