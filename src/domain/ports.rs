use crate::domain::model::{AddressRecord, Cep};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 一個可被競賽的 CEP 查詢來源
#[async_trait]
pub trait AddressSource: Send + Sync {
    fn name(&self) -> &str;

    /// 任何錯誤都只屬於此來源，由協調者記為「輸掉競賽」
    async fn lookup(&self, cep: &Cep) -> Result<AddressRecord>;
}
