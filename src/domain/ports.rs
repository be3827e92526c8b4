use crate::domain::model::{FareReport, RawTable};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<RawTable>>;
    async fn transform(&self, tables: Vec<RawTable>) -> Result<FareReport>;
    async fn load(&self, report: &FareReport) -> Result<String>;
}
