use crate::core::decomposer::Strategy;
use crate::domain::model::{ComponentSpec, InputSheet, ResultRow};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn component_spec(&self) -> &ComponentSpec;
    fn total_column(&self) -> &str;
    fn strategy(&self) -> Strategy;
    fn max_attempts(&self) -> u64;
    fn seed(&self) -> Option<u64>;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn output_filename(&self) -> &str;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<InputSheet>;
    async fn transform(&self, sheet: InputSheet) -> Result<Vec<ResultRow>>;
    async fn load(&self, rows: Vec<ResultRow>) -> Result<Vec<String>>;
}
