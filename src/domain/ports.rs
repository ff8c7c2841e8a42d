use crate::domain::model::{Category, ListingPage};
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

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn language(&self) -> &str;
    fn request_timeout_seconds(&self) -> Option<u64>;
    fn page_size(&self) -> usize;
    fn max_pages(&self) -> usize;
    fn max_concurrent_pipelines(&self) -> usize;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn monitoring_enabled(&self) -> bool;
}

/// 類別目錄來源
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_categories(&self) -> Result<Vec<Category>>;
}

/// 教師列表搜尋服務，`page` 從 0 開始
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_page(&self, code: i64, page: usize, page_size: usize) -> Result<ListingPage>;
}

/// 將子類別平均價格回報上游
#[async_trait]
pub trait PricePublisher: Send + Sync {
    async fn publish(&self, subcategory_name: &str, average_price: f64) -> Result<()>;
}
