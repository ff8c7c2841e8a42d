use crate::domain::model::{Category, ListingPage};
use crate::domain::ports::{CatalogSource, ConfigProvider, ListingSource, PricePublisher};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 上游服務連線設定，於建構時注入而非全域狀態
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub language: String,
    pub timeout: Option<Duration>,
}

impl UpstreamConfig {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            language: config.language().to_string(),
            timeout: config.request_timeout_seconds().map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    categories: Vec<i64>,
    page: usize,
    page_size: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AveragePriceRequest<'a> {
    category_name: &'a str,
    average_price: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogBody {
    List(Vec<Category>),
    Wrapped { categories: Vec<Category> },
}

/// 以 reqwest 實作的上游客戶端，同時提供目錄、搜尋與回報三個介面
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    config: UpstreamConfig,
    client: Client,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let language =
            HeaderValue::from_str(&config.language).map_err(|e| EtlError::InvalidConfigValueError {
                field: "language".to_string(),
                value: config.language.clone(),
                reason: format!("Not a valid header value: {}", e),
            })?;
        headers.insert(ACCEPT_LANGUAGE, language);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            config,
            client: builder.build()?,
        })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl CatalogSource for UpstreamClient {
    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let url = self.endpoint("categories");
        tracing::debug!("📡 Fetching category catalog from: {}", url);

        let unavailable = |reason: String| EtlError::CatalogUnavailable { reason };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        tracing::debug!("📡 Catalog response status: {}", response.status());

        if !response.status().is_success() {
            return Err(unavailable(format!(
                "request failed with status: {}",
                response.status()
            )));
        }

        let body: CatalogBody = response
            .json()
            .await
            .map_err(|e| unavailable(format!("malformed body: {}", e)))?;

        Ok(match body {
            CatalogBody::List(categories) => categories,
            CatalogBody::Wrapped { categories } => categories,
        })
    }
}

#[async_trait]
impl ListingSource for UpstreamClient {
    async fn fetch_page(&self, code: i64, page: usize, page_size: usize) -> Result<ListingPage> {
        let url = self.endpoint("search");
        let request = SearchRequest {
            categories: vec![code],
            page,
            page_size,
        };
        tracing::debug!("📡 Searching listings: code={}, page={}", code, page);

        let failed = |reason: String| EtlError::PageFetchFailed { code, page, reason };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!(
                "request failed with status: {}",
                response.status()
            )));
        }

        response
            .json::<ListingPage>()
            .await
            .map_err(|e| failed(format!("malformed body: {}", e)))
    }
}

#[async_trait]
impl PricePublisher for UpstreamClient {
    async fn publish(&self, subcategory_name: &str, average_price: f64) -> Result<()> {
        let url = self.endpoint("average-price");
        let request = AveragePriceRequest {
            category_name: subcategory_name,
            average_price,
        };

        let failed = |reason: String| EtlError::PublishFailed {
            subcategory: subcategory_name.to_string(),
            reason,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!(
                "request failed with status: {}",
                response.status()
            )));
        }

        tracing::debug!(
            "📤 Published average {:.2} for '{}'",
            average_price,
            subcategory_name
        );
        Ok(())
    }
}
