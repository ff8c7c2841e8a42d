use crate::domain::model::ListingBatch;
use crate::domain::ports::ListingSource;
use crate::utils::error::{EtlError, Result};
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// 逐頁讀取單一類別代碼的所有教師列表，直到遇到空頁
pub struct ListingPager<L: ListingSource> {
    source: Arc<L>,
    page_size: usize,
    max_pages: usize,
}

impl<L: ListingSource> Clone for ListingPager<L> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            page_size: self.page_size,
            max_pages: self.max_pages,
        }
    }
}

impl<L: ListingSource> ListingPager<L> {
    pub fn new(source: Arc<L>, page_size: usize, max_pages: usize) -> Self {
        Self {
            source,
            page_size,
            max_pages,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// 分頁請求失敗時停止並回傳已累積的列表（`partial = true`）；
    /// 連續 `max_pages` 頁都非空則回傳 `PageLimitExceeded`。
    /// 沒有代碼的子類別不發出任何請求。
    pub async fn fetch_all_listings(&self, code: Option<i64>) -> Result<ListingBatch> {
        let mut batch = ListingBatch::default();
        let Some(code) = code else {
            return Ok(batch);
        };

        let mut page_index = 0;
        loop {
            if page_index >= self.max_pages {
                tracing::warn!(
                    "⚠️ Category code {}: no empty page after {} requests, giving up",
                    code,
                    self.max_pages
                );
                return Err(EtlError::PageLimitExceeded {
                    code,
                    max_pages: self.max_pages,
                });
            }

            match self
                .source
                .fetch_page(code, page_index, self.page_size)
                .await
            {
                Ok(page) => {
                    batch.pages_fetched += 1;
                    if page.is_exhausted() {
                        break;
                    }
                    batch.listings.extend(page.teachers);
                    page_index += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Category code {}: page {} failed, keeping {} listings: {}",
                        code,
                        page_index,
                        batch.listings.len(),
                        e
                    );
                    batch.partial = true;
                    break;
                }
            }
        }

        tracing::debug!(
            "📥 Category code {}: {} listings over {} pages",
            code,
            batch.listings.len(),
            batch.pages_fetched
        );
        Ok(batch)
    }
}
