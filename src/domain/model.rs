use serde::{Deserialize, Deserializer, Serialize};

/// 上游服務的類別，包含有序的子類別
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

/// 子類別：`name` 用來比對教師列表，`code` 用來查詢搜尋服務
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: Option<i64>,
}

/// 教師列表中的單一 (類別名稱, 時薪) 項目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPrice {
    pub name: String,
    #[serde(rename = "price", alias = "pricePerHour", default)]
    pub price: serde_json::Value,
}

impl CategoryPrice {
    /// 有效的非負時薪；數字字串亦接受
    pub fn price(&self) -> Option<f64> {
        let value = match &self.price {
            serde_json::Value::Number(n) => n.as_f64()?,
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        (value.is_finite() && value >= 0.0).then_some(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherListing {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub categories: Vec<CategoryPrice>,
}

impl TeacherListing {
    /// 第一個名稱完全相符（區分大小寫）的類別項目
    pub fn find_category(&self, name: &str) -> Option<&CategoryPrice> {
        self.categories.iter().find(|c| c.name == name)
    }
}

/// 搜尋服務的一頁結果；空頁代表分頁結束
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    #[serde(default)]
    pub teachers: Vec<TeacherListing>,
    #[serde(default)]
    pub total_results: Option<u64>,
}

impl ListingPage {
    pub fn is_exhausted(&self) -> bool {
        self.teachers.is_empty()
    }
}

/// 單一類別代碼的完整列表集合
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingBatch {
    pub listings: Vec<TeacherListing>,
    /// 分頁途中請求失敗，列表可能不完整
    pub partial: bool,
    pub pages_fetched: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// 單一子類別的處理結果，建立後不再變更
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationOutcome {
    pub subcategory_name: String,
    pub average_price: f64,
    pub contributing_count: usize,
    pub status: OutcomeStatus,
    pub message: String,
    pub partial: bool,
}

impl AggregationOutcome {
    pub fn success(
        subcategory_name: impl Into<String>,
        average_price: f64,
        contributing_count: usize,
        partial: bool,
    ) -> Self {
        let mut message = format!(
            "Average price {:.2} from {} listing(s)",
            average_price, contributing_count
        );
        if partial {
            message.push_str(" (partial listing data)");
        }
        Self {
            subcategory_name: subcategory_name.into(),
            average_price,
            contributing_count,
            status: OutcomeStatus::Success,
            message,
            partial,
        }
    }

    pub fn failure(subcategory_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subcategory_name: subcategory_name.into(),
            average_price: 0.0,
            contributing_count: 0,
            status: OutcomeStatus::Failure,
            message: message.into(),
            partial: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// 一次執行的完整結果，順序與類別目錄攤平後的順序一致
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub outcomes: Vec<AggregationOutcome>,
}

impl Report {
    pub fn new(outcomes: Vec<AggregationOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    pub fn partial_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.partial).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregationOutcome> {
        self.outcomes.iter()
    }
}

/// 依目錄順序攤平所有子類別
pub fn flatten_subcategories(categories: &[Category]) -> Vec<Subcategory> {
    categories
        .iter()
        .flat_map(|c| c.subcategories.iter().cloned())
        .collect()
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {}",
            other
        ))),
    }
}
