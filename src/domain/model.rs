use serde::{Deserialize, Serialize};

/// 庫存品項。載入快取時建立一次，之後不再變動。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockItem {
    pub name: String,
    pub option: String,
    pub code: String,
    #[serde(skip)]
    pub search_key: String,
}

/// 快照中的一列原始資料，欄位可能缺漏。
/// `n` / `o` / `c` 是預先壓縮的快照使用的短欄位名。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStockRecord {
    #[serde(default, alias = "n")]
    pub name: Option<String>,
    #[serde(default, alias = "o")]
    pub option: Option<String>,
    #[serde(default, alias = "c")]
    pub code: Option<String>,
}

/// 等待人工比對的商品
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTask {
    pub pk_key: String,
    pub name: String,
    pub option: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPendingRecord {
    #[serde(default)]
    pub pk_key: Option<String>,
    #[serde(default, alias = "상품명")]
    pub name: Option<String>,
    #[serde(default, alias = "옵션")]
    pub option: Option<String>,
}

/// 一筆人工決定：pk_key 對應到的庫存代碼
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub pk_key: String,
    pub ez_code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMappingRecord {
    #[serde(default)]
    pub pk_key: Option<String>,
    #[serde(default)]
    pub ez_code: Option<String>,
}

/// `record_mapping` 回傳給呼叫端的狀態
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Error { message: String },
}

impl RecordStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RecordStatus::Success)
    }
}
