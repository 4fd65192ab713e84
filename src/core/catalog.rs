//! 庫存目錄快取。
//!
//! 每次載入都會先在旁邊建好完整的一代 (generation)，成功後才以一次 `ArcSwap`
//! 替換發布；讀取端不需要鎖，拿到的永遠是完整的舊一代或完整的新一代。
//! 載入失敗時保留原本已發布的那一代 (或維持空快取)，錯誤只記錄，不往外丟。

use crate::core::normalize::normalize;
use crate::core::tabular::{parse_rows, TableFormat};
use crate::domain::model::{RawStockRecord, StockItem};
use crate::domain::ports::Storage;
use crate::utils::error::{MatcherError, Result};
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

impl StockItem {
    /// 搜尋鍵只在這裡計算一次，查詢時不再重算
    pub fn new(name: String, option: String, code: String) -> Self {
        let search_key = normalize(&format!("{}{}", name, option));
        Self {
            name,
            option,
            code,
            search_key,
        }
    }

    /// `name` 與 `code` 為必要欄位，`option` 缺值視為空字串
    pub fn from_raw(raw: RawStockRecord, row: usize) -> Result<Self> {
        let name = raw.name.ok_or_else(|| MatcherError::MalformedRecord {
            row,
            message: "missing name".to_string(),
        })?;
        let code = raw.code.ok_or_else(|| MatcherError::MalformedRecord {
            row,
            message: "missing code".to_string(),
        })?;
        Ok(Self::new(name, raw.option.unwrap_or_default(), code))
    }
}

/// 一次成功載入所發布的完整內容
#[derive(Debug)]
pub struct CatalogGeneration {
    pub items: Arc<Vec<StockItem>>,
    pub generation: u64,
    pub loaded_at: DateTime<Utc>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    Empty,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub generation: u64,
    pub loaded: usize,
    pub skipped: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
pub struct CatalogCache {
    current: ArcSwapOption<CatalogGeneration>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從儲存後端讀取快照並發布新的一代。失敗時回傳 `None`，原本的快取不受影響。
    pub async fn load<S: Storage>(&self, storage: &S, path: &str) -> Option<LoadReport> {
        let started = Instant::now();
        tracing::info!("📦 Loading catalog snapshot from: {}", path);

        let format = match TableFormat::require(path) {
            Ok(format) => format,
            Err(e) => {
                tracing::error!("❌ Catalog load aborted: {}", e);
                return None;
            }
        };

        let data = match storage.read_file(path).await {
            Ok(data) => data,
            Err(e) => {
                let err = MatcherError::SourceUnavailable {
                    path: path.to_string(),
                    message: e.to_string(),
                };
                tracing::warn!("⚠️ {} (keeping current catalog)", err);
                return None;
            }
        };

        // 大型快照的解析與正規化是 CPU 密集工作，不佔用 async worker
        let built =
            tokio::task::spawn_blocking(move || -> Result<(Vec<StockItem>, usize)> {
                let rows = parse_rows::<RawStockRecord>(&data, format)?;
                Ok(collect_items(rows))
            })
            .await;

        let (items, skipped) = match built {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!(
                    "⚠️ Catalog snapshot {} unreadable: {} (keeping current catalog)",
                    path,
                    e
                );
                return None;
            }
            Err(e) => {
                tracing::error!("❌ Catalog build task failed: {}", e);
                return None;
            }
        };

        self.publish(items, skipped, started)
    }

    /// 由已解析的原始資料列建立並發布新的一代，壞掉的列會被略過。
    /// 每一列都壞掉時不發布，回傳 `None`。
    pub fn load_records<I>(&self, records: I) -> Option<LoadReport>
    where
        I: IntoIterator<Item = Result<RawStockRecord>>,
    {
        let started = Instant::now();
        let (items, skipped) = collect_items(records);
        self.publish(items, skipped, started)
    }

    fn publish(
        &self,
        items: Vec<StockItem>,
        skipped: usize,
        started: Instant,
    ) -> Option<LoadReport> {
        // 只有表頭的快照是合法的空目錄；有資料列卻一筆都沒留下就不發布
        if items.is_empty() && skipped > 0 {
            tracing::warn!(
                "⚠️ All {} catalog rows were malformed (keeping current catalog)",
                skipped
            );
            return None;
        }

        let loaded = items.len();
        let items = Arc::new(items);
        let loaded_at = Utc::now();
        let mut generation = 0;

        // 代號在替換當下依目前這一代決定，同時有多個載入時發布順序與代號一致
        self.current.rcu(|current| {
            generation = current.as_ref().map_or(0, |g| g.generation) + 1;
            Some(Arc::new(CatalogGeneration {
                items: Arc::clone(&items),
                generation,
                loaded_at,
                skipped,
            }))
        });

        let report = LoadReport {
            generation,
            loaded,
            skipped,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "✅ Catalog cache ready: {} items (generation {}, {} rows skipped) in {:?}",
            report.loaded,
            report.generation,
            report.skipped,
            report.elapsed
        );
        Some(report)
    }

    /// 目前這一代的唯讀參照；尚未成功載入時為 `None`
    pub fn snapshot(&self) -> Option<Arc<CatalogGeneration>> {
        self.current.load_full()
    }

    pub fn state(&self) -> CacheState {
        if self.current.load().is_some() {
            CacheState::Ready
        } else {
            CacheState::Empty
        }
    }

    pub fn size(&self) -> usize {
        self.snapshot().map_or(0, |g| g.items.len())
    }
}

fn collect_items<I>(records: I) -> (Vec<StockItem>, usize)
where
    I: IntoIterator<Item = Result<RawStockRecord>>,
{
    let mut items = Vec::new();
    let mut skipped = 0;

    for (index, record) in records.into_iter().enumerate() {
        match record.and_then(|raw| StockItem::from_raw(raw, index + 1)) {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::debug!("Skipping catalog row: {}", e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("⚠️ Skipped {} malformed catalog rows", skipped);
    }

    (items, skipped)
}
