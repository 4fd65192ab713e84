use crate::core::catalog::{CacheState, CatalogCache, LoadReport};
use crate::core::mapping::MappingStore;
use crate::core::reconcile::{pending_work, PendingSource};
use crate::core::search::SearchEngine;
use crate::domain::model::{PendingTask, RecordStatus, StockItem};
use crate::domain::ports::{ConfigProvider, Storage};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub state: CacheState,
    pub items: usize,
    pub generation: Option<u64>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub skipped: usize,
}

/// 對外部服務層 (HTTP / CLI) 提供的四個操作：
/// 載入目錄、搜尋、列出待處理、記錄決定。
pub struct MatcherEngine<S: Storage + Clone> {
    storage: S,
    catalog_path: String,
    cache: Arc<CatalogCache>,
    search: SearchEngine,
    mappings: MappingStore<S>,
    pending: PendingSource<S>,
}

impl<S: Storage + Clone> MatcherEngine<S> {
    pub fn new<C: ConfigProvider>(storage: S, config: &C) -> Result<Self> {
        let cache = Arc::new(CatalogCache::new());
        let search = SearchEngine::new(cache.clone(), config.search_limit());
        let mappings = MappingStore::new(storage.clone(), config.mapping_path().to_string())?;
        let pending = PendingSource::new(storage.clone(), config.pending_path().to_string())?;

        Ok(Self {
            storage,
            catalog_path: config.catalog_path().to_string(),
            cache,
            search,
            mappings,
            pending,
        })
    }

    /// 啟動時或手動重新載入時呼叫；失敗時沿用目前的目錄
    pub async fn load_catalog(&self) -> Option<LoadReport> {
        self.cache.load(&self.storage, &self.catalog_path).await
    }

    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<StockItem> {
        self.search.search(query, limit)
    }

    pub async fn pending_work(&self) -> Vec<PendingTask> {
        let (tasks, mapped) = tokio::join!(self.pending.tasks(), self.mappings.list_keys());
        let total = tasks.len();
        let work = pending_work(tasks, &mapped);
        tracing::debug!(
            "Pending work: {} of {} tasks ({} mapped keys)",
            work.len(),
            total,
            mapped.len()
        );
        work
    }

    pub async fn record_mapping(&self, pk_key: &str, ez_code: &str) -> RecordStatus {
        if pk_key.trim().is_empty() || ez_code.trim().is_empty() {
            return RecordStatus::Error {
                message: "pk_key and ez_code are required".to_string(),
            };
        }

        match self.mappings.upsert(pk_key, ez_code).await {
            Ok(_) => RecordStatus::Success,
            Err(e) => {
                tracing::error!("❌ Failed to record mapping {} -> {}: {}", pk_key, ez_code, e);
                RecordStatus::Error {
                    message: e.user_friendly_message(),
                }
            }
        }
    }

    pub fn stats(&self) -> CatalogStats {
        let snapshot = self.cache.snapshot();
        CatalogStats {
            state: self.cache.state(),
            items: self.cache.size(),
            generation: snapshot.as_ref().map(|g| g.generation),
            loaded_at: snapshot.as_ref().map(|g| g.loaded_at),
            skipped: snapshot.as_ref().map(|g| g.skipped).unwrap_or(0),
        }
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    pub fn mappings(&self) -> &MappingStore<S> {
        &self.mappings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::MockStorage;

    struct MockConfig {
        limit: usize,
    }

    impl ConfigProvider for MockConfig {
        fn catalog_path(&self) -> &str {
            "stock.csv"
        }

        fn mapping_path(&self) -> &str {
            "mapping.csv"
        }

        fn pending_path(&self) -> &str {
            "pending.csv"
        }

        fn search_limit(&self) -> usize {
            self.limit
        }
    }

    async fn seeded_storage() -> MockStorage {
        let storage = MockStorage::new();
        storage
            .put(
                "stock.csv",
                "name,option,code\nRed Shoe,Size 9,RS9\nRed Shoe,Size 10,RS10\nBlue Hat,,BH1\n",
            )
            .await;
        storage
            .put("pending.csv", "pk_key,name,option\n1,red shoe,9\n2,blue hat,\n3,cap,\n")
            .await;
        storage
    }

    #[tokio::test]
    async fn test_degraded_start() {
        let engine = MatcherEngine::new(MockStorage::new(), &MockConfig { limit: 30 }).unwrap();

        assert!(engine.load_catalog().await.is_none());
        assert!(engine.search("anything", None).is_empty());
        assert!(engine.pending_work().await.is_empty());
        assert_eq!(engine.stats().state, CacheState::Empty);
    }

    #[tokio::test]
    async fn test_search_uses_configured_limit() {
        let engine = MatcherEngine::new(seeded_storage().await, &MockConfig { limit: 1 }).unwrap();
        engine.load_catalog().await.unwrap();

        assert_eq!(engine.search("red", None).len(), 1);
        assert_eq!(engine.search("red", Some(5)).len(), 2);
    }

    #[tokio::test]
    async fn test_recorded_mapping_leaves_work_queue() {
        let engine = MatcherEngine::new(seeded_storage().await, &MockConfig { limit: 30 }).unwrap();
        engine.load_catalog().await.unwrap();

        let before: Vec<String> =
            engine.pending_work().await.into_iter().map(|t| t.pk_key).collect();
        assert_eq!(before, vec!["1", "2", "3"]);

        assert_eq!(engine.record_mapping("2", "BH1").await, RecordStatus::Success);
        assert!(engine.mappings().exists("2").await);

        let after: Vec<String> =
            engine.pending_work().await.into_iter().map(|t| t.pk_key).collect();
        assert_eq!(after, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_record_mapping_reports_errors() {
        let storage = seeded_storage().await;
        let engine = MatcherEngine::new(storage.clone(), &MockConfig { limit: 30 }).unwrap();

        assert!(!engine.record_mapping("", "X").await.is_success());
        assert!(!engine.record_mapping("1", "  ").await.is_success());

        storage.set_fail_writes(true);
        let status = engine.record_mapping("1", "RS9").await;
        assert!(matches!(status, RecordStatus::Error { .. }));
    }

    #[tokio::test]
    async fn test_stats_after_load() {
        let engine = MatcherEngine::new(seeded_storage().await, &MockConfig { limit: 30 }).unwrap();
        engine.load_catalog().await.unwrap();
        engine.load_catalog().await.unwrap();

        let stats = engine.stats();
        assert_eq!(stats.state, CacheState::Ready);
        assert_eq!(stats.items, 3);
        assert_eq!(stats.generation, Some(2));
        assert_eq!(engine.cache().size(), 3);
    }
}
