use crate::core::catalog::CatalogCache;
use crate::core::normalize::normalize;
use crate::domain::model::StockItem;
use std::sync::Arc;

pub const DEFAULT_SEARCH_LIMIT: usize = 30;

/// 以空白切開查詢字串，每個片段都經過與快取相同的正規化。
/// 只含標點的片段會變成空字串，並且會比對到所有品項。
pub fn query_terms(query: &str) -> Vec<String> {
    query.split_whitespace().map(normalize).collect()
}

/// 依快取順序掃描，收滿 `limit` 筆就停止
pub fn matching_items<'a>(
    items: &'a [StockItem],
    terms: &'a [String],
    limit: usize,
) -> impl Iterator<Item = &'a StockItem> + 'a {
    items
        .iter()
        .filter(move |item| {
            terms
                .iter()
                .all(|term| item.search_key.contains(term.as_str()))
        })
        .take(limit)
}

/// 多關鍵字 AND 子字串查詢。沒有排序，結果順序就是快取中的順序。
pub struct SearchEngine {
    cache: Arc<CatalogCache>,
    default_limit: usize,
}

impl SearchEngine {
    pub fn new(cache: Arc<CatalogCache>, default_limit: usize) -> Self {
        Self {
            cache,
            default_limit,
        }
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<StockItem> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let Some(snapshot) = self.cache.snapshot() else {
            tracing::debug!("Catalog cache is empty, returning no results");
            return Vec::new();
        };

        let limit = limit.unwrap_or(self.default_limit);
        let results: Vec<StockItem> = matching_items(&snapshot.items, &terms, limit)
            .cloned()
            .collect();

        tracing::debug!(
            "Search {:?} -> {} results (limit {}, generation {})",
            terms,
            results.len(),
            limit,
            snapshot.generation
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RawStockRecord;

    fn cache_with(rows: &[(&str, &str, &str)]) -> Arc<CatalogCache> {
        let cache = Arc::new(CatalogCache::new());
        cache.load_records(rows.iter().map(|(name, option, code)| {
            Ok(RawStockRecord {
                name: Some(name.to_string()),
                option: Some(option.to_string()),
                code: Some(code.to_string()),
            })
        }));
        cache
    }

    fn codes(items: &[StockItem]) -> Vec<&str> {
        items.iter().map(|item| item.code.as_str()).collect()
    }

    fn sample_cache() -> Arc<CatalogCache> {
        cache_with(&[
            ("Red Shoe", "Size 9", "RS9"),
            ("Red Shoe", "Size 10", "RS10"),
            ("Blue Shoe", "Size 9", "BS9"),
            ("나이키 에어맥스", "블랙 270", "NK270"),
            ("Red Hat", "One Size", "RH1"),
        ])
    }

    #[test]
    fn test_query_terms() {
        assert_eq!(query_terms("  Red   SHOE-9 "), vec!["red", "shoe9"]);
        assert_eq!(query_terms("red ! 9"), vec!["red", "", "9"]);
        assert!(query_terms("").is_empty());
        assert!(query_terms(" \t\n ").is_empty());
    }

    #[test]
    fn test_end_to_end_match() {
        let engine = SearchEngine::new(
            cache_with(&[("Red Shoe", "Size 9", "RS9")]),
            DEFAULT_SEARCH_LIMIT,
        );

        assert_eq!(codes(&engine.search("red 9", None)), vec!["RS9"]);
        assert!(engine.search("blue", None).is_empty());
    }

    #[test]
    fn test_all_terms_must_match() {
        let engine = SearchEngine::new(sample_cache(), DEFAULT_SEARCH_LIMIT);

        assert_eq!(codes(&engine.search("red size", None)), vec!["RS9", "RS10", "RH1"]);
        assert_eq!(codes(&engine.search("shoe 9", None)), vec!["RS9", "BS9"]);
        assert_eq!(codes(&engine.search("RED shoe 10", None)), vec!["RS10"]);
        assert_eq!(codes(&engine.search("나이키 270", None)), vec!["NK270"]);
        assert!(engine.search("red blue", None).is_empty());
    }

    #[test]
    fn test_terms_match_across_name_and_option() {
        let engine = SearchEngine::new(sample_cache(), DEFAULT_SEARCH_LIMIT);

        // "shoesize" 橫跨品名與選項的接合處
        assert_eq!(codes(&engine.search("shoesize9", None)), vec!["RS9", "BS9"]);
    }

    #[test]
    fn test_membership_matches_substring_rule() {
        let cache = sample_cache();
        let engine = SearchEngine::new(cache.clone(), usize::MAX);
        let snapshot = cache.snapshot().unwrap();

        for query in ["red", "9", "shoe size", "e", "에어 블랙", "zzz", "- 9"] {
            let terms = query_terms(query);
            let results = engine.search(query, None);
            for item in snapshot.items.iter() {
                let expected = terms.iter().all(|t| item.search_key.contains(t.as_str()));
                let found = results.contains(item);
                assert_eq!(found, expected, "query {:?} item {}", query, item.code);
            }
        }
    }

    #[test]
    fn test_limit_returns_prefix_of_full_result() {
        let engine = SearchEngine::new(sample_cache(), DEFAULT_SEARCH_LIMIT);
        let full = engine.search("e", Some(usize::MAX));

        for limit in 0..=full.len() + 1 {
            let bounded = engine.search("e", Some(limit));
            assert!(bounded.len() <= limit);
            assert_eq!(bounded[..], full[..bounded.len()]);
        }
    }

    #[test]
    fn test_default_limit_is_configurable() {
        let engine = SearchEngine::new(sample_cache(), 2);
        assert_eq!(engine.default_limit(), 2);
        assert_eq!(codes(&engine.search("size", None)), vec!["RS9", "RS10"]);
        assert_eq!(engine.search("size", Some(10)).len(), 4);
    }

    #[test]
    fn test_matching_stops_at_limit() {
        let cache = sample_cache();
        let snapshot = cache.snapshot().unwrap();
        let terms = vec!["red".to_string()];

        let mut matched = matching_items(&snapshot.items, &terms, 1);
        assert_eq!(matched.next().map(|i| i.code.as_str()), Some("RS9"));
        assert!(matched.next().is_none());
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let engine = SearchEngine::new(sample_cache(), DEFAULT_SEARCH_LIMIT);
        assert!(engine.search("", None).is_empty());
        assert!(engine.search("   \t", None).is_empty());
    }

    #[test]
    fn test_punctuation_term_matches_everything() {
        let engine = SearchEngine::new(sample_cache(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(engine.search("!!!", None).len(), 5);
        assert_eq!(codes(&engine.search("blue ---", None)), vec!["BS9"]);
    }

    #[test]
    fn test_search_before_load_returns_nothing() {
        let engine = SearchEngine::new(Arc::new(CatalogCache::new()), DEFAULT_SEARCH_LIMIT);
        assert!(engine.search("anything", None).is_empty());
    }
}
