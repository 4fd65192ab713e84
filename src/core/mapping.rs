//! 人工比對結果的對應表 (pk_key -> ez_code)。
//!
//! 每次 upsert 都是「讀整張表、找到或新增、寫回整張表」，整段在同一把鎖內完成，
//! 兩個同時進來的決定不會互相覆蓋。

use crate::core::tabular::{parse_rows, write_rows, TableFormat};
use crate::domain::model::{MappingEntry, RawMappingRecord};
use crate::domain::ports::Storage;
use crate::utils::error::{MatcherError, Result};
use std::collections::HashSet;
use tokio::sync::Mutex;

pub const MAPPING_HEADERS: &[&str] = &["pk_key", "ez_code"];

/// 更新或新增一筆對應。回傳 `true` 表示取代了既有的紀錄。
/// 表內若已有重複的 pk_key，只保留第一筆。
pub fn apply_upsert(entries: &mut Vec<MappingEntry>, pk_key: &str, ez_code: &str) -> bool {
    let mut found = false;
    entries.retain_mut(|entry| {
        if entry.pk_key != pk_key {
            return true;
        }
        if found {
            return false;
        }
        found = true;
        entry.ez_code = ez_code.to_string();
        true
    });

    if !found {
        entries.push(MappingEntry {
            pk_key: pk_key.to_string(),
            ez_code: ez_code.to_string(),
        });
    }
    found
}

/// 讀出來的對應表，連同解析時略過的壞列數
#[derive(Debug, Default)]
struct MappingTable {
    entries: Vec<MappingEntry>,
    dropped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// 取代了既有的紀錄
    pub replaced: bool,
    /// 原表中無法解析、寫回時不再保留的列數
    pub dropped_rows: usize,
}

pub struct MappingStore<S: Storage> {
    storage: S,
    path: String,
    format: TableFormat,
    write_lock: Mutex<()>,
}

impl<S: Storage> MappingStore<S> {
    pub fn new(storage: S, path: String) -> Result<Self> {
        let format = TableFormat::require(&path)?;
        Ok(Self {
            storage,
            path,
            format,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// `Ok(None)` 表示對應表還不存在
    async fn read_table(&self) -> Result<Option<MappingTable>> {
        let data = match self.storage.read_file(&self.path).await {
            Ok(data) => data,
            Err(MatcherError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };

        // 空檔案裡沒有任何決定，當成空表
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Some(MappingTable::default()));
        }

        let mut table = MappingTable::default();
        let rows = parse_rows::<RawMappingRecord>(&data, self.format)?;
        for (index, row) in rows.into_iter().enumerate() {
            match row.and_then(|raw| entry_from_raw(raw, index + 1)) {
                Ok(entry) => table.entries.push(entry),
                Err(e) => {
                    tracing::warn!("⚠️ Skipping mapping row in {}: {}", self.path, e);
                    table.dropped += 1;
                }
            }
        }
        Ok(Some(table))
    }

    /// 讀取整張表；讀不到或壞掉時視為空表
    pub async fn entries(&self) -> Vec<MappingEntry> {
        match self.read_table().await {
            Ok(table) => table.map(|t| t.entries).unwrap_or_default(),
            Err(e) => {
                tracing::warn!(
                    "⚠️ Mapping table {} unreadable, treating as empty: {}",
                    self.path,
                    e
                );
                Vec::new()
            }
        }
    }

    pub async fn list_keys(&self) -> HashSet<String> {
        self.entries()
            .await
            .into_iter()
            .map(|entry| entry.pk_key)
            .collect()
    }

    pub async fn exists(&self, pk_key: &str) -> bool {
        self.list_keys().await.contains(pk_key)
    }

    /// 寫回時只保留能解析的列；被丟掉的列數放在 `UpsertOutcome::dropped_rows`
    pub async fn upsert(&self, pk_key: &str, ez_code: &str) -> Result<UpsertOutcome> {
        let _guard = self.write_lock.lock().await;

        // 既有的表讀不出來時不可覆寫，否則會把之前的決定全部洗掉
        let MappingTable {
            mut entries,
            dropped,
        } = self
            .read_table()
            .await
            .map_err(|e| MatcherError::WriteFailure {
                path: self.path.clone(),
                message: format!("existing table could not be read: {}", e),
            })?
            .unwrap_or_default();

        let replaced = apply_upsert(&mut entries, pk_key, ez_code);

        let data = write_rows(&entries, MAPPING_HEADERS, self.format).map_err(|e| {
            MatcherError::WriteFailure {
                path: self.path.clone(),
                message: e.to_string(),
            }
        })?;

        self.storage
            .write_file(&self.path, &data)
            .await
            .map_err(|e| MatcherError::WriteFailure {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        tracing::info!(
            "💾 Mapping {} {} -> {} ({} entries)",
            if replaced { "updated" } else { "added" },
            pk_key,
            ez_code,
            entries.len()
        );
        if dropped > 0 {
            tracing::warn!(
                "⚠️ Rewrote {} without {} malformed rows that could not be parsed",
                self.path,
                dropped
            );
        }

        Ok(UpsertOutcome {
            replaced,
            dropped_rows: dropped,
        })
    }
}

fn entry_from_raw(raw: RawMappingRecord, row: usize) -> Result<MappingEntry> {
    match (raw.pk_key, raw.ez_code) {
        (Some(pk_key), Some(ez_code)) => Ok(MappingEntry { pk_key, ez_code }),
        (None, _) => Err(MatcherError::MalformedRecord {
            row,
            message: "missing pk_key".to_string(),
        }),
        (Some(pk_key), None) => Err(MatcherError::MalformedRecord {
            row,
            message: format!("missing ez_code for {}", pk_key),
        }),
    }
}
