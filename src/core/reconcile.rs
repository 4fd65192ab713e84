use crate::core::tabular::{parse_rows, TableFormat};
use crate::domain::model::{PendingTask, RawPendingRecord};
use crate::domain::ports::Storage;
use crate::utils::error::{MatcherError, Result};
use std::collections::HashSet;

/// 待處理清單扣掉已經有對應的 pk_key，保留原本順序
pub fn pending_work<I>(tasks: I, mapped: &HashSet<String>) -> Vec<PendingTask>
where
    I: IntoIterator<Item = PendingTask>,
{
    tasks
        .into_iter()
        .filter(|task| !mapped.contains(&task.pk_key))
        .collect()
}

impl PendingTask {
    pub fn from_raw(raw: RawPendingRecord, row: usize) -> Result<Self> {
        let pk_key = raw.pk_key.ok_or_else(|| MatcherError::MalformedRecord {
            row,
            message: "missing pk_key".to_string(),
        })?;
        Ok(Self {
            pk_key,
            name: raw.name.unwrap_or_default(),
            option: raw.option.unwrap_or_default(),
        })
    }
}

/// 外部提供的待人工比對清單 (唯讀)
pub struct PendingSource<S: Storage> {
    storage: S,
    path: String,
    format: TableFormat,
}

impl<S: Storage> PendingSource<S> {
    pub fn new(storage: S, path: String) -> Result<Self> {
        let format = TableFormat::require(&path)?;
        Ok(Self {
            storage,
            path,
            format,
        })
    }

    /// 讀不到清單時回傳空清單，單列缺 pk_key 則略過該列
    pub async fn tasks(&self) -> Vec<PendingTask> {
        let data = match self.storage.read_file(&self.path).await {
            Ok(data) => data,
            Err(e) => {
                let err = MatcherError::SourceUnavailable {
                    path: self.path.clone(),
                    message: e.to_string(),
                };
                tracing::warn!("⚠️ {} (no pending tasks)", err);
                return Vec::new();
            }
        };

        let rows = match parse_rows::<RawPendingRecord>(&data, self.format) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("⚠️ Pending list {} unreadable: {}", self.path, e);
                return Vec::new();
            }
        };

        rows.into_iter()
            .enumerate()
            .filter_map(|(index, row)| {
                match row.and_then(|raw| PendingTask::from_raw(raw, index + 1)) {
                    Ok(task) => Some(task),
                    Err(e) => {
                        tracing::warn!("⚠️ Skipping pending row in {}: {}", self.path, e);
                        None
                    }
                }
            })
            .collect()
    }
}
