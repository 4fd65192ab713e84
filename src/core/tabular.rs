//! 三種持久化表格 (庫存快照、對應表、待處理清單) 共用的讀寫。
//!
//! 讀取時整張表的失敗 (例如表頭壞掉、JSON 不是陣列) 走外層 `Result`，
//! 單列的失敗則放在每一列各自的 `Result` 裡，讓呼叫端可以只略過壞掉的那一列。

use crate::domain::model::{RawMappingRecord, RawPendingRecord, RawStockRecord};
use crate::utils::error::{MatcherError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Json,
}

impl TableFormat {
    pub const EXTENSIONS: &'static [&'static str] = &["csv", "tsv", "json"];

    pub fn from_path(path: &str) -> Option<Self> {
        let extension = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(TableFormat::Csv),
            "tsv" => Some(TableFormat::Tsv),
            "json" => Some(TableFormat::Json),
            _ => None,
        }
    }

    pub fn require(path: &str) -> Result<Self> {
        Self::from_path(path).ok_or_else(|| MatcherError::UnsupportedFormat {
            path: path.to_string(),
        })
    }

    fn delimiter(self) -> u8 {
        match self {
            TableFormat::Tsv => b'\t',
            _ => b',',
        }
    }
}

/// 每種表格必須出現的欄位；內層是同一欄可接受的別名
pub trait TableSchema {
    const REQUIRED_COLUMNS: &'static [&'static [&'static str]];
}

impl TableSchema for RawStockRecord {
    const REQUIRED_COLUMNS: &'static [&'static [&'static str]] = &[&["name", "n"], &["code", "c"]];
}

impl TableSchema for RawPendingRecord {
    const REQUIRED_COLUMNS: &'static [&'static [&'static str]] = &[&["pk_key"]];
}

impl TableSchema for RawMappingRecord {
    const REQUIRED_COLUMNS: &'static [&'static [&'static str]] = &[&["pk_key"], &["ez_code"]];
}

/// 解析整張表，回傳每一列的結果 (列號從 1 開始，不含表頭)
///
/// 沒有表頭或缺少必要欄位時整張表視為不可用，而不是每一列都失敗。
pub fn parse_rows<T>(data: &[u8], format: TableFormat) -> Result<Vec<Result<T>>>
where
    T: DeserializeOwned + TableSchema,
{
    match format {
        TableFormat::Csv | TableFormat::Tsv => parse_delimited(data, format.delimiter()),
        TableFormat::Json => parse_json(data),
    }
}

fn check_columns(present: &HashSet<&str>, required: &[&[&str]]) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .filter(|aliases| !aliases.iter().any(|alias| present.contains(alias)))
        .filter_map(|aliases| aliases.first().copied())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(MatcherError::SchemaMismatch {
            message: format!("missing required columns: {}", missing.join(", ")),
        })
    }
}

fn parse_delimited<T>(data: &[u8], delimiter: u8) -> Result<Vec<Result<T>>>
where
    T: DeserializeOwned + TableSchema,
{
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    // 表頭讀不出來就是整張表不可用
    let headers = reader.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(MatcherError::SchemaMismatch {
            message: "no header row".to_string(),
        });
    }
    check_columns(&headers.iter().collect(), T::REQUIRED_COLUMNS)?;

    let rows = reader
        .deserialize::<T>()
        .enumerate()
        .map(|(index, row)| {
            row.map_err(|e| MatcherError::MalformedRecord {
                row: index + 1,
                message: e.to_string(),
            })
        })
        .collect();

    Ok(rows)
}

fn parse_json<T>(data: &[u8]) -> Result<Vec<Result<T>>>
where
    T: DeserializeOwned + TableSchema,
{
    let values: Vec<serde_json::Value> = serde_json::from_slice(data)?;

    // 空陣列是合法的空表；否則至少要有一個物件帶著每個必要欄位
    if !values.is_empty() {
        let keys: HashSet<&str> = values
            .iter()
            .filter_map(serde_json::Value::as_object)
            .flat_map(|object| object.keys().map(String::as_str))
            .collect();
        check_columns(&keys, T::REQUIRED_COLUMNS)?;
    }

    let rows = values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let row = index + 1;
            let serde_json::Value::Object(object) = value else {
                return Err(MatcherError::MalformedRecord {
                    row,
                    message: "expected a JSON object".to_string(),
                });
            };

            // 數字型的 pk_key / code 一律轉成字串，null 視為缺欄
            let fields = object
                .into_iter()
                .filter_map(|(key, value)| {
                    let text = match value {
                        serde_json::Value::Null => return None,
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    Some((key, serde_json::Value::String(text)))
                })
                .collect();

            serde_json::from_value(serde_json::Value::Object(fields)).map_err(|e| {
                MatcherError::MalformedRecord {
                    row,
                    message: e.to_string(),
                }
            })
        })
        .collect();

    Ok(rows)
}

/// 將整張表序列化；CSV/TSV 即使沒有資料列也會寫出表頭
pub fn write_rows<T: Serialize>(
    rows: &[T],
    headers: &[&str],
    format: TableFormat,
) -> Result<Vec<u8>> {
    match format {
        TableFormat::Csv | TableFormat::Tsv => {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(format.delimiter())
                .has_headers(false)
                .from_writer(Vec::new());

            writer.write_record(headers)?;
            for row in rows {
                writer.serialize(row)?;
            }

            writer
                .into_inner()
                .map_err(|e| MatcherError::IoError(e.into_error()))
        }
        TableFormat::Json => Ok(serde_json::to_vec_pretty(rows)?),
    }
}
