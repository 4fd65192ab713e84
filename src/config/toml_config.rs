use crate::core::search::DEFAULT_SEARCH_LIMIT;
use crate::core::ConfigProvider;
use crate::utils::error::{MatcherError, Result};
use crate::utils::validation::{validate_range, validate_table_path, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CATALOG_PATH: &str = "stock_data.csv";
pub const DEFAULT_MAPPING_PATH: &str = "mapping_dictionary.csv";
pub const DEFAULT_PENDING_PATH: &str = "manual_match_list.csv";
pub const MAX_SEARCH_LIMIT: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub catalog: TableConfig,
    pub mapping: TableConfig,
    pub pending: TableConfig,
    pub search: Option<SearchConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
    pub verbose: Option<bool>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            catalog: TableConfig {
                path: DEFAULT_CATALOG_PATH.to_string(),
            },
            mapping: TableConfig {
                path: DEFAULT_MAPPING_PATH.to_string(),
            },
            pending: TableConfig {
                path: DEFAULT_PENDING_PATH.to_string(),
            },
            search: None,
            logging: None,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MatcherError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MatcherError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_FILE})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MatcherError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn default_limit(&self) -> usize {
        self.search
            .as_ref()
            .and_then(|s| s.default_limit)
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
    }

    pub fn json_logging(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn verbose_logging(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_table_path("catalog.path", &self.catalog.path)?;
        validate_table_path("mapping.path", &self.mapping.path)?;
        validate_table_path("pending.path", &self.pending.path)?;
        validate_range("search.default_limit", self.default_limit(), 1, MAX_SEARCH_LIMIT)?;
        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn catalog_path(&self) -> &str {
        &self.catalog.path
    }

    fn mapping_path(&self) -> &str {
        &self.mapping.path
    }

    fn pending_path(&self) -> &str {
        &self.pending.path
    }

    fn search_limit(&self) -> usize {
        self.default_limit()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
