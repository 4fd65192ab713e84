pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};

#[cfg(feature = "cli")]
mod cli {
    use super::toml_config::{SearchConfig, TomlConfig};
    use crate::utils::error::Result;
    use clap::{Parser, Subcommand};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "stock-matcher")]
    #[command(about = "Match unmatched listings against the stock catalog")]
    pub struct CliConfig {
        /// Path to TOML configuration file
        #[arg(short, long)]
        pub config: Option<String>,

        /// Directory the catalog, mapping and pending files live in
        #[arg(long, default_value = ".")]
        pub data_dir: String,

        #[arg(long)]
        pub catalog: Option<String>,

        #[arg(long)]
        pub mapping: Option<String>,

        #[arg(long)]
        pub pending: Option<String>,

        /// Default number of search results
        #[arg(long)]
        pub limit: Option<usize>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON")]
        pub log_json: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Search the catalog (all terms must match)
        Search {
            #[arg(required = true, num_args = 1..)]
            query: Vec<String>,
            #[arg(long)]
            limit: Option<usize>,
        },
        /// List pending listings that have no mapping yet
        Tasks,
        /// Record the stock code chosen for a listing
        Map { pk_key: String, ez_code: String },
        /// Load the catalog and print cache statistics
        Stats,
    }

    impl CliConfig {
        /// 載入 TOML (若有指定) 後套用命令列覆蓋設定
        pub fn resolve(&self) -> Result<TomlConfig> {
            let mut config = match &self.config {
                Some(path) => TomlConfig::from_file(path)?,
                None => TomlConfig::default(),
            };

            if let Some(catalog) = &self.catalog {
                config.catalog.path = catalog.clone();
            }
            if let Some(mapping) = &self.mapping {
                config.mapping.path = mapping.clone();
            }
            if let Some(pending) = &self.pending {
                config.pending.path = pending.clone();
            }
            if let Some(limit) = self.limit {
                config.search.get_or_insert_with(SearchConfig::default).default_limit = Some(limit);
            }

            Ok(config)
        }
    }

}
