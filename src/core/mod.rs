pub mod catalog;
pub mod engine;
pub mod mapping;
pub mod normalize;
pub mod reconcile;
pub mod search;
pub mod tabular;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{MappingEntry, PendingTask, RecordStatus, StockItem};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
