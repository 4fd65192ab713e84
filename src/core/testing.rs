use crate::domain::ports::Storage;
use crate::utils::error::{MatcherError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
pub struct MockStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, path: &str, content: &str) {
        let mut files = self.files.lock().await;
        files.insert(path.to_string(), content.as_bytes().to_vec());
    }

    pub async fn get_file(&self, path: &str) -> Option<String> {
        let files = self.files.lock().await;
        files
            .get(path)
            .map(|data| String::from_utf8_lossy(data).into_owned())
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl Storage for MockStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let files = self.files.lock().await;
        files.get(path).cloned().ok_or_else(|| {
            MatcherError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            ))
        })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(MatcherError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("Read-only storage: {}", path),
            )));
        }
        let mut files = self.files.lock().await;
        files.insert(path.to_string(), data.to_vec());
        Ok(())
    }
}
