use crate::utils::error::Result;

/// 以名稱讀寫整個檔案的儲存後端。
/// 找不到檔案時 `read_file` 必須回傳 `ErrorKind::NotFound` 的 IO 錯誤，
/// 對應表靠這個區分「尚未建立」與「讀取失敗」。
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn catalog_path(&self) -> &str;
    fn mapping_path(&self) -> &str;
    fn pending_path(&self) -> &str;
    fn search_limit(&self) -> usize;
}
