// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use product_import::config::ImportConfigReader;
use product_import::repository::RepositoryResult;
use std::path::PathBuf;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub batch_size: usize,
    pub input_dir: PathBuf,
}

impl MockConfig {
    pub fn new(batch_size: usize, input_dir: impl Into<PathBuf>) -> Self {
        Self {
            batch_size,
            input_dir: input_dir.into(),
        }
    }
}

impl ImportConfigReader for MockConfig {
    fn get_batch_size(&self) -> RepositoryResult<usize> {
        Ok(self.batch_size)
    }

    fn get_input_dir(&self) -> RepositoryResult<PathBuf> {
        Ok(self.input_dir.clone())
    }
}
