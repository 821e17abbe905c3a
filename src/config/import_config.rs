// ==========================================
// 商品导入系统 - 导入配置快照
// ==========================================

use crate::config::config_manager::config_keys;
use crate::config::import_config_trait::ImportConfigReader;
use crate::importer::DEFAULT_BATCH_SIZE;
use crate::repository::RepositoryResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const APP_DIR_NAME: &str = "product-import";
const DB_FILE_NAME: &str = "product_import.db";

/// 单次运行使用的配置（运行开始时读取一次）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub batch_size: usize,
    pub input_dir: PathBuf,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            input_dir: PathBuf::from(crate::config::config_manager::DEFAULT_INPUT_DIR),
        }
    }
}

impl ImportConfig {
    pub fn load(reader: &impl ImportConfigReader) -> RepositoryResult<Self> {
        Ok(Self {
            batch_size: reader.get_batch_size()?,
            input_dir: reader.get_input_dir()?,
        })
    }
}

/// 默认数据库路径
///
/// 顺序: PRODUCT_IMPORT_DB_PATH → 用户数据目录/product-import/product_import.db → 当前目录
pub fn default_db_path() -> PathBuf {
    if let Some(path) = std::env::var_os(config_keys::ENV_DB_PATH).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    match dirs::data_dir() {
        Some(dir) => dir.join(APP_DIR_NAME).join(DB_FILE_NAME),
        None => PathBuf::from(DB_FILE_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    struct FixedConfig;

    impl ImportConfigReader for FixedConfig {
        fn get_batch_size(&self) -> RepositoryResult<usize> {
            Ok(7)
        }

        fn get_input_dir(&self) -> RepositoryResult<PathBuf> {
            Ok(PathBuf::from("/tmp/in"))
        }
    }

    #[test]
    fn test_load_from_reader() {
        let config = ImportConfig::load(&FixedConfig).unwrap();
        assert_eq!(config.batch_size, 7);
        assert_eq!(config.input_dir, Path::new("/tmp/in"));
    }

    #[test]
    fn test_default_config() {
        let config = ImportConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.input_dir, Path::new("data/input"));
    }

    #[test]
    fn test_default_db_path_file_name() {
        assert!(default_db_path().to_string_lossy().ends_with(".db")
            || std::env::var_os(config_keys::ENV_DB_PATH).is_some());
    }
}
