// ==========================================
// 商品导入系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, init_schema, open_and_init};
use crate::importer::DEFAULT_BATCH_SIZE;
use crate::repository::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// 默认输入目录
pub const DEFAULT_INPUT_DIR: &str = "data/input";

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
    // 是否读取环境变量覆写
    use_env: bool,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_and_init(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            use_env: true,
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 并确保建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }

        Ok(Self {
            conn,
            use_env: true,
        })
    }

    /// 包装只读连接（不建表、不改 PRAGMA）
    ///
    /// 说明：调用方需确认 config_kv 已存在；只可调用读取方法。
    pub fn read_only(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            use_env: true,
        }
    }

    /// 忽略环境变量，只读 config_kv 与默认值
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 按 环境变量 > config_kv 的顺序取原始值
    fn lookup(&self, key: &str, env_var: Option<&str>) -> RepositoryResult<Option<(String, &'static str)>> {
        if self.use_env {
            if let Some(value) = env_var.and_then(|name| std::env::var(name).ok()) {
                return Ok(Some((value, "env")));
            }
        }
        Ok(self
            .get_global_config_value(key)?
            .map(|value| (value, "config_kv")))
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn get_batch_size(&self) -> RepositoryResult<usize> {
        let Some((raw, origin)) =
            self.lookup(config_keys::IMPORT_BATCH_SIZE, Some(config_keys::ENV_BATCH_SIZE))?
        else {
            return Ok(DEFAULT_BATCH_SIZE);
        };

        match raw.trim().parse::<usize>() {
            Ok(size) if size > 0 => Ok(size),
            _ => {
                warn!(
                    config_key = config_keys::IMPORT_BATCH_SIZE,
                    raw_value = %raw,
                    origin,
                    "批次大小配置无效，使用默认值"
                );
                Ok(DEFAULT_BATCH_SIZE)
            }
        }
    }

    fn get_input_dir(&self) -> RepositoryResult<PathBuf> {
        let value = self
            .lookup(config_keys::IMPORT_INPUT_DIR, None)?
            .map(|(raw, _)| raw)
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_INPUT_DIR.to_string());
        Ok(PathBuf::from(value.trim()))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导入
    pub const IMPORT_BATCH_SIZE: &str = "import_batch_size";
    pub const IMPORT_INPUT_DIR: &str = "import_input_dir";

    // 环境变量
    pub const ENV_BATCH_SIZE: &str = "PRODUCT_IMPORT_BATCH_SIZE";
    pub const ENV_DB_PATH: &str = "PRODUCT_IMPORT_DB_PATH";
}
