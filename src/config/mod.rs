// ==========================================
// 商品导入系统 - 配置层
// ==========================================
// 职责: 导入配置管理，支持环境变量覆写
// 存储: config_kv 表
// 优先级: 环境变量 > config_kv > 默认值
// ==========================================

pub mod config_manager;
pub mod import_config;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use import_config::{default_db_path, ImportConfig};
pub use import_config_trait::ImportConfigReader;
