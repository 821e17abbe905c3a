// ==========================================
// 商品导入系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 表格商品数据校验 + 按 sku upsert 入库
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与值对象
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 记录源、校验、导入流水线
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 报告输出
pub mod report;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{ImportCounters, ImportReport, Price, Product, ProductRecord};

// 导入
pub use importer::{
    open_record_source, ImportError, ImportPipeline, ImportResult, ProductImporter,
    ProductValidator, RecordSource, RecordValidator, ValidationError,
};

// 仓储
pub use repository::{InMemoryProductStore, ProductStore, SqliteProductStore};

// 配置
pub use config::{ConfigManager, ImportConfig, ImportConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
