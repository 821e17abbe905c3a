// ==========================================
// 商品导入系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供商品数据访问接口，屏蔽数据库细节
// 约束: 所有查询使用参数化，防止 SQL 注入
// ==========================================

pub mod error;
pub mod in_memory_product_store;
pub mod product_store;
pub mod product_store_impl;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use in_memory_product_store::InMemoryProductStore;
pub use product_store::ProductStore;
pub use product_store_impl::SqliteProductStore;
