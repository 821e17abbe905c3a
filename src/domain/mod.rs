// ==========================================
// 商品导入系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值对象、导入统计
// 红线: 不含数据访问逻辑，不含导入流程逻辑
// ==========================================

pub mod import_report;
pub mod price;
pub mod product;

// 重导出核心类型
pub use import_report::{ImportCounters, ImportReport};
pub use price::{parse_price_text, ParsedPrice, Price, PriceParseError};
pub use product::{columns, Product, ProductRecord};
