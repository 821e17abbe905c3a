// ==========================================
// 商品导入系统 - 导入层
// ==========================================
// 职责: 外部表格数据导入，校验后 upsert 到商品仓储
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod error;
pub mod product_importer;
pub mod record_source;
pub mod validator;

// 重导出核心类型
pub use error::{ImportError, ImportResult, SchemaError, ValidationError};
pub use product_importer::{ImportPipeline, ProductImporter, UpsertOutcome, DEFAULT_BATCH_SIZE};
pub use record_source::{
    open_record_source, resolve_source_path, CsvRecordSource, ExcelRecordSource, RawRecord,
    RecordSource, VecRecordSource,
};

// 重导出 Trait 接口
pub use validator::{ProductValidator, RecordValidator};
