// ==========================================
// 商品导入系统 - 导入模块错误类型
// ==========================================
// 两级错误:
// - 致命（ImportError）: 终止整次运行
// - 可恢复（ValidationError）: 跳过单行，运行继续
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::ImportReport;
use crate::repository::RepositoryError;
use thiserror::Error;

// ==========================================
// SchemaError - 表头校验失败（致命）
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Required columns not found")]
    NoColumns,

    #[error("Required column {0} does not exist")]
    MissingColumn(String),

    #[error("Column {0} is not allowed")]
    UnknownColumn(String),
}

// ==========================================
// ValidationError - 单行校验失败（可恢复）
// ==========================================
// 每个变体对应一条被违反的规则，消息文本保持稳定
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("The record can not be empty.")]
    EmptyRecord,

    // ===== sku =====
    #[error("The sku can not be empty.")]
    SkuEmpty,

    #[error("The sku must be at least 6 characters long.")]
    SkuTooShort,

    #[error("The sku must be no longer than 200 characters.")]
    SkuTooLong,

    #[error("The sku must be alphanumeric with underscore or minus.")]
    SkuInvalidCharacters,

    // ===== description =====
    #[error("The description can not be empty.")]
    DescriptionEmpty,

    #[error("The description must be no longer than 255 characters.")]
    DescriptionTooLong,

    #[error("The description must be alphanumeric.")]
    DescriptionInvalidCharacters,

    // ===== normalPrice =====
    #[error("The normal price can not be empty.")]
    NormalPriceEmpty,

    #[error("The normal price must be positive numeric.")]
    NormalPriceInvalid,

    #[error("The normal price must maximum 2 decimals.")]
    NormalPriceTooPrecise,

    // ===== specialPrice =====
    #[error("The special price must be positive numeric.")]
    SpecialPriceInvalid,

    #[error("The special price must be less than normal price.")]
    SpecialPriceNotLower,

    #[error("The special price must maximum 2 decimals.")]
    SpecialPriceTooPrecise,
}

impl ValidationError {
    /// 违规字段（整行为空时返回 None）
    pub fn field(&self) -> Option<&'static str> {
        use crate::domain::columns;
        use ValidationError::*;

        match self {
            EmptyRecord => None,
            SkuEmpty | SkuTooShort | SkuTooLong | SkuInvalidCharacters => Some(columns::SKU),
            DescriptionEmpty | DescriptionTooLong | DescriptionInvalidCharacters => {
                Some(columns::DESCRIPTION)
            }
            NormalPriceEmpty | NormalPriceInvalid | NormalPriceTooPrecise => {
                Some(columns::NORMAL_PRICE)
            }
            SpecialPriceInvalid | SpecialPriceNotLower | SpecialPriceTooPrecise => {
                Some(columns::SPECIAL_PRICE)
            }
        }
    }
}

// ==========================================
// ImportError - 致命错误
// ==========================================
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("File is not found or corrupted: {0}")]
    SourceUnavailable(String),

    #[error("Unsupported file format: {0} (only .csv/.xlsx/.xls)")]
    UnsupportedFormat(String),

    #[error("Failed to read record source: {0}")]
    SourceRead(String),

    // ===== 表头错误 =====
    #[error(transparent)]
    Schema(#[from] SchemaError),

    // ===== 存储错误（附带已累计的部分报告）=====
    #[error("Product store failure: {source}")]
    Store {
        source: RepositoryError,
        report: Box<ImportReport>,
    },
}

impl ImportError {
    /// 致命错误发生前已累计的部分报告
    pub fn partial_report(&self) -> Option<&ImportReport> {
        match self {
            ImportError::Store { report, .. } => Some(report.as_ref()),
            _ => None,
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::SourceRead(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::SourceRead(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::SourceRead(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
