// ==========================================
// 商品导入系统 - 商品记录校验器
// ==========================================
// 职责: 表头校验 + 单行字段校验（sku / description / 价格）
// 说明: 全部为无状态纯函数；RecordValidator 仅作为导入器的注入接缝
// 红线: 只校验不改写（sku/description 原样返回）
// ==========================================

use crate::domain::{columns, parse_price_text, Price, ProductRecord};
use crate::importer::error::{SchemaError, ValidationError};
use std::collections::HashMap;

pub const SKU_MIN_LENGTH: usize = 6;
pub const SKU_MAX_LENGTH: usize = 200;
pub const DESCRIPTION_MAX_LENGTH: usize = 255;

// ==========================================
// RecordValidator Trait
// ==========================================
// 实现者: ProductValidator（默认规则集）
pub trait RecordValidator {
    /// 校验表头（致命：失败则整次运行不处理任何行）
    fn validate_columns(&self, columns: &[String]) -> Result<(), SchemaError>;

    /// 校验单行（可恢复：失败则跳过该行）
    fn validate(&self, record: &HashMap<String, String>) -> Result<ProductRecord, ValidationError>;
}

/// 默认规则集
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductValidator;

impl RecordValidator for ProductValidator {
    fn validate_columns(&self, header: &[String]) -> Result<(), SchemaError> {
        validate_columns(header).map(|_| ())
    }

    fn validate(&self, record: &HashMap<String, String>) -> Result<ProductRecord, ValidationError> {
        validate(record)
    }
}

// ==========================================
// 表头校验
// ==========================================

/// 校验表头列集合
///
/// 顺序: 空表头 → 缺少必填列（按 sku, description, normalPrice）→ 出现未知列（按表头顺序）
pub fn validate_columns(header: &[String]) -> Result<&[String], SchemaError> {
    if header.is_empty() {
        return Err(SchemaError::NoColumns);
    }

    for required in columns::REQUIRED {
        if !header.iter().any(|c| c == required) {
            return Err(SchemaError::MissingColumn(required.to_string()));
        }
    }

    if let Some(unknown) = header
        .iter()
        .find(|c| !columns::ALLOWED.contains(&c.as_str()))
    {
        return Err(SchemaError::UnknownColumn(unknown.clone()));
    }

    Ok(header)
}

// ==========================================
// 单行校验
// ==========================================

/// 校验一行原始数据（首个失败即返回）
pub fn validate(record: &HashMap<String, String>) -> Result<ProductRecord, ValidationError> {
    if record.is_empty() {
        return Err(ValidationError::EmptyRecord);
    }

    let field = |name: &str| record.get(name).map(String::as_str);

    let sku = validate_sku(field(columns::SKU))?;
    let description = validate_description(field(columns::DESCRIPTION))?;
    let normal_price = validate_normal_price(field(columns::NORMAL_PRICE))?;
    let special_price = validate_special_price(normal_price, field(columns::SPECIAL_PRICE))?;

    Ok(ProductRecord {
        sku,
        description,
        normal_price,
        special_price,
    })
}

/// 校验 sku: 非空、长度 6..=200、仅 [a-zA-Z0-9_-]
pub fn validate_sku(raw: Option<&str>) -> Result<String, ValidationError> {
    let sku = non_empty(raw).ok_or(ValidationError::SkuEmpty)?;

    if sku.trim().chars().count() < SKU_MIN_LENGTH {
        return Err(ValidationError::SkuTooShort);
    }
    if sku.chars().count() > SKU_MAX_LENGTH {
        return Err(ValidationError::SkuTooLong);
    }
    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::SkuInvalidCharacters);
    }

    Ok(sku.to_string())
}

/// 校验描述: 非空、最多 255 字符、不含控制字符 / 非 ASCII 字节 / 反引号
pub fn validate_description(raw: Option<&str>) -> Result<String, ValidationError> {
    let description = non_empty(raw).ok_or(ValidationError::DescriptionEmpty)?;

    if description.chars().count() > DESCRIPTION_MAX_LENGTH {
        return Err(ValidationError::DescriptionTooLong);
    }
    if description
        .bytes()
        .any(|b| b < 0x20 || b >= 0x80 || b == b'`')
    {
        return Err(ValidationError::DescriptionInvalidCharacters);
    }

    Ok(description.to_string())
}

/// 校验原价: 非空、非负数字、最多两位小数
pub fn validate_normal_price(raw: Option<&str>) -> Result<Price, ValidationError> {
    let text = non_empty(raw).ok_or(ValidationError::NormalPriceEmpty)?;

    let parsed = parse_price_text(text).map_err(|_| ValidationError::NormalPriceInvalid)?;

    if parsed.exceeds_scale() {
        return Err(ValidationError::NormalPriceTooPrecise);
    }

    Ok(parsed.truncated())
}

/// 校验特价（可选）: 非负数字、严格小于原价、最多两位小数
///
/// 空值返回 Ok(None)。大小比较在精度校验之前进行，且对超精度输入同样精确。
pub fn validate_special_price(
    normal_price: Price,
    raw: Option<&str>,
) -> Result<Option<Price>, ValidationError> {
    let Some(text) = non_empty(raw) else {
        return Ok(None);
    };

    let parsed = parse_price_text(text).map_err(|_| ValidationError::SpecialPriceInvalid)?;

    if parsed.is_at_least(normal_price) {
        return Err(ValidationError::SpecialPriceNotLower);
    }
    if parsed.exceeds_scale() {
        return Err(ValidationError::SpecialPriceTooPrecise);
    }

    Ok(Some(parsed.truncated()))
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.filter(|v| !v.is_empty())
}
