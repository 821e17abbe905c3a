// ==========================================
// 商品导入系统 - 商品领域模型
// ==========================================
// 职责: Product 持久化实体 + ProductRecord 校验后的行记录
// 红线: sku 为唯一业务键（区分大小写），本系统从不删除商品
// ==========================================

use crate::domain::price::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// 列名常量（表头即 schema）
// ==========================================
pub mod columns {
    pub const SKU: &str = "sku";
    pub const DESCRIPTION: &str = "description";
    pub const NORMAL_PRICE: &str = "normalPrice";
    pub const SPECIAL_PRICE: &str = "specialPrice";

    /// 必填列
    pub const REQUIRED: [&str; 3] = [SKU, DESCRIPTION, NORMAL_PRICE];

    /// 允许出现的全部列
    pub const ALLOWED: [&str; 4] = [SKU, DESCRIPTION, NORMAL_PRICE, SPECIAL_PRICE];
}

// ==========================================
// ProductRecord - 校验后的行记录
// ==========================================
// 生命周期: 仅在单行导入流程内，校验通过后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub sku: String,
    pub description: String,
    pub normal_price: Price,
    pub special_price: Option<Price>,
}

impl ProductRecord {
    /// 还原为原始列映射（价格按两位小数输出）
    pub fn to_fields(&self) -> HashMap<String, String> {
        let mut fields = HashMap::new();
        fields.insert(columns::SKU.to_string(), self.sku.clone());
        fields.insert(columns::DESCRIPTION.to_string(), self.description.clone());
        fields.insert(
            columns::NORMAL_PRICE.to_string(),
            self.normal_price.to_string(),
        );
        if let Some(special) = self.special_price {
            fields.insert(columns::SPECIAL_PRICE.to_string(), special.to_string());
        }
        fields
    }
}

// ==========================================
// Product - 商品实体
// ==========================================
// 对齐: product 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    // ===== 主键 =====
    pub id: Option<i64>, // 自增主键（未落库时为 None）

    // ===== 业务字段 =====
    pub sku: String,
    pub description: String,
    #[serde(with = "price_cents")]
    pub normal_price: Price,
    #[serde(with = "optional_price_cents")]
    pub special_price: Option<Price>,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// 由校验后的记录创建新商品
    pub fn from_record(record: &ProductRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            sku: record.sku.clone(),
            description: record.description.clone(),
            normal_price: record.normal_price,
            special_price: record.special_price,
            created_at: now,
            updated_at: now,
        }
    }

    /// 任一业务字段与记录不同即视为变更（价格按数值比较）
    pub fn differs_from(&self, record: &ProductRecord) -> bool {
        self.sku != record.sku
            || self.description != record.description
            || self.normal_price != record.normal_price
            || self.special_price != record.special_price
    }

    /// 以记录内容原地更新
    pub fn apply(&mut self, record: &ProductRecord, now: DateTime<Utc>) {
        self.sku = record.sku.clone();
        self.description = record.description.clone();
        self.normal_price = record.normal_price;
        self.special_price = record.special_price;
        self.updated_at = now;
    }
}

mod price_cents {
    use crate::domain::price::Price;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(price: &Price, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(price.cents())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Price, D::Error> {
        i64::deserialize(d).map(Price::from_cents)
    }
}

mod optional_price_cents {
    use crate::domain::price::Price;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(price: &Option<Price>, s: S) -> Result<S::Ok, S::Error> {
        match price {
            Some(p) => s.serialize_some(&p.cents()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Price>, D::Error> {
        Option::<i64>::deserialize(d).map(|v| v.map(Price::from_cents))
    }
}
