// ==========================================
// 商品导入系统 - 商品仓储 SQLite 实现
// ==========================================
// 职责: product 表的查找 / 暂存 / 事务化提交
// 约束: 所有查询使用参数化；价格以整数分落库
// ==========================================

use crate::db::open_and_init;
use crate::domain::{Price, Product};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::product_store::{ProductStore, StagingArea};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

const UPSERT_PRODUCT_SQL: &str = r#"
    INSERT INTO product (
        sku, description, normal_price_cents, special_price_cents, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(sku) DO UPDATE SET
        description = excluded.description,
        normal_price_cents = excluded.normal_price_cents,
        special_price_cents = excluded.special_price_cents,
        updated_at = excluded.updated_at
"#;

const SELECT_PRODUCT_COLUMNS: &str = r#"
    SELECT id, sku, description, normal_price_cents, special_price_cents, created_at, updated_at
    FROM product
"#;

// ==========================================
// SqliteProductStore
// ==========================================
pub struct SqliteProductStore {
    conn: Arc<Mutex<Connection>>,
    staging: StagingArea,
}

impl SqliteProductStore {
    /// 打开数据库文件（不存在则建库）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_and_init(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建仓储实例（连接需已建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            staging: StagingArea::default(),
        }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 已落库商品数
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM product", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// 暂存区中尚未提交的商品数
    pub fn pending(&self) -> usize {
        self.staging.len()
    }

    /// 按 sku 排序列出所有已落库商品
    pub fn list_all(&self) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{SELECT_PRODUCT_COLUMNS} ORDER BY sku"))?;
        let rows = stmt.query_map([], read_product_row)?;

        let mut products = Vec::new();
        for row in rows {
            products.push(into_product(row?)?);
        }
        Ok(products)
    }

    fn find_committed(&self, sku: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                &format!("{SELECT_PRODUCT_COLUMNS} WHERE sku = ?1"),
                params![sku],
                read_product_row,
            )
            .optional()?;

        row.map(into_product).transpose()
    }

    /// 在事务中写入商品（按 sku upsert）
    fn upsert_tx(tx: &Transaction, products: &[Product]) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(UPSERT_PRODUCT_SQL)?;

        let mut count = 0;
        for product in products {
            stmt.execute(params![
                product.sku,
                product.description,
                product.normal_price.cents(),
                product.special_price.map(|p| p.cents()),
                product.created_at,
                product.updated_at,
            ])?;
            count += 1;
        }

        Ok(count)
    }

    fn write_products(&self, products: &[Product]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let count = Self::upsert_tx(&tx, products)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }
}

impl ProductStore for SqliteProductStore {
    fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>> {
        if let Some(staged) = self.staging.get(sku) {
            return Ok(Some(staged.clone()));
        }
        self.find_committed(sku)
    }

    fn stage(&mut self, product: Product) {
        self.staging.put(product);
    }

    fn persist_now(&mut self, product: Product) -> RepositoryResult<()> {
        self.staging.remove(&product.sku);
        self.write_products(std::slice::from_ref(&product))?;
        Ok(())
    }

    fn flush(&mut self) -> RepositoryResult<usize> {
        let staged = self.staging.take();
        if staged.is_empty() {
            return Ok(0);
        }
        self.write_products(&staged)
    }
}

// ==========================================
// 行映射
// ==========================================
type ProductRow = (
    i64,
    String,
    String,
    i64,
    Option<i64>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn read_product_row(row: &Row<'_>) -> rusqlite::Result<ProductRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn into_product(row: ProductRow) -> RepositoryResult<Product> {
    let (id, sku, description, normal_cents, special_cents, created_at, updated_at) = row;

    if normal_cents < 0 || special_cents.is_some_and(|c| c < 0) {
        return Err(RepositoryError::FieldValueError {
            field: "price".to_string(),
            message: format!("negative price stored for sku {sku}"),
        });
    }

    Ok(Product {
        id: Some(id),
        sku,
        description,
        normal_price: Price::from_cents(normal_cents),
        special_price: special_cents.map(Price::from_cents),
        created_at,
        updated_at,
    })
}
