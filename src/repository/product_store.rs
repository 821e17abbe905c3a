// ==========================================
// 商品导入系统 - 商品仓储 Trait
// ==========================================
// 职责: 定义导入流程依赖的商品数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做查找 / 暂存 / 提交
// ==========================================

use crate::domain::Product;
use crate::repository::error::RepositoryResult;

// ==========================================
// ProductStore Trait
// ==========================================
// 实现者: SqliteProductStore（rusqlite）、InMemoryProductStore（测试 / 预演）
pub trait ProductStore {
    /// 按 sku 查找商品
    ///
    /// # 返回
    /// - Ok(Some(Product)): 已暂存或已落库的商品（暂存优先）
    /// - Ok(None): 不存在（不视为错误）
    /// - Err: 底层存储读取失败
    fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>>;

    /// 暂存新建或变更的商品，等待下一次 flush
    ///
    /// 同一 sku 在 flush 前重复暂存时，后一次覆盖前一次。
    fn stage(&mut self, product: Product);

    /// 立即持久化单个新建商品
    ///
    /// 写入后同一次运行中的后续查找必须能看到该商品，
    /// 这样同一 sku 在文件中第二次出现时走更新分支而不是重复创建。
    fn persist_now(&mut self, product: Product) -> RepositoryResult<()>;

    /// 提交所有暂存商品
    ///
    /// # 返回
    /// - Ok(usize): 本次提交的商品数
    /// - Err: 提交失败（导入流程视为致命错误）
    fn flush(&mut self) -> RepositoryResult<usize>;
}

// ==========================================
// StagingArea - 暂存区（按 sku 去重，保持暂存顺序）
// ==========================================
#[derive(Debug, Default)]
pub(crate) struct StagingArea {
    products: Vec<Product>,
}

impl StagingArea {
    pub(crate) fn get(&self, sku: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.sku == sku)
    }

    pub(crate) fn put(&mut self, product: Product) {
        match self.products.iter_mut().find(|p| p.sku == product.sku) {
            Some(slot) => *slot = product,
            None => self.products.push(product),
        }
    }

    pub(crate) fn remove(&mut self, sku: &str) {
        self.products.retain(|p| p.sku != sku);
    }

    pub(crate) fn take(&mut self) -> Vec<Product> {
        std::mem::take(&mut self.products)
    }

    pub(crate) fn len(&self) -> usize {
        self.products.len()
    }
}
