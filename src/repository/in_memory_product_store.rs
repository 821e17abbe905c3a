// ==========================================
// 商品导入系统 - 内存商品仓储
// ==========================================
// 用途: 单元测试 / --dry-run 预演
// 说明: 记录 flush 调用次数，可注入第 N 次 flush 失败
// ==========================================

use crate::domain::Product;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::product_store::{ProductStore, StagingArea};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    committed: BTreeMap<String, Product>,
    staging: StagingArea,
    next_id: i64,
    flush_calls: usize,
    persist_now_calls: usize,
    fail_on_flush: Option<usize>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置已落库商品
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut store = Self::new();
        for product in products {
            store.commit(product);
        }
        store
    }

    /// 第 n 次（从 1 开始）调用 flush 时返回错误
    pub fn fail_on_flush(mut self, n: usize) -> Self {
        self.fail_on_flush = Some(n);
        self
    }

    pub fn flush_count(&self) -> usize {
        self.flush_calls
    }

    pub fn persist_now_count(&self) -> usize {
        self.persist_now_calls
    }

    pub fn get(&self, sku: &str) -> Option<&Product> {
        self.committed.get(sku)
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.staging.len()
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.committed.values()
    }

    fn commit(&mut self, mut product: Product) {
        match product.id {
            Some(id) => self.next_id = self.next_id.max(id),
            None => {
                self.next_id += 1;
                product.id = Some(self.next_id);
            }
        }
        self.committed.insert(product.sku.clone(), product);
    }
}

impl ProductStore for InMemoryProductStore {
    fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>> {
        Ok(self
            .staging
            .get(sku)
            .or_else(|| self.committed.get(sku))
            .cloned())
    }

    fn stage(&mut self, product: Product) {
        self.staging.put(product);
    }

    fn persist_now(&mut self, product: Product) -> RepositoryResult<()> {
        self.persist_now_calls += 1;
        self.staging.remove(&product.sku);
        self.commit(product);
        Ok(())
    }

    fn flush(&mut self) -> RepositoryResult<usize> {
        self.flush_calls += 1;
        if self.fail_on_flush == Some(self.flush_calls) {
            return Err(RepositoryError::DatabaseTransactionError(format!(
                "injected failure on flush #{}",
                self.flush_calls
            )));
        }

        let staged = self.staging.take();
        let count = staged.len();
        for product in staged {
            self.commit(product);
        }
        Ok(count)
    }
}
