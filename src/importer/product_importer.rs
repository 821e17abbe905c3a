// ==========================================
// 商品导入系统 - 商品导入流水线
// ==========================================
// 职责: 记录源 → 校验 → upsert 判定 → ProductStore，分批 flush 并累计计数
// 流程: 表头校验 → 逐行校验（失败跳过）→ 查找 → 新建/更新/不变 → 批次 flush → 末尾 flush
// 红线: 单线程顺序处理；新建商品立即提交，后续同 sku 行必须走更新分支
// ==========================================

use crate::domain::{ImportReport, Product, ProductRecord};
use crate::importer::error::{ImportError, ImportResult, ValidationError};
use crate::importer::record_source::{RawRecord, RecordSource};
use crate::importer::validator::{ProductValidator, RecordValidator};
use crate::repository::{ProductStore, RepositoryError, RepositoryResult};
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

/// 默认批次大小（每累计 N 次新建/更新 flush 一次）
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// 单条记录的 upsert 结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

// ==========================================
// ProductImporter - 导入流水线
// ==========================================
pub struct ProductImporter<S, V = ProductValidator>
where
    S: ProductStore,
    V: RecordValidator,
{
    store: S,
    validator: V,
    batch_size: usize,
}

/// 流水线别名
pub type ImportPipeline<S, V = ProductValidator> = ProductImporter<S, V>;

impl<S: ProductStore> ProductImporter<S> {
    /// 使用默认校验规则创建导入器
    pub fn new(store: S) -> Self {
        Self::with_validator(store, ProductValidator)
    }
}

impl<S, V> ProductImporter<S, V>
where
    S: ProductStore,
    V: RecordValidator,
{
    pub fn with_validator(store: S, validator: V) -> Self {
        Self {
            store,
            validator,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// 设置批次大小（最小为 1）
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// 执行一次完整导入
    ///
    /// # 返回
    /// - Ok(ImportReport): 运行结束（可能含被跳过的行）
    /// - Err(ImportError::Schema): 表头不合法，未处理任何行
    /// - Err(ImportError::Store): 查找或 flush 失败，携带已累计的部分报告
    /// - Err(ImportError::SourceRead): 记录源中途读取失败
    #[instrument(skip(self, source), fields(source = source.name().unwrap_or("-"), batch_size = self.batch_size))]
    pub fn import_all(&mut self, source: &mut dyn RecordSource) -> ImportResult<ImportReport> {
        self.validator.validate_columns(source.header())?;

        let mut report = ImportReport::new(source.name().map(str::to_string));
        info!(run_id = %report.run_id, "开始导入商品");

        // 本批次内已新建/更新的数量
        let mut pending = 0usize;

        for next in source {
            let raw = next?;

            let record = match self.validator.validate(&raw.fields) {
                Ok(record) => record,
                Err(e) => {
                    let message = skip_message(&raw, &e);
                    warn!(field = e.field().unwrap_or("-"), "Skip product import: {}", message);
                    report.push_skipped(message);
                    continue;
                }
            };

            let outcome = match self.upsert(&record) {
                Ok(outcome) => outcome,
                Err(e) => return Err(store_failure(e, report)),
            };

            match outcome {
                UpsertOutcome::Created => {
                    report.counters.record_created();
                    pending += 1;
                }
                UpsertOutcome::Updated => {
                    report.counters.record_updated();
                    pending += 1;
                }
                UpsertOutcome::Unchanged => report.counters.record_unchanged(),
            }

            if pending >= self.batch_size {
                if let Err(e) = self.flush_batch(pending) {
                    return Err(store_failure(e, report));
                }
                pending = 0;
            }
        }

        // 末尾无条件 flush 一次（覆盖不足一批的尾部）
        if let Err(e) = self.flush_batch(pending) {
            return Err(store_failure(e, report));
        }

        let report = report.finish();
        info!(
            run_id = %report.run_id,
            created = report.created(),
            updated = report.updated(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            elapsed_ms = report.elapsed_ms().unwrap_or_default(),
            "商品导入完成"
        );

        Ok(report)
    }

    /// 按 sku upsert 一条已校验记录
    ///
    /// 新建走 persist_now 立即提交；更新只暂存，等待批次 flush。
    pub fn upsert(&mut self, record: &ProductRecord) -> RepositoryResult<UpsertOutcome> {
        let now = Utc::now();

        match self.store.find_by_sku(&record.sku)? {
            None => {
                self.store.persist_now(Product::from_record(record, now))?;
                debug!(sku = %record.sku, "新建商品");
                Ok(UpsertOutcome::Created)
            }
            Some(mut existing) if existing.differs_from(record) => {
                existing.apply(record, now);
                self.store.stage(existing);
                debug!(sku = %record.sku, "更新商品");
                Ok(UpsertOutcome::Updated)
            }
            Some(_) => Ok(UpsertOutcome::Unchanged),
        }
    }

    fn flush_batch(&mut self, pending: usize) -> RepositoryResult<()> {
        let flushed = self.store.flush()?;
        info!(pending, flushed, "商品批次已提交");
        Ok(())
    }
}

/// 被跳过行的报告消息
fn skip_message(raw: &RawRecord, err: &ValidationError) -> String {
    match raw.get(crate::domain::columns::SKU).filter(|s| !s.is_empty()) {
        Some(sku) => format!("Row {} (sku {}): {}", raw.row_number, sku, err),
        None => format!("Row {}: {}", raw.row_number, err),
    }
}

fn store_failure(source: RepositoryError, report: ImportReport) -> ImportError {
    error!(
        run_id = %report.run_id,
        created = report.created(),
        updated = report.updated(),
        error = %source,
        "商品仓储失败，导入中止"
    );
    ImportError::Store {
        source,
        report: Box::new(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::SchemaError;
    use crate::importer::record_source::VecRecordSource;
    use crate::repository::InMemoryProductStore;
    use std::collections::HashMap;

    const FULL_HEADER: [&str; 4] = ["sku", "description", "normalPrice", "specialPrice"];

    fn source(rows: Vec<Vec<&str>>) -> VecRecordSource {
        VecRecordSource::new(FULL_HEADER, rows)
    }

    fn bp063_record() -> ProductRecord {
        ProductRecord {
            sku: "BP063-0001".to_string(),
            description: "Product 1 description".to_string(),
            normal_price: "44.99".parse().unwrap(),
            special_price: Some("22.99".parse().unwrap()),
        }
    }

    fn generated_rows(count: usize, description: &str) -> Vec<Vec<String>> {
        (1..=count)
            .map(|i| {
                vec![
                    format!("SKU-{i:05}"),
                    description.to_string(),
                    "10.00".to_string(),
                    String::new(),
                ]
            })
            .collect()
    }

    #[test]
    fn test_new_product_is_created() {
        let mut importer = ProductImporter::new(InMemoryProductStore::new());
        let report = importer
            .import_all(&mut source(vec![vec![
                "BP063-0001",
                "Product 1 description",
                "44.99",
                "22.99",
            ]]))
            .unwrap();

        assert_eq!(report.created(), 1);
        assert_eq!(report.updated(), 0);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 0);
        assert!(report.finished_at.is_some());

        let stored = importer.store().get("BP063-0001").unwrap();
        assert_eq!(stored.special_price.map(|p| p.cents()), Some(2299));
    }

    #[test]
    fn test_identical_existing_product_is_unchanged() {
        let existing = Product::from_record(&bp063_record(), Utc::now());
        let mut importer = ProductImporter::new(InMemoryProductStore::with_products([existing]));

        let report = importer
            .import_all(&mut source(vec![vec![
                "BP063-0001",
                "Product 1 description",
                "44.99",
                "22.99",
            ]]))
            .unwrap();

        assert_eq!(report.created(), 0);
        assert_eq!(report.updated(), 0);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 0);
    }

    #[test]
    fn test_changed_existing_product_is_updated() {
        let existing = Product::from_record(&bp063_record(), Utc::now());
        let mut importer = ProductImporter::new(InMemoryProductStore::with_products([existing]));

        let report = importer
            .import_all(&mut source(vec![vec![
                "BP063-0001",
                "Product 1 description",
                "44.9",
                "",
            ]]))
            .unwrap();

        assert_eq!(report.updated(), 1);
        assert_eq!(report.succeeded(), 1);

        let stored = importer.store().get("BP063-0001").unwrap();
        assert_eq!(stored.normal_price.cents(), 4490);
        assert_eq!(stored.special_price, None);
        assert_eq!(stored.id, Some(1));
    }

    #[test]
    fn test_short_sku_is_skipped() {
        let mut importer = ProductImporter::new(InMemoryProductStore::new());
        let report = importer
            .import_all(&mut source(vec![vec!["abc", "Product", "44.99", ""]]))
            .unwrap();

        assert_eq!(report.created(), 0);
        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.errors,
            vec!["Row 1 (sku abc): The sku must be at least 6 characters long."]
        );
        assert!(importer.store().is_empty());
    }

    #[test]
    fn test_skip_message_without_sku() {
        let mut importer = ProductImporter::new(InMemoryProductStore::new());
        let report = importer
            .import_all(&mut source(vec![
                vec!["BP063-0001", "Product", "1.00", ""],
                vec![],
                vec!["", "Product", "1.00", ""],
            ]))
            .unwrap();

        assert_eq!(report.succeeded(), 1);
        assert_eq!(
            report.errors,
            vec![
                "Row 2: The record can not be empty.",
                "Row 3: The sku can not be empty."
            ]
        );
    }

    #[test]
    fn test_duplicate_sku_in_one_run_creates_then_updates() {
        let mut importer = ProductImporter::new(InMemoryProductStore::new());
        let report = importer
            .import_all(&mut source(vec![
                vec!["BP063-0001", "First", "44.99", ""],
                vec!["BP063-0001", "Second", "44.99", ""],
            ]))
            .unwrap();

        assert_eq!(report.created(), 1);
        assert_eq!(report.updated(), 1);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(importer.store().len(), 1);
        assert_eq!(importer.store().get("BP063-0001").unwrap().description, "Second");
    }

    #[test]
    fn test_repeated_update_within_batch_sees_staged_values() {
        let existing = Product::from_record(&bp063_record(), Utc::now());
        let mut importer = ProductImporter::new(InMemoryProductStore::with_products([existing]));

        let report = importer
            .import_all(&mut source(vec![
                vec!["BP063-0001", "Changed", "44.99", "22.99"],
                vec!["BP063-0001", "Changed", "44.99", "22.99"],
            ]))
            .unwrap();

        assert_eq!(report.updated(), 1);
        assert_eq!(report.succeeded(), 2);
    }

    #[test]
    fn test_batch_boundary_flush_count() {
        let mut importer = ProductImporter::new(InMemoryProductStore::new());
        let report = importer
            .import_all(&mut VecRecordSource::new(FULL_HEADER, generated_rows(150, "Generated")))
            .unwrap();

        assert_eq!(report.created(), 150);
        assert_eq!(importer.store().flush_count(), 2);
        assert_eq!(importer.store().persist_now_count(), 150);
        assert_eq!(importer.store().len(), 150);
    }

    #[test]
    fn test_updates_count_towards_batch() {
        let mut importer = ProductImporter::new(InMemoryProductStore::new()).with_batch_size(50);
        importer
            .import_all(&mut VecRecordSource::new(FULL_HEADER, generated_rows(120, "Original")))
            .unwrap();
        assert_eq!(importer.store().flush_count(), 3);

        let report = importer
            .import_all(&mut VecRecordSource::new(FULL_HEADER, generated_rows(120, "Changed")))
            .unwrap();

        assert_eq!(report.updated(), 120);
        assert_eq!(importer.store().flush_count(), 6);
        assert_eq!(importer.store().pending(), 0);
        assert!(importer.store().products().all(|p| p.description == "Changed"));
    }

    #[test]
    fn test_unchanged_rows_do_not_count_towards_batch() {
        let mut importer = ProductImporter::new(InMemoryProductStore::new()).with_batch_size(10);
        importer
            .import_all(&mut VecRecordSource::new(FULL_HEADER, generated_rows(5, "Same")))
            .unwrap();

        importer
            .import_all(&mut VecRecordSource::new(FULL_HEADER, generated_rows(30, "Same")))
            .unwrap();

        // 第一次: 末尾 1 次；第二次: 25 个新建 → 第 10、20 个触发 + 末尾 1 次
        assert_eq!(importer.store().flush_count(), 4);
    }

    #[test]
    fn test_batch_size_has_floor_of_one() {
        let importer = ProductImporter::new(InMemoryProductStore::new()).with_batch_size(0);
        assert_eq!(importer.batch_size(), 1);
    }

    #[test]
    fn test_invalid_header_aborts_before_rows() {
        let mut importer = ProductImporter::new(InMemoryProductStore::new());
        let mut rows = VecRecordSource::new(["sku", "normalPrice"], vec![vec!["BP063-0001", "1.00"]]);

        let err = importer.import_all(&mut rows).unwrap_err();
        assert!(matches!(
            err,
            ImportError::Schema(SchemaError::MissingColumn(ref c)) if c == "description"
        ));
        assert!(err.partial_report().is_none());
        assert_eq!(importer.store().flush_count(), 0);
        // 记录源未被消费
        assert!(rows.next().is_some());
    }

    #[test]
    fn test_flush_failure_exposes_partial_report() {
        let mut importer = ProductImporter::new(InMemoryProductStore::new().fail_on_flush(1));
        let err = importer
            .import_all(&mut VecRecordSource::new(FULL_HEADER, generated_rows(150, "Generated")))
            .unwrap_err();

        let partial = err.partial_report().unwrap();
        assert_eq!(partial.created(), 100);
        assert!(partial.finished_at.is_none());
        // 新建商品已逐条提交
        assert_eq!(importer.store().len(), 100);
    }

    struct FailingLookupStore;

    impl ProductStore for FailingLookupStore {
        fn find_by_sku(&self, _sku: &str) -> RepositoryResult<Option<Product>> {
            Err(RepositoryError::DatabaseQueryError("connection lost".to_string()))
        }

        fn stage(&mut self, _product: Product) {}

        fn persist_now(&mut self, _product: Product) -> RepositoryResult<()> {
            Ok(())
        }

        fn flush(&mut self) -> RepositoryResult<usize> {
            Ok(0)
        }
    }

    #[test]
    fn test_lookup_failure_is_fatal() {
        let mut importer = ProductImporter::new(FailingLookupStore);
        let err = importer
            .import_all(&mut source(vec![
                vec!["abc", "Skipped first", "1.00", ""],
                vec!["BP063-0001", "Product", "1.00", ""],
            ]))
            .unwrap_err();

        assert!(matches!(err, ImportError::Store { .. }));
        assert_eq!(err.partial_report().unwrap().failed(), 1);
        assert!(err.to_string().contains("connection lost"));
    }

    /// 只接受 sku 以 "OK" 开头的记录
    struct PrefixValidator;

    impl RecordValidator for PrefixValidator {
        fn validate_columns(&self, _columns: &[String]) -> Result<(), SchemaError> {
            Ok(())
        }

        fn validate(
            &self,
            record: &HashMap<String, String>,
        ) -> Result<ProductRecord, ValidationError> {
            let sku = record.get("sku").cloned().unwrap_or_default();
            if !sku.starts_with("OK") {
                return Err(ValidationError::SkuInvalidCharacters);
            }
            Ok(ProductRecord {
                sku,
                description: "injected".to_string(),
                normal_price: "1.00".parse().unwrap(),
                special_price: None,
            })
        }
    }

    #[test]
    fn test_injected_validator() {
        let mut importer =
            ProductImporter::with_validator(InMemoryProductStore::new(), PrefixValidator);
        let report = importer
            .import_all(&mut VecRecordSource::new(
                ["sku", "anything"],
                vec![vec!["OK1", "x"], vec!["NO1", "y"]],
            ))
            .unwrap();

        assert_eq!(report.created(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(importer.store().get("OK1").unwrap().description, "injected");
    }
}
