// ==========================================
// 商品导入系统 - 导入统计与报告
// ==========================================
// 职责: 单次导入运行的计数器 + 最终报告
// 红线: 计数器只增不减，每次运行重新创建
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// ImportCounters - 运行计数器
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCounters {
    pub created: usize,
    pub updated: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl ImportCounters {
    pub fn record_created(&mut self) {
        self.created += 1;
        self.succeeded += 1;
    }

    pub fn record_updated(&mut self) {
        self.updated += 1;
        self.succeeded += 1;
    }

    /// 已存在且内容一致的商品仍计为成功
    pub fn record_unchanged(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    /// 已处理的数据行数
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }
}

// ==========================================
// ImportReport - 导入报告
// ==========================================
// 用途: 交给报告输出端（控制台 / JSON）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub run_id: Uuid,
    pub source_name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub counters: ImportCounters,

    /// 被跳过记录的原因，按源文件行序
    pub errors: Vec<String>,
}

impl ImportReport {
    pub fn new(source_name: Option<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            source_name,
            started_at: Utc::now(),
            finished_at: None,
            counters: ImportCounters::default(),
            errors: Vec::new(),
        }
    }

    pub fn created(&self) -> usize {
        self.counters.created
    }

    pub fn updated(&self) -> usize {
        self.counters.updated
    }

    pub fn succeeded(&self) -> usize {
        self.counters.succeeded
    }

    pub fn failed(&self) -> usize {
        self.counters.failed
    }

    pub fn has_failures(&self) -> bool {
        self.counters.failed > 0
    }

    /// 记录被跳过的一行
    pub fn push_skipped(&mut self, message: String) {
        self.counters.record_failed();
        self.errors.push(message);
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// 运行耗时（毫秒），未结束时返回 None
    pub fn elapsed_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_track_success_kinds() {
        let mut counters = ImportCounters::default();
        counters.record_created();
        counters.record_updated();
        counters.record_unchanged();
        counters.record_failed();

        assert_eq!(counters.created, 1);
        assert_eq!(counters.updated, 1);
        assert_eq!(counters.succeeded, 3);
        assert_eq!(counters.failed, 1);
        assert_eq!(counters.processed(), 4);
    }

    #[test]
    fn test_report_serializes_flat_counts() {
        let mut report = ImportReport::new(Some("products.csv".to_string()));
        report.counters.record_created();
        report.push_skipped("Row 2: The sku can not be empty.".to_string());

        let json = serde_json::to_value(report.finish()).unwrap();
        assert_eq!(json["created"], 1);
        assert_eq!(json["succeeded"], 1);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["errors"][0], "Row 2: The sku can not be empty.");
        assert!(json["finished_at"].is_string());
    }
}
