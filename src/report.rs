// ==========================================
// 商品导入系统 - 导入报告输出
// ==========================================
// 职责: 把 ImportReport 交给外部（控制台 / JSON）
// 红线: 输出端只读报告，不影响导入结果与退出码
// ==========================================

use crate::domain::ImportReport;
use std::io::{self, Write};

/// 控制台标题
pub const REPORT_TITLE: &str = "Attempting to import product";

// ==========================================
// ReportSink Trait
// ==========================================
pub trait ReportSink {
    fn publish(&mut self, report: &ImportReport) -> io::Result<()>;
}

// ==========================================
// ConsoleReportSink - 人类可读摘要
// ==========================================
pub struct ConsoleReportSink<W: Write> {
    out: W,
}

impl ConsoleReportSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReportSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// 只输出标题（在导入开始前调用）
    pub fn title(&mut self) -> io::Result<()> {
        writeln!(self.out, "{REPORT_TITLE}")?;
        writeln!(self.out, "{}", "=".repeat(REPORT_TITLE.len()))?;
        writeln!(self.out)
    }
}

impl<W: Write> ReportSink for ConsoleReportSink<W> {
    fn publish(&mut self, report: &ImportReport) -> io::Result<()> {
        if let Some(name) = &report.source_name {
            writeln!(self.out, " // Source: {name}")?;
            writeln!(self.out)?;
        }

        if report.has_failures() {
            writeln!(
                self.out,
                " [CAUTION] {} invalid products are skipped",
                report.failed()
            )?;
            for message in &report.errors {
                writeln!(self.out, "  * {message}")?;
            }
            writeln!(self.out)?;
        }

        writeln!(self.out, " ! [NOTE] {} Created Products.", report.created())?;
        writeln!(self.out, " ! [NOTE] {} Updated Products.", report.updated())?;
        writeln!(self.out)?;
        writeln!(
            self.out,
            " [OK] {} products are imported successfully.",
            report.succeeded()
        )?;
        self.out.flush()
    }
}

// ==========================================
// JsonReportSink - 结构化输出
// ==========================================
pub struct JsonReportSink<W: Write> {
    out: W,
    pretty: bool,
}

impl JsonReportSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonReportSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, pretty: true }
    }

    /// 单行输出（便于日志采集）
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for JsonReportSink<W> {
    fn publish(&mut self, report: &ImportReport) -> io::Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, report)?;
        } else {
            serde_json::to_writer(&mut self.out, report)?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}
