// ==========================================
// 商品导入系统 - 记录源
// ==========================================
// 职责: 读取表头一次，然后逐行产出 列名 → 原始值 映射
// 支持: CSV (.csv) / Excel (.xlsx/.xls) / 内存数据
// 红线: 文件不可读必须在产出任何行之前失败
//       单元格原样交给校验器，不 trim、不清洗；非 UTF-8 字节按 U+FFFD 保留
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, Reader};
use csv::{ByteRecord, ReaderBuilder};
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

// ==========================================
// RawRecord - 未经校验的一行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 数据行序号（从 1 开始，不含表头）
    pub row_number: usize,
    pub fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

// ==========================================
// RecordSource Trait
// ==========================================
// 单次遍历、惰性、有限
pub trait RecordSource: Iterator<Item = ImportResult<RawRecord>> {
    /// 表头列名（按源文件顺序）
    fn header(&self) -> &[String];

    /// 来源名称（文件名），用于报告
    fn name(&self) -> Option<&str> {
        None
    }
}

/// 按位置把单元格对应到列名（列名为空的列忽略，值不做任何修剪）
fn zip_row(columns: &[String], cells: impl Iterator<Item = String>) -> HashMap<String, String> {
    columns
        .iter()
        .zip(cells)
        .filter(|(column, _)| !column.is_empty())
        .map(|(column, value)| (column.clone(), value))
        .collect()
}

fn decode_cell(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn named_columns(columns: &[String]) -> Vec<String> {
    columns.iter().filter(|c| !c.is_empty()).cloned().collect()
}

fn is_blank(fields: &HashMap<String, String>) -> bool {
    fields.values().all(|v| v.trim().is_empty())
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_string())
}

// ==========================================
// CSV 记录源
// ==========================================
pub struct CsvRecordSource<R: Read> {
    reader: csv::Reader<R>,
    columns: Vec<String>,
    header: Vec<String>,
    name: Option<String>,
    buffer: ByteRecord,
    row_number: usize,
}

impl CsvRecordSource<File> {
    pub fn open(path: &Path) -> ImportResult<Self> {
        let file = File::open(path)
            .map_err(|e| ImportError::SourceUnavailable(format!("{}: {}", path.display(), e)))?;
        let mut source = Self::from_reader(file)?;
        source.name = file_name_of(path);
        Ok(source)
    }
}

impl<R: Read> CsvRecordSource<R> {
    pub fn from_reader(input: R) -> ImportResult<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(input);

        let columns: Vec<String> = reader
            .byte_headers()
            .map_err(|e| ImportError::SourceUnavailable(e.to_string()))?
            .iter()
            .map(|h| decode_cell(h).trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        Ok(Self {
            reader,
            header: named_columns(&columns),
            columns,
            name: None,
            buffer: ByteRecord::new(),
            row_number: 0,
        })
    }
}

impl<R: Read> Iterator for CsvRecordSource<R> {
    type Item = ImportResult<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.read_byte_record(&mut self.buffer) {
                Ok(false) => return None,
                Err(e) => return Some(Err(e.into())),
                Ok(true) => {
                    let fields = zip_row(&self.columns, self.buffer.iter().map(decode_cell));
                    // 跳过完全空白的行
                    if is_blank(&fields) {
                        continue;
                    }
                    self.row_number += 1;
                    return Some(Ok(RawRecord {
                        row_number: self.row_number,
                        fields,
                    }));
                }
            }
        }
    }
}

impl<R: Read> RecordSource for CsvRecordSource<R> {
    fn header(&self) -> &[String] {
        &self.header
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

// ==========================================
// Excel 记录源（读取第一个 sheet）
// ==========================================
pub struct ExcelRecordSource {
    columns: Vec<String>,
    header: Vec<String>,
    rows: VecDeque<Vec<String>>,
    name: Option<String>,
    row_number: usize,
}

impl ExcelRecordSource {
    pub fn open(path: &Path) -> ImportResult<Self> {
        let unavailable = |detail: String| {
            ImportError::SourceUnavailable(format!("{}: {}", path.display(), detail))
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| unavailable(e.to_string()))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| unavailable("workbook has no sheets".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| unavailable(e.to_string()))?;

        let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());

        let columns: Vec<String> = rows
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        Ok(Self {
            header: named_columns(&columns),
            columns,
            rows: rows.collect(),
            name: file_name_of(path),
            row_number: 0,
        })
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

impl Iterator for ExcelRecordSource {
    type Item = ImportResult<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(cells) = self.rows.pop_front() {
            let fields = zip_row(&self.columns, cells.into_iter());
            if is_blank(&fields) {
                continue;
            }
            self.row_number += 1;
            return Some(Ok(RawRecord {
                row_number: self.row_number,
                fields,
            }));
        }
        None
    }
}

impl RecordSource for ExcelRecordSource {
    fn header(&self) -> &[String] {
        &self.header
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

// ==========================================
// 内存记录源
// ==========================================
// 用途: 测试与程序化调用；不跳过空白行
#[derive(Debug, Clone, Default)]
pub struct VecRecordSource {
    header: Vec<String>,
    rows: VecDeque<Vec<String>>,
    row_number: usize,
}

impl VecRecordSource {
    pub fn new<H, R>(header: impl IntoIterator<Item = H>, rows: impl IntoIterator<Item = Vec<R>>) -> Self
    where
        H: Into<String>,
        R: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
            row_number: 0,
        }
    }
}

impl Iterator for VecRecordSource {
    type Item = ImportResult<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let cells = self.rows.pop_front()?;
        self.row_number += 1;
        Some(Ok(RawRecord {
            row_number: self.row_number,
            fields: zip_row(&self.header, cells.into_iter()),
        }))
    }
}

impl RecordSource for VecRecordSource {
    fn header(&self) -> &[String] {
        &self.header
    }
}

// ==========================================
// 记录源工厂（根据扩展名自动选择）
// ==========================================

/// 定位输入文件: 按给定路径查找，找不到且为相对路径时再到输入目录下查找
pub fn resolve_source_path(path: &Path, input_dir: Option<&Path>) -> ImportResult<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    if let Some(dir) = input_dir.filter(|_| path.is_relative()) {
        let candidate = dir.join(path);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(ImportError::SourceUnavailable(path.display().to_string()))
}

/// 打开记录源
pub fn open_record_source(
    path: &Path,
    input_dir: Option<&Path>,
) -> ImportResult<Box<dyn RecordSource>> {
    let resolved = resolve_source_path(path, input_dir)?;
    let ext = resolved
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    debug!(path = %resolved.display(), format = %ext, "打开记录源");

    match ext.as_str() {
        "csv" => Ok(Box::new(CsvRecordSource::open(&resolved)?)),
        "xlsx" | "xls" => Ok(Box::new(ExcelRecordSource::open(&resolved)?)),
        _ => Err(ImportError::UnsupportedFormat(ext)),
    }
}
