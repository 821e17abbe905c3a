// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、CSV 文件生成等功能
// ==========================================
#![allow(dead_code)]

use product_import::db::open_and_init;
use rusqlite::Connection;
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::{NamedTempFile, TempDir};

pub const FULL_HEADER: &str = "sku,description,normalPrice,specialPrice";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("temp path is not valid UTF-8")?
        .to_string();

    open_and_init(&db_path)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接（ConfigManager / SqliteProductStore 共用）
pub fn shared_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    Ok(Arc::new(Mutex::new(open_and_init(db_path)?)))
}

/// 在临时目录中写入 CSV 文件
pub fn write_csv(dir: &TempDir, name: &str, lines: &[&str]) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path)?;
    for line in lines {
        writeln!(file, "{line}")?;
    }
    Ok(path)
}

/// 生成 count 行合法商品（sku: GEN-00001 ...）
pub fn generated_csv(
    dir: &TempDir,
    name: &str,
    count: usize,
    description: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let rows: Vec<String> = (1..=count)
        .map(|i| format!("GEN-{i:05},{description},{}.{:02},", 10 + i, i % 100))
        .collect();

    let mut lines = vec![FULL_HEADER];
    lines.extend(rows.iter().map(String::as_str));
    write_csv(dir, name, &lines)
}

/// 测试数据文件路径
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
