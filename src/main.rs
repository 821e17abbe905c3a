// ==========================================
// 商品导入系统 - 命令行入口
// ==========================================
// 用法:
//   product-import <file> [db_path] [--json] [--dry-run]
//
// 退出码: 致命错误（文件不可读 / 表头不合法 / 仓储失败）非 0，
//         仅有被跳过的行时仍为 0
// ==========================================

use anyhow::{bail, Context, Result};
use product_import::config::{default_db_path, ConfigManager, ImportConfig};
use product_import::db::{open_and_init, open_read_only_connection, read_schema_version};
use product_import::importer::{open_record_source, ImportError, ProductImporter};
use product_import::report::{ConsoleReportSink, JsonReportSink, ReportSink};
use product_import::repository::{InMemoryProductStore, ProductStore, SqliteProductStore};
use product_import::{logging, ImportReport};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

const USAGE: &str = "Usage: product-import <file> [db_path] [--json] [--dry-run]

Imports product rows (sku, description, normalPrice, specialPrice) from a
.csv/.xlsx/.xls file. Relative file names are also looked up in the
configured input directory (default: data/input).

Options:
  --json      print the import report as JSON
  --dry-run   validate and count against the existing database without
              writing to it
  -h, --help  show this message";

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    file: PathBuf,
    db_path: Option<PathBuf>,
    json: bool,
    dry_run: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Option<CliArgs>> {
    let mut positional = Vec::new();
    let mut json = false;
    let mut dry_run = false;

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--json" => json = true,
            "--dry-run" => dry_run = true,
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n\n{USAGE}"),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let Some(file) = positional.next() else {
        bail!("missing <file> argument\n\n{USAGE}");
    };
    let db_path = positional.next().map(PathBuf::from);
    if let Some(extra) = positional.next() {
        bail!("unexpected argument {extra}\n\n{USAGE}");
    }

    Ok(Some(CliArgs {
        file: PathBuf::from(file),
        db_path,
        json,
        dry_run,
    }))
}

fn open_database(path: &Path) -> Result<Arc<Mutex<Connection>>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let db_path = path.to_string_lossy();
    let conn = open_and_init(&db_path).with_context(|| format!("failed to open database {db_path}"))?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// --dry-run: 以只读方式载入已有库的配置与商品，导入只落到内存仓储
fn dry_run_context(db_path: &Path) -> Result<(ImportConfig, InMemoryProductStore)> {
    if db_path.is_file() {
        let path = db_path.to_string_lossy();
        let conn = open_read_only_connection(&path)
            .with_context(|| format!("failed to open database {path} read-only"))?;

        if read_schema_version(&conn)?.is_some() {
            let conn = Arc::new(Mutex::new(conn));
            let config = ImportConfig::load(&ConfigManager::read_only(conn.clone()))?;
            let existing = SqliteProductStore::from_connection(conn).list_all()?;
            info!(existing = existing.len(), "预演: 已载入现有商品");
            return Ok((config, InMemoryProductStore::with_products(existing)));
        }
    }

    // 数据库尚不存在: 使用默认配置与空仓储
    let conn = Arc::new(Mutex::new(Connection::open_in_memory()?));
    let config = ImportConfig::load(&ConfigManager::from_connection(conn)?)?;
    Ok((config, InMemoryProductStore::new()))
}

fn log_config(config: &ImportConfig, dry_run: bool) {
    info!(
        batch_size = config.batch_size,
        input_dir = %config.input_dir.display(),
        dry_run,
        "导入配置已加载"
    );
}

fn publish(report: &ImportReport, json: bool) -> Result<()> {
    if json {
        JsonReportSink::stdout().publish(report)?;
    } else {
        ConsoleReportSink::stdout().publish(report)?;
    }
    Ok(())
}

fn run_import<S: ProductStore>(args: &CliArgs, config: &ImportConfig, store: S) -> Result<ImportReport> {
    let mut source = open_record_source(&args.file, Some(config.input_dir.as_path()))?;
    let mut importer = ProductImporter::new(store).with_batch_size(config.batch_size);

    match importer.import_all(source.as_mut()) {
        Ok(report) => Ok(report),
        Err(err @ ImportError::Store { .. }) => {
            // 中止前已累计的部分报告照常输出
            if let Some(partial) = err.partial_report() {
                publish(partial, args.json)?;
            }
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn main() -> Result<()> {
    logging::init();

    let Some(args) = parse_args(std::env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };

    let db_path = args.db_path.clone().unwrap_or_else(default_db_path);
    info!(db_path = %db_path.display(), dry_run = args.dry_run, "打开数据库");

    let result = if args.dry_run {
        let (config, store) = dry_run_context(&db_path)?;
        log_config(&config, true);
        if !args.json {
            ConsoleReportSink::stdout().title()?;
        }
        run_import(&args, &config, store)
    } else {
        let conn = open_database(&db_path)?;
        let config = ImportConfig::load(&ConfigManager::from_connection(conn.clone())?)?;
        log_config(&config, false);
        if !args.json {
            ConsoleReportSink::stdout().title()?;
        }
        run_import(&args, &config, SqliteProductStore::from_connection(conn))
    };

    match result {
        Ok(report) => publish(&report, args.json),
        Err(err) => {
            error!(error = %err, "导入失败");
            Err(err)
        }
    }
}
