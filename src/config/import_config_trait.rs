// ==========================================
// 商品导入系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::RepositoryResult;
use std::path::PathBuf;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（config_kv 表 + 环境变量覆写）
pub trait ImportConfigReader {
    /// 获取批次大小（每累计 N 次新建/更新 flush 一次）
    ///
    /// # 默认值
    /// - 100
    fn get_batch_size(&self) -> RepositoryResult<usize>;

    /// 获取输入目录（相对文件名在此目录下查找）
    ///
    /// # 默认值
    /// - data/input
    fn get_input_dir(&self) -> RepositoryResult<PathBuf>;
}
