// ==========================================
// 车队维保管理系统 - 启动配置
// ==========================================
// 来源: 环境变量
//   FLEET_DB_PATH              数据库文件路径（默认 <data_dir>/fleet-maintenance/fleet.db）
//   FLEET_LOG_JSON             是否输出 JSON 日志（默认 false）
//   FLEET_SWEEP_INTERVAL_SECS  定时巡检间隔秒数（默认 0 = 关闭）
// ==========================================

use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "FLEET_DB_PATH";
pub const ENV_LOG_JSON: &str = "FLEET_LOG_JSON";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "FLEET_SWEEP_INTERVAL_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: String,
    pub log_json: bool,
    /// 0 表示不启用定时巡检
    pub sweep_interval_secs: u64,
}

impl AppConfig {
    /// 从进程环境变量读取
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取（便于测试）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let db_path = value(ENV_DB_PATH).unwrap_or_else(default_db_path);

        let log_json = match value(ENV_LOG_JSON) {
            Some(raw) => matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
            None => false,
        };

        let sweep_interval_secs = match value(ENV_SWEEP_INTERVAL_SECS) {
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!(
                    env = ENV_SWEEP_INTERVAL_SECS,
                    raw_value = %raw,
                    "巡检间隔格式错误，关闭定时巡检"
                );
                0
            }),
            None => 0,
        };

        Self {
            db_path,
            log_json,
            sweep_interval_secs,
        }
    }

    pub fn sweep_enabled(&self) -> bool {
        self.sweep_interval_secs > 0
    }
}

/// 默认数据库路径
///
/// 优先使用用户数据目录；获取失败时回退到当前目录
pub fn default_db_path() -> String {
    let mut path = PathBuf::from("./fleet.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("fleet-maintenance");
        // 目录创建失败时由打开数据库报错
        std::fs::create_dir_all(&dir).ok();
        path = dir.join("fleet.db");
    }

    path.to_string_lossy().to_string()
}
