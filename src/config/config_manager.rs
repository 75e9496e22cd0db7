// ==========================================
// 车队维保管理系统 - 配置管理器
// ==========================================
// 职责: 运行期可调配置的读取与覆写
// 存储: config_kv 表 (key-value + scope)
// 说明: 保养临近区间 (20h) 为引擎常量，不在此配置
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

const GLOBAL_SCOPE: &str = "global";

/// 仪表盘“最新告警”默认条数
pub const DEFAULT_DASHBOARD_LATEST_LIMIT: usize = 10;
/// “近期告警”默认时间窗口（小时）
pub const DEFAULT_RECENT_WINDOW_HOURS: i64 = 24;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let config_map = rows.collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取正整数配置；缺失或格式错误时回退默认值
    fn get_positive_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: std::str::FromStr + PartialOrd + Default + Copy + std::fmt::Display,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) if v > T::default() => Ok(v),
            _ => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置值无效，使用默认值"
                );
                Ok(default)
            }
        }
    }

    // ===== 告警配置 =====

    /// 仪表盘“最新告警”条数（默认 10）
    pub fn get_dashboard_latest_limit(&self) -> Result<usize, Box<dyn Error>> {
        self.get_positive_or_default(
            config_keys::ALARM_DASHBOARD_LATEST_LIMIT,
            DEFAULT_DASHBOARD_LATEST_LIMIT,
        )
    }

    /// “近期告警”时间窗口（小时，默认 24）
    pub fn get_recent_window_hours(&self) -> Result<i64, Box<dyn Error>> {
        self.get_positive_or_default(
            config_keys::ALARM_RECENT_WINDOW_HOURS,
            DEFAULT_RECENT_WINDOW_HOURS,
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 告警仪表盘
    pub const ALARM_DASHBOARD_LATEST_LIMIT: &str = "alarm.dashboard_latest_limit";
    pub const ALARM_RECENT_WINDOW_HOURS: &str = "alarm.recent_window_hours";
}
