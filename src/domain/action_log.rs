// ==========================================
// 车队维保管理系统 - 操作日志领域模型
// ==========================================
// 红线: 所有人工写入与强制状态变更必须留痕
// 对齐: schema action_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,         // UUID
    pub action_type: String,       // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,  // 操作时间戳
    pub actor: String,             // 操作人
    pub machine_id: Option<i64>,   // 关联机器
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    HourLogRecorded,     // 记录工时
    MaintenanceRecorded, // 记录保养
    ForcedOutOfService,  // 超期强制停机
    AlarmCreated,        // 手动创建告警
    AlarmAcknowledged,   // 确认告警
    AlarmDeleted,        // 删除告警
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::HourLogRecorded => "HourLogRecorded",
            ActionType::MaintenanceRecorded => "MaintenanceRecorded",
            ActionType::ForcedOutOfService => "ForcedOutOfService",
            ActionType::AlarmCreated => "AlarmCreated",
            ActionType::AlarmAcknowledged => "AlarmAcknowledged",
            ActionType::AlarmDeleted => "AlarmDeleted",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
