// ==========================================
// 车队维保管理系统 - 告警领域模型
// ==========================================
// 职责: 告警记录 / 仪表盘统计
// 约定: kind 在存储层为自由文本，手动创建时收敛到 AlarmKind 词表
// ==========================================

use crate::domain::types::AlarmSeverity;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// Alarm - 告警
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub alarm_id: i64,
    pub machine_id: i64,
    pub kind: String,
    pub severity: AlarmSeverity,
    pub description: Option<String>,
    pub acknowledged: bool,
    pub created_at: NaiveDateTime, // 创建后不可变
}

impl Alarm {
    pub fn is_critical(&self) -> bool {
        self.severity == AlarmSeverity::Critical
    }
}

/// 新建告警
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlarm {
    pub machine_id: i64,
    pub kind: String,
    pub severity: AlarmSeverity,
    pub description: Option<String>,
}

// ==========================================
// AlarmDashboardStats - 仪表盘统计
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlarmDashboardStats {
    pub total_unacknowledged: i64,
    pub total_critical: i64,
    pub by_severity: BTreeMap<String, i64>,
    pub by_kind: BTreeMap<String, i64>,
    pub latest: Vec<Alarm>,
}
