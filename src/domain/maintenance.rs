// ==========================================
// 车队维保管理系统 - 保养计划与保养记录
// ==========================================
// 职责: 定期保养计划 (ScheduledMaintenancePolicy)
//       已执行保养事件 (MaintenanceEvent)
// 红线: 保养记录只追加，不修改历史
// ==========================================

use crate::domain::types::{MaintenanceKind, PolicyKind};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 保养间隔上限 (小时)
pub const MAX_INTERVAL_HOURS: i64 = 100_000;

// ==========================================
// ScheduledMaintenancePolicy - 定期保养计划
// ==========================================
// 约束: (machine_id, name) 唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledMaintenancePolicy {
    pub policy_id: i64,
    pub machine_id: i64,
    pub name: String,
    pub kind: PolicyKind,
    pub interval_hours: i64,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

impl ScheduledMaintenancePolicy {
    /// 计算下一次到期工时
    ///
    /// # 参数
    /// - `baseline`: 最近一次保养时的累计工时
    pub fn next_due(&self, baseline: Decimal) -> Decimal {
        baseline + Decimal::from(self.interval_hours)
    }
}

/// 新建保养计划请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPolicy {
    pub machine_id: i64,
    pub name: String,
    pub kind: PolicyKind,
    pub interval_hours: i64,
    pub description: Option<String>,
}

// ==========================================
// MaintenanceEvent - 保养记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceEvent {
    pub event_id: i64,
    pub machine_id: i64,
    pub policy_id: Option<i64>,
    pub kind: MaintenanceKind,
    pub description: String,
    pub performed_on: NaiveDate,
    pub hours_at_service: Decimal,
    pub cost: Decimal,
    pub created_at: NaiveDateTime,
}

/// 新建保养记录请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMaintenanceEvent {
    pub machine_id: i64,
    pub policy_id: Option<i64>,
    pub kind: MaintenanceKind,
    pub description: String,
    pub performed_on: NaiveDate,
    pub hours_at_service: Decimal,
    pub cost: Decimal,
}
