// ==========================================
// 车队维保管理系统 - 机器工时记录
// ==========================================
// 红线: 每台机器每个自然日只允许一条记录
// 对齐: schema machine_hour_log 表 UNIQUE(machine_id, work_date)
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 备注最大长度 (字符)
pub const MAX_NOTES_CHARS: usize = 2000;

// ==========================================
// HourLog - 工时记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourLog {
    pub log_id: i64,
    pub machine_id: i64,
    pub project_id: Option<i64>,
    pub assignment_id: Option<i64>,
    pub work_date: NaiveDate,
    pub hours_worked: Decimal,
    pub notes: Option<String>,
    pub evidence: Vec<String>, // 证明附件引用 (对引擎不透明)
    pub created_at: NaiveDateTime,
}

/// 记录工时请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourLogRequest {
    pub machine_id: i64,
    pub work_date: NaiveDate,
    pub hours_worked: Decimal,
    pub project_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl HourLogRequest {
    pub fn new(machine_id: i64, work_date: NaiveDate, hours_worked: Decimal) -> Self {
        Self {
            machine_id,
            work_date,
            hours_worked,
            project_id: None,
            notes: None,
            evidence: Vec::new(),
        }
    }

    pub fn with_project(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }
}
