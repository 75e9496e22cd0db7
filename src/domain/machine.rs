// ==========================================
// 车队维保管理系统 - 机器领域模型
// ==========================================
// 职责: 机器身份 / 累计工时 / 生命周期状态
// 对齐: schema machine 表
// ==========================================

use crate::domain::types::MachineState;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Machine - 机器
// ==========================================
// 红线: total_hours 只增不减 (正常流程)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub machine_id: i64,
    pub name: String,
    pub model: Option<String>,
    pub brand: Option<String>,
    pub serial_number: Option<String>,
    pub acquired_on: Option<NaiveDate>,

    // ===== 工时与状态 =====
    pub total_hours: Decimal,
    pub state: MachineState,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Machine {
    /// 是否允许记录工时
    pub fn accepts_hours(&self) -> bool {
        self.state != MachineState::OutOfService
    }
}

/// 新建机器请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMachine {
    pub name: String,
    pub model: Option<String>,
    pub brand: Option<String>,
    pub serial_number: Option<String>,
    pub acquired_on: Option<NaiveDate>,
}

impl NewMachine {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
