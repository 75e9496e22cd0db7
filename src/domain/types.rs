// ==========================================
// 车队维保管理系统 - 领域类型定义
// ==========================================
// 职责: 机器状态 / 保养类型 / 告警类型与等级 / 保养状态分类
// 约定: 数据库存储统一使用 snake_case 字符串
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 机器生命周期状态 (Machine State)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineState {
    Operational,   // 运行中
    InMaintenance, // 保养中
    OutOfService,  // 停用（超期强制停机）
}

impl MachineState {
    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "operational" => Some(MachineState::Operational),
            "in_maintenance" => Some(MachineState::InMaintenance),
            "out_of_service" => Some(MachineState::OutOfService),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MachineState::Operational => "operational",
            MachineState::InMaintenance => "in_maintenance",
            MachineState::OutOfService => "out_of_service",
        }
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 保养计划类型 (Policy Kind)
// ==========================================
// 计划只允许预防性 / 预测性；纠正性保养没有计划
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Preventive, // 预防性
    Predictive, // 预测性
}

impl PolicyKind {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "preventive" => Some(PolicyKind::Preventive),
            "predictive" => Some(PolicyKind::Predictive),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PolicyKind::Preventive => "preventive",
            PolicyKind::Predictive => "predictive",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 保养执行类型 (Maintenance Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceKind {
    Preventive, // 预防性：可选关联计划
    Corrective, // 纠正性：禁止关联计划
    Predictive, // 预测性：必须关联计划
}

impl MaintenanceKind {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "preventive" => Some(MaintenanceKind::Preventive),
            "corrective" => Some(MaintenanceKind::Corrective),
            "predictive" => Some(MaintenanceKind::Predictive),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            MaintenanceKind::Preventive => "preventive",
            MaintenanceKind::Corrective => "corrective",
            MaintenanceKind::Predictive => "predictive",
        }
    }

    /// 对应的计划类型（纠正性保养无计划）
    pub fn policy_kind(&self) -> Option<PolicyKind> {
        match self {
            MaintenanceKind::Preventive => Some(PolicyKind::Preventive),
            MaintenanceKind::Predictive => Some(PolicyKind::Predictive),
            MaintenanceKind::Corrective => None,
        }
    }
}

impl fmt::Display for MaintenanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 告警等级 (Alarm Severity)
// ==========================================
// 顺序: Low < Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlarmSeverity {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(AlarmSeverity::Low),
            "medium" => Some(AlarmSeverity::Medium),
            "high" => Some(AlarmSeverity::High),
            "critical" => Some(AlarmSeverity::Critical),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AlarmSeverity::Low => "low",
            AlarmSeverity::Medium => "medium",
            AlarmSeverity::High => "high",
            AlarmSeverity::Critical => "critical",
        }
    }
}

impl Default for AlarmSeverity {
    fn default() -> Self {
        AlarmSeverity::Low
    }
}

impl fmt::Display for AlarmSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 告警类型词表 (Alarm Kind)
// ==========================================
// 存储层为自由文本，仅在校验边界收敛到固定词表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    Maintenance,
    Project,
    State,
    System,
}

impl AlarmKind {
    pub const ALL: [AlarmKind; 4] = [
        AlarmKind::Maintenance,
        AlarmKind::Project,
        AlarmKind::State,
        AlarmKind::System,
    ];

    /// 大小写不敏感解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "maintenance" => Some(AlarmKind::Maintenance),
            "project" => Some(AlarmKind::Project),
            "state" => Some(AlarmKind::State),
            "system" => Some(AlarmKind::System),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmKind::Maintenance => "maintenance",
            AlarmKind::Project => "project",
            AlarmKind::State => "state",
            AlarmKind::System => "system",
        }
    }
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 保养状态分类 (Maintenance Status)
// ==========================================
// 优先级: Overdue > DueSoon > UpToDate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    UpToDate, // 正常
    DueSoon,  // 即将到期
    Overdue,  // 已超期
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaintenanceStatus::UpToDate => write!(f, "up_to_date"),
            MaintenanceStatus::DueSoon => write!(f, "due_soon"),
            MaintenanceStatus::Overdue => write!(f, "overdue"),
        }
    }
}
