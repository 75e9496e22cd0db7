// ==========================================
// 车队维保管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、纯业务规则
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod alarm;
pub mod assignment;
pub mod hour_log;
pub mod machine;
pub mod maintenance;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use alarm::{Alarm, AlarmDashboardStats, NewAlarm};
pub use assignment::{AssignmentHoursError, NewAssignment, ProjectAssignment};
pub use hour_log::{HourLog, HourLogRequest};
pub use machine::{Machine, NewMachine};
pub use maintenance::{
    MaintenanceEvent, NewMaintenanceEvent, NewPolicy, ScheduledMaintenancePolicy,
};
pub use types::{
    AlarmKind, AlarmSeverity, MachineState, MaintenanceKind, MaintenanceStatus, PolicyKind,
};
