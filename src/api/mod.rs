// ==========================================
// 车队维保管理系统 - API 层
// ==========================================
// 职责: 校验边界 / 按字段报错 / 权限网关 / 操作审计
// ==========================================

pub mod alarm_api;
pub mod assignment_api;
pub mod audit;
pub mod authorization;
pub mod error;
pub mod fleet_api;
pub mod hour_log_api;
pub mod machine_api;
pub mod maintenance_api;
pub mod scheduled_maintenance_api;
pub mod validator;

// 重导出核心类型
pub use alarm_api::AlarmApi;
pub use assignment_api::AssignmentApi;
pub use audit::{AuditTrail, SYSTEM_ACTOR};
pub use authorization::{roles, AuthorizationGate, RolePermissionTable, PUBLIC_ACTIONS};
pub use error::{ApiError, ApiResult, FieldViolation};
pub use fleet_api::FleetApi;
pub use hour_log_api::HourLogApi;
pub use machine_api::MachineApi;
pub use maintenance_api::MaintenanceApi;
pub use scheduled_maintenance_api::ScheduledMaintenanceApi;
pub use validator::FieldValidator;
