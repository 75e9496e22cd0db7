// ==========================================
// 车队维保管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod alarm_repo;
pub mod assignment_repo;
pub mod columns;
pub mod error;
pub mod hour_log_repo;
pub mod machine_repo;
pub mod maintenance_repo;
pub mod scheduled_maintenance_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use alarm_repo::AlarmRepository;
pub use assignment_repo::AssignmentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use hour_log_repo::HourLogRepository;
pub use machine_repo::MachineRepository;
pub use maintenance_repo::MaintenanceRepository;
pub use scheduled_maintenance_repo::ScheduledMaintenanceRepository;
