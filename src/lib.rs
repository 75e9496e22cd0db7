// ==========================================
// 车队维保管理系统 - 核心库
// ==========================================
// 职责: 机器工时台账 + 保养阈值评估 + 告警
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 阈值评估 / 车队汇总 / 工时协调
pub mod engine;

// 配置层 - 启动配置与运行期配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 校验边界
pub mod api;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AlarmKind, AlarmSeverity, MachineState, MaintenanceKind, MaintenanceStatus, PolicyKind,
};

// 领域实体
pub use domain::{
    ActionLog, ActionType, Alarm, HourLog, HourLogRequest, Machine, MaintenanceEvent,
    ProjectAssignment, ScheduledMaintenancePolicy,
};

// 引擎
pub use engine::{
    FleetSummary, FleetSummaryEngine, HourLoggingService, MachineLocks, ThresholdEvaluator,
    DUE_SOON_BAND_HOURS,
};

// API
pub use api::{AlarmApi, ApiError, ApiResult, FleetApi, HourLogApi};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "车队维保管理系统";
