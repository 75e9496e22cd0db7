// ==========================================
// 车队维保管理系统 - 引擎层
// ==========================================
// 职责: 阈值评估 / 车队汇总 / 工时记录协调 / 机器级串行化
// 红线: Engine 不拼 SQL, 只依赖 repositories 中定义的接口
// ==========================================

pub mod error;
pub mod events;
pub mod fleet_summary;
pub mod hour_ledger;
pub mod machine_locks;
pub mod repositories;
pub mod threshold;

#[cfg(test)]
pub(crate) mod test_support;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use events::{FleetEvent, FleetEventPublisher, OptionalEventPublisher};
pub use fleet_summary::{FleetBucket, FleetSummary, FleetSummaryEngine, MachineStanding};
pub use hour_ledger::{HourLogOutcome, HourLoggingService};
pub use machine_locks::MachineLocks;
pub use repositories::{
    AlarmSink, AssignmentLedger, CommittedHourLog, FleetRepositories, HourLedgerStore,
    MachineRegistry, MaintenanceCatalog, MaintenanceHistory,
};
pub use threshold::{
    assess_policy, classify, EvaluationReport, FleetEvaluation, PolicyAssessment,
    ThresholdEvaluator, DUE_SOON_BAND_HOURS,
};
