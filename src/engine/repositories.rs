// ==========================================
// 车队维保管理系统 - 引擎层仓储接口
// ==========================================
// 职责: 定义引擎所依赖的协作方接口，实现依赖倒置
// 说明: Repository 层提供 SQLite 实现，单元测试提供内存实现
// 红线: Engine 不拼 SQL
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{
    Alarm, HourLog, HourLogRequest, Machine, MachineState, MaintenanceEvent, NewAlarm,
    ProjectAssignment, ScheduledMaintenancePolicy,
};
use crate::repository::RepositoryResult;

// ==========================================
// 协作方接口
// ==========================================

/// 机器台账
pub trait MachineRegistry: Send + Sync {
    fn get(&self, machine_id: i64) -> RepositoryResult<Option<Machine>>;

    fn list_all(&self) -> RepositoryResult<Vec<Machine>>;

    /// 累加工时，返回更新后的机器
    fn add_hours(&self, machine_id: i64, delta: Decimal) -> RepositoryResult<Machine>;

    /// 设置生命周期状态，返回更新后的机器
    fn set_state(&self, machine_id: i64, state: MachineState) -> RepositoryResult<Machine>;
}

/// 定期保养计划目录
pub trait MaintenanceCatalog: Send + Sync {
    fn list_for_machine(&self, machine_id: i64) -> RepositoryResult<Vec<ScheduledMaintenancePolicy>>;
}

/// 保养历史
pub trait MaintenanceHistory: Send + Sync {
    /// 指定 (机器, 计划) 的最近一次保养
    fn last_event_for(
        &self,
        machine_id: i64,
        policy_id: i64,
    ) -> RepositoryResult<Option<MaintenanceEvent>>;
}

/// 项目分配台账
pub trait AssignmentLedger: Send + Sync {
    /// 机器与项目之间的未完结分配
    fn active_assignment(
        &self,
        machine_id: i64,
        project_id: i64,
    ) -> RepositoryResult<Option<ProjectAssignment>>;

    /// 机器当前的未完结分配（最多一个）
    fn active_for_machine(&self, machine_id: i64) -> RepositoryResult<Option<ProjectAssignment>>;
}

/// 告警写入端
pub trait AlarmSink: Send + Sync {
    fn create(&self, alarm: &NewAlarm) -> RepositoryResult<Alarm>;
}

/// 工时提交结果（事务内三处写入后的快照）
#[derive(Debug, Clone)]
pub struct CommittedHourLog {
    pub log: HourLog,
    pub machine: Machine,
    pub assignment: Option<ProjectAssignment>,
}

/// 工时记录存储
pub trait HourLedgerStore: Send + Sync {
    fn exists_for_day(&self, machine_id: i64, work_date: NaiveDate) -> RepositoryResult<bool>;

    /// 单事务提交: 机器工时 + 分配工时 + 工时记录
    ///
    /// # 参数
    /// - `request`: 工时记录请求
    /// - `assignment`: 已按累加规则更新后的分配快照（无项目时为 None）
    fn commit(
        &self,
        request: &HourLogRequest,
        assignment: Option<&ProjectAssignment>,
    ) -> RepositoryResult<CommittedHourLog>;
}

// ==========================================
// FleetRepositories - 引擎仓储集合
// ==========================================
/// 聚合引擎所需的全部协作方，简化依赖注入
#[derive(Clone)]
pub struct FleetRepositories {
    pub machines: Arc<dyn MachineRegistry>,
    pub catalog: Arc<dyn MaintenanceCatalog>,
    pub history: Arc<dyn MaintenanceHistory>,
    pub assignments: Arc<dyn AssignmentLedger>,
    pub alarms: Arc<dyn AlarmSink>,
    pub hour_logs: Arc<dyn HourLedgerStore>,
}
