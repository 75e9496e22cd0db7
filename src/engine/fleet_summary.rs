// ==========================================
// 车队维保管理系统 - 车队汇总引擎
// ==========================================
// 职责: 只读汇总，与阈值评估共用分类规则
//   运营状态: 存在未完结项目分配 → in_operation
//   保养状态: 所有计划归约，Overdue > DueSoon > UpToDate
//            首个 Overdue 即短路；无计划的机器视为 UpToDate
// 红线: 每台机器恰好计入一个保养分桶
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{Machine, MaintenanceStatus};
use crate::engine::error::EngineResult;
use crate::engine::repositories::{
    AssignmentLedger, FleetRepositories, MachineRegistry, MaintenanceCatalog, MaintenanceHistory,
};
use crate::engine::threshold::assess_policy;

/// 四个分桶的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub in_operation: usize,
    pub up_to_date: usize,
    pub due_soon: usize,
    pub overdue: usize,
}

/// 列表筛选分桶
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FleetBucket {
    InOperation,
    UpToDate,
    DueSoon,
    Overdue,
}

/// 单台机器的汇总状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineStanding {
    pub machine: Machine,
    pub in_operation: bool,
    pub maintenance_status: MaintenanceStatus,
}

impl MachineStanding {
    pub fn in_bucket(&self, bucket: FleetBucket) -> bool {
        match bucket {
            FleetBucket::InOperation => self.in_operation,
            FleetBucket::UpToDate => self.maintenance_status == MaintenanceStatus::UpToDate,
            FleetBucket::DueSoon => self.maintenance_status == MaintenanceStatus::DueSoon,
            FleetBucket::Overdue => self.maintenance_status == MaintenanceStatus::Overdue,
        }
    }
}

impl FleetSummary {
    pub fn from_standings(standings: &[MachineStanding]) -> Self {
        let mut summary = FleetSummary::default();
        for s in standings {
            if s.in_operation {
                summary.in_operation += 1;
            }
            match s.maintenance_status {
                MaintenanceStatus::UpToDate => summary.up_to_date += 1,
                MaintenanceStatus::DueSoon => summary.due_soon += 1,
                MaintenanceStatus::Overdue => summary.overdue += 1,
            }
        }
        summary
    }

    /// 保养分桶合计（应等于机器总数）
    pub fn maintenance_total(&self) -> usize {
        self.up_to_date + self.due_soon + self.overdue
    }
}

pub struct FleetSummaryEngine {
    machines: Arc<dyn MachineRegistry>,
    catalog: Arc<dyn MaintenanceCatalog>,
    history: Arc<dyn MaintenanceHistory>,
    assignments: Arc<dyn AssignmentLedger>,
}

impl FleetSummaryEngine {
    pub fn new(repos: &FleetRepositories) -> Self {
        Self {
            machines: repos.machines.clone(),
            catalog: repos.catalog.clone(),
            history: repos.history.clone(),
            assignments: repos.assignments.clone(),
        }
    }

    /// 归约单台机器的保养状态
    pub fn maintenance_status(&self, machine: &Machine) -> EngineResult<MaintenanceStatus> {
        let mut status = MaintenanceStatus::UpToDate;
        for policy in self.catalog.list_for_machine(machine.machine_id)? {
            let last_event = self
                .history
                .last_event_for(machine.machine_id, policy.policy_id)?;
            let Some(assessment) = assess_policy(&policy, last_event.as_ref(), machine.total_hours)
            else {
                continue;
            };
            match assessment.status {
                MaintenanceStatus::Overdue => return Ok(MaintenanceStatus::Overdue),
                other => status = status.max(other),
            }
        }
        Ok(status)
    }

    pub fn standing(&self, machine: Machine) -> EngineResult<MachineStanding> {
        let in_operation = self
            .assignments
            .active_for_machine(machine.machine_id)?
            .is_some();
        let maintenance_status = self.maintenance_status(&machine)?;
        Ok(MachineStanding {
            machine,
            in_operation,
            maintenance_status,
        })
    }

    pub fn standings(&self) -> EngineResult<Vec<MachineStanding>> {
        self.machines
            .list_all()?
            .into_iter()
            .map(|m| self.standing(m))
            .collect()
    }

    /// 重新汇总车队
    pub fn summarize(&self) -> EngineResult<FleetSummary> {
        let standings = self.standings()?;
        let summary = FleetSummary::from_standings(&standings);
        tracing::debug!(?summary, machines = standings.len(), "车队汇总完成");
        Ok(summary)
    }

    /// 指定分桶下的机器
    pub fn list_bucket(&self, bucket: FleetBucket) -> EngineResult<Vec<Machine>> {
        Ok(self
            .standings()?
            .into_iter()
            .filter(|s| s.in_bucket(bucket))
            .map(|s| s.machine)
            .collect())
    }
}
