// ==========================================
// 车队维保管理系统 - 项目分配 API
// ==========================================
// 规则:
// - 新建分配时机器必须为 operational，pact_hours > 0
// - 同一机器同一时间最多一个未完结分配
// - (机器, 项目) 不可重复
// - 累加工时遵循截断 / 完结 / 重新激活规则
// ==========================================

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{AssignmentHoursError, MachineState, NewAssignment, ProjectAssignment};
use crate::engine::{EngineError, MachineLocks};
use crate::repository::{AssignmentRepository, MachineRepository};

pub struct AssignmentApi {
    assignment_repo: Arc<AssignmentRepository>,
    machine_repo: Arc<MachineRepository>,
    locks: Arc<MachineLocks>,
}

impl AssignmentApi {
    pub fn new(
        assignment_repo: Arc<AssignmentRepository>,
        machine_repo: Arc<MachineRepository>,
        locks: Arc<MachineLocks>,
    ) -> Self {
        Self {
            assignment_repo,
            machine_repo,
            locks,
        }
    }

    /// 新建项目分配
    pub fn create(&self, request: NewAssignment) -> ApiResult<ProjectAssignment> {
        if request.pact_hours <= Decimal::ZERO {
            return Err(ApiError::validation("pact_hours", "约定工时必须大于 0"));
        }

        let assignment = self.locks.with_lock(request.machine_id, || {
            let machine = self
                .machine_repo
                .find_by_id(request.machine_id)?
                .ok_or_else(|| {
                    EngineError::validation(
                        "machine_id",
                        format!("机器不存在: {}", request.machine_id),
                    )
                })?;
            if machine.state != MachineState::Operational {
                return Err(EngineError::validation(
                    "machine_id",
                    format!("机器当前状态为 {}，不能分配项目", machine.state),
                ));
            }
            if let Some(active) = self.assignment_repo.active_for_machine(request.machine_id)? {
                return Err(EngineError::validation(
                    "machine_id",
                    format!("机器已有未完结的项目分配 (project_id={})", active.project_id),
                ));
            }
            if self
                .assignment_repo
                .find_by_pair(request.machine_id, request.project_id)?
                .is_some()
            {
                return Err(EngineError::validation("project_id", "该机器已分配到此项目"));
            }
            Ok(self.assignment_repo.create(&request)?)
        })?;

        tracing::info!(
            assignment_id = assignment.assignment_id,
            machine_id = assignment.machine_id,
            project_id = assignment.project_id,
            pact_hours = %assignment.pact_hours,
            "项目分配已创建"
        );
        Ok(assignment)
    }

    pub fn get(&self, assignment_id: i64) -> ApiResult<ProjectAssignment> {
        self.assignment_repo.find_by_id(assignment_id)?.ok_or_else(|| {
            ApiError::NotFound(format!("ProjectAssignment(id={})不存在", assignment_id))
        })
    }

    pub fn active_assignment(
        &self,
        machine_id: i64,
        project_id: i64,
    ) -> ApiResult<Option<ProjectAssignment>> {
        Ok(self.assignment_repo.active_assignment(machine_id, project_id)?)
    }

    pub fn active_for_machine(&self, machine_id: i64) -> ApiResult<Option<ProjectAssignment>> {
        Ok(self.assignment_repo.active_for_machine(machine_id)?)
    }

    pub fn list_for_machine(&self, machine_id: i64) -> ApiResult<Vec<ProjectAssignment>> {
        Ok(self.assignment_repo.list_for_machine(machine_id)?)
    }

    /// 直接累加分配工时（不经工时记录）
    pub fn add_hours(&self, assignment_id: i64, delta: Decimal) -> ApiResult<ProjectAssignment> {
        let current = self.get(assignment_id)?;

        let saved = self.locks.with_lock(current.machine_id, || {
            // 锁内重读，避免覆盖并发写入
            let mut assignment = self
                .assignment_repo
                .find_by_id(assignment_id)?
                .ok_or_else(|| EngineError::validation("assignment_id", "分配已被删除"))?;
            let finalized = assignment
                .apply_hours(delta)
                .map_err(|e| EngineError::validation(hours_field(&e), e.to_string()))?;
            if finalized {
                tracing::info!(assignment_id, "累计工时达到约定，分配完结");
            }
            Ok(self.assignment_repo.save_hours(&assignment)?)
        })?;
        Ok(saved)
    }
}

fn hours_field(err: &AssignmentHoursError) -> &'static str {
    match err {
        AssignmentHoursError::AlreadyCompleted { .. } => "assignment_id",
        AssignmentHoursError::NonPositiveDelta(_) => "delta",
    }
}
