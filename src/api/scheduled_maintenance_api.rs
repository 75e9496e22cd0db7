// ==========================================
// 车队维保管理系统 - 定期保养计划 API
// ==========================================
// 规则:
// - name 必填，同一机器下唯一
// - 1 ≤ interval_hours ≤ 100,000
// - 机器必须存在
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::FieldValidator;
use crate::domain::maintenance::MAX_INTERVAL_HOURS;
use crate::domain::{NewPolicy, ScheduledMaintenancePolicy};
use crate::repository::{MachineRepository, ScheduledMaintenanceRepository};

pub struct ScheduledMaintenanceApi {
    policy_repo: Arc<ScheduledMaintenanceRepository>,
    machine_repo: Arc<MachineRepository>,
}

impl ScheduledMaintenanceApi {
    pub fn new(
        policy_repo: Arc<ScheduledMaintenanceRepository>,
        machine_repo: Arc<MachineRepository>,
    ) -> Self {
        Self {
            policy_repo,
            machine_repo,
        }
    }

    pub fn create(&self, request: NewPolicy) -> ApiResult<ScheduledMaintenancePolicy> {
        let mut validator = FieldValidator::new();
        validator
            .require_text("name", &request.name)
            .check(
                (1..=MAX_INTERVAL_HOURS).contains(&request.interval_hours),
                "interval_hours",
                format!("间隔工时必须在 1 到 {} 之间", MAX_INTERVAL_HOURS),
            );
        validator.finish()?;

        if self.machine_repo.find_by_id(request.machine_id)?.is_none() {
            return Err(ApiError::validation(
                "machine_id",
                format!("机器不存在: {}", request.machine_id),
            ));
        }

        let request = NewPolicy {
            name: request.name.trim().to_string(),
            ..request
        };
        if self
            .policy_repo
            .exists_by_name(request.machine_id, &request.name)?
        {
            return Err(ApiError::validation("name", "该机器已存在同名保养计划"));
        }

        Ok(self.policy_repo.create(&request)?)
    }

    pub fn get(&self, policy_id: i64) -> ApiResult<ScheduledMaintenancePolicy> {
        self.policy_repo.find_by_id(policy_id)?.ok_or_else(|| {
            ApiError::NotFound(format!("ScheduledMaintenance(id={})不存在", policy_id))
        })
    }

    pub fn list_for_machine(&self, machine_id: i64) -> ApiResult<Vec<ScheduledMaintenancePolicy>> {
        Ok(self.policy_repo.list_for_machine(machine_id)?)
    }

    pub fn delete(&self, policy_id: i64) -> ApiResult<()> {
        Ok(self.policy_repo.delete(policy_id)?)
    }
}
