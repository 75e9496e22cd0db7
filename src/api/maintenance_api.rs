// ==========================================
// 车队维保管理系统 - 保养记录 API（保养完成）
// ==========================================
// 按保养类型分支校验:
//   Corrective: 禁止关联计划；费用必须 > 0
//   Predictive: 必须关联预测性计划
//   Preventive: 可选关联预防性计划；执行日期不早于 10 年前
// 通用: 计划必须属于同一机器；hours_at_service 不得倒退；
//       执行日期不在未来；描述至少 10 字符；0 ≤ 费用 ≤ 9,000,000
// 效果: 追加保养记录并把机器恢复为 operational
// ==========================================

use std::sync::Arc;

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde_json::json;

use crate::api::audit::AuditTrail;
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::FieldValidator;
use crate::domain::{
    ActionType, MaintenanceEvent, MaintenanceKind, NewMaintenanceEvent, PolicyKind,
    ScheduledMaintenancePolicy,
};
use crate::engine::{EngineError, EngineResult, MachineLocks};
use crate::repository::{MachineRepository, MaintenanceRepository, ScheduledMaintenanceRepository};

/// 描述最少字符数
pub const MIN_DESCRIPTION_CHARS: usize = 10;
/// 单次保养费用上限
pub const MAX_COST: i64 = 9_000_000;
/// 预防性保养可追溯年限
pub const PREVENTIVE_MAX_AGE_YEARS: u32 = 10;

pub struct MaintenanceApi {
    maintenance_repo: Arc<MaintenanceRepository>,
    policy_repo: Arc<ScheduledMaintenanceRepository>,
    machine_repo: Arc<MachineRepository>,
    locks: Arc<MachineLocks>,
    audit: Arc<AuditTrail>,
}

impl MaintenanceApi {
    pub fn new(
        maintenance_repo: Arc<MaintenanceRepository>,
        policy_repo: Arc<ScheduledMaintenanceRepository>,
        machine_repo: Arc<MachineRepository>,
        locks: Arc<MachineLocks>,
        audit: Arc<AuditTrail>,
    ) -> Self {
        Self {
            maintenance_repo,
            policy_repo,
            machine_repo,
            locks,
            audit,
        }
    }

    /// 记录保养（以本地日期为今天）
    pub fn record(&self, request: NewMaintenanceEvent, actor: &str) -> ApiResult<MaintenanceEvent> {
        self.record_as_of(request, actor, chrono::Local::now().date_naive())
    }

    pub fn record_as_of(
        &self,
        request: NewMaintenanceEvent,
        actor: &str,
        today: NaiveDate,
    ) -> ApiResult<MaintenanceEvent> {
        validate_shape(&request, today)?;

        let machine_id = request.machine_id;
        let event = self
            .locks
            .with_lock(machine_id, || self.record_locked(request))?;

        tracing::info!(
            machine_id,
            event_id = event.event_id,
            kind = %event.kind,
            hours_at_service = %event.hours_at_service,
            "保养记录已登记，机器恢复运行"
        );
        self.audit.record(
            ActionType::MaintenanceRecorded,
            actor,
            Some(machine_id),
            json!({
                "event_id": event.event_id,
                "policy_id": event.policy_id,
                "kind": event.kind,
                "hours_at_service": event.hours_at_service.to_string(),
                "cost": event.cost.to_string(),
            }),
            format!("记录{}保养", event.kind),
        );
        Ok(event)
    }

    fn record_locked(&self, request: NewMaintenanceEvent) -> EngineResult<MaintenanceEvent> {
        let machine = self
            .machine_repo
            .find_by_id(request.machine_id)?
            .ok_or_else(|| {
                EngineError::validation("machine_id", format!("机器不存在: {}", request.machine_id))
            })?;

        let policy = match request.policy_id {
            Some(policy_id) => Some(self.policy_repo.find_by_id(policy_id)?.ok_or_else(|| {
                EngineError::validation("policy_id", format!("保养计划不存在: {}", policy_id))
            })?),
            None => None,
        };
        check_policy_link(request.kind, request.machine_id, policy.as_ref())?;

        if request.hours_at_service < machine.total_hours {
            return Err(EngineError::validation(
                "hours_at_service",
                format!(
                    "保养工时 {} 不能小于机器当前累计工时 {}",
                    request.hours_at_service.normalize(),
                    machine.total_hours.normalize()
                ),
            ));
        }
        if let Some(prior_max) = self
            .maintenance_repo
            .max_hours_at_service(request.machine_id)?
        {
            if request.hours_at_service < prior_max {
                return Err(EngineError::validation(
                    "hours_at_service",
                    format!(
                        "保养工时 {} 不能小于历次保养的最高工时 {}",
                        request.hours_at_service.normalize(),
                        prior_max.normalize()
                    ),
                ));
            }
        }

        Ok(self.maintenance_repo.record(&request)?)
    }

    /// 指定 (机器, 计划) 的最近一次保养
    pub fn last_event_for(
        &self,
        machine_id: i64,
        policy_id: i64,
    ) -> ApiResult<Option<MaintenanceEvent>> {
        Ok(self.maintenance_repo.last_event_for(machine_id, policy_id)?)
    }

    pub fn list_for_machine(&self, machine_id: i64) -> ApiResult<Vec<MaintenanceEvent>> {
        Ok(self.maintenance_repo.list_for_machine(machine_id)?)
    }

    pub fn get(&self, event_id: i64) -> ApiResult<MaintenanceEvent> {
        self.maintenance_repo
            .find_by_id(event_id)?
            .ok_or_else(|| ApiError::NotFound(format!("MaintenanceEvent(id={})不存在", event_id)))
    }
}

/// 不依赖存储的字段校验
fn validate_shape(request: &NewMaintenanceEvent, today: NaiveDate) -> ApiResult<()> {
    let mut v = FieldValidator::new();
    v.min_chars("description", &request.description, MIN_DESCRIPTION_CHARS)
        .positive("hours_at_service", request.hours_at_service)
        .check(
            request.performed_on <= today,
            "performed_on",
            "执行日期不能晚于今天",
        )
        .check(request.cost >= Decimal::ZERO, "cost", "费用不能为负")
        .check(
            request.cost <= Decimal::from(MAX_COST),
            "cost",
            format!("费用不能超过 {}", MAX_COST),
        );

    match request.kind {
        MaintenanceKind::Corrective => {
            v.check(request.cost > Decimal::ZERO, "cost", "纠正性保养必须填写费用");
        }
        MaintenanceKind::Preventive => {
            let earliest = today.checked_sub_months(Months::new(PREVENTIVE_MAX_AGE_YEARS * 12));
            let too_old = earliest.map_or(false, |earliest| request.performed_on < earliest);
            v.check(
                !too_old,
                "performed_on",
                format!("预防性保养日期不能早于 {} 年前", PREVENTIVE_MAX_AGE_YEARS),
            );
        }
        MaintenanceKind::Predictive => {}
    }

    v.finish()
}

/// 保养类型与计划关联规则
fn check_policy_link(
    kind: MaintenanceKind,
    machine_id: i64,
    policy: Option<&ScheduledMaintenancePolicy>,
) -> EngineResult<()> {
    match (kind, policy) {
        (MaintenanceKind::Corrective, Some(_)) => Err(EngineError::validation(
            "policy_id",
            "纠正性保养不能关联保养计划",
        )),
        (MaintenanceKind::Corrective, None) | (MaintenanceKind::Preventive, None) => Ok(()),
        (MaintenanceKind::Predictive, None) => Err(EngineError::validation(
            "policy_id",
            "预测性保养必须关联保养计划",
        )),
        (MaintenanceKind::Predictive, Some(p)) => expect_policy(p, PolicyKind::Predictive, machine_id),
        (MaintenanceKind::Preventive, Some(p)) => expect_policy(p, PolicyKind::Preventive, machine_id),
    }
}

fn expect_policy(
    policy: &ScheduledMaintenancePolicy,
    kind: PolicyKind,
    machine_id: i64,
) -> EngineResult<()> {
    if policy.machine_id != machine_id {
        return Err(EngineError::validation(
            "policy_id",
            format!("保养计划 {} 不属于机器 {}", policy.policy_id, machine_id),
        ));
    }
    if policy.kind != kind {
        return Err(EngineError::validation(
            "policy_id",
            format!("保养计划类型为 {}，与保养类型 {} 不一致", policy.kind, kind),
        ));
    }
    Ok(())
}
