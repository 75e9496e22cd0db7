// ==========================================
// 车队维保管理系统 - 工时记录 API
// ==========================================
// 职责: 工时记录入口（委托 HourLoggingService）+ 查询 + 审计
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

use crate::api::audit::AuditTrail;
use crate::api::error::{ApiError, ApiResult};
use crate::domain::{ActionType, HourLog, HourLogRequest};
use crate::engine::{HourLogOutcome, HourLoggingService};
use crate::repository::HourLogRepository;

pub struct HourLogApi {
    service: Arc<HourLoggingService>,
    hour_log_repo: Arc<HourLogRepository>,
    audit: Arc<AuditTrail>,
}

impl HourLogApi {
    pub fn new(
        service: Arc<HourLoggingService>,
        hour_log_repo: Arc<HourLogRepository>,
        audit: Arc<AuditTrail>,
    ) -> Self {
        Self {
            service,
            hour_log_repo,
            audit,
        }
    }

    /// 记录工时
    ///
    /// 评估失败时仍返回 Ok，`evaluation_error` 携带失败原因
    pub fn record(&self, request: HourLogRequest, actor: &str) -> ApiResult<HourLogOutcome> {
        let outcome = self.service.record(&request)?;
        self.audit_recorded(&outcome, actor);
        Ok(outcome)
    }

    pub fn record_as_of(
        &self,
        request: HourLogRequest,
        actor: &str,
        today: NaiveDate,
    ) -> ApiResult<HourLogOutcome> {
        let outcome = self.service.record_as_of(&request, today)?;
        self.audit_recorded(&outcome, actor);
        Ok(outcome)
    }

    fn audit_recorded(&self, outcome: &HourLogOutcome, actor: &str) {
        let alarm_ids: Vec<i64> = outcome
            .evaluation
            .as_ref()
            .map(|r| r.alarms.iter().map(|a| a.alarm_id).collect())
            .unwrap_or_default();
        self.audit.record(
            ActionType::HourLogRecorded,
            actor,
            Some(outcome.log.machine_id),
            json!({
                "log_id": outcome.log.log_id,
                "work_date": outcome.log.work_date,
                "hours_worked": outcome.log.hours_worked.to_string(),
                "project_id": outcome.log.project_id,
                "total_hours": outcome.machine.total_hours.to_string(),
                "alarm_ids": alarm_ids,
                "evaluation_error": outcome.evaluation_error,
            }),
            format!(
                "{} 记录 {} h",
                outcome.log.work_date,
                outcome.log.hours_worked.normalize()
            ),
        );
    }

    pub fn get(&self, log_id: i64) -> ApiResult<HourLog> {
        self.hour_log_repo
            .find_by_id(log_id)?
            .ok_or_else(|| ApiError::NotFound(format!("HourLog(id={})不存在", log_id)))
    }

    pub fn list_for_machine(&self, machine_id: i64) -> ApiResult<Vec<HourLog>> {
        Ok(self.hour_log_repo.list_for_machine(machine_id)?)
    }

    pub fn list_for_project(&self, project_id: i64) -> ApiResult<Vec<HourLog>> {
        Ok(self.hour_log_repo.list_for_project(project_id)?)
    }

    /// 日期区间查询（含两端）
    pub fn list_between(&self, from: NaiveDate, to: NaiveDate) -> ApiResult<Vec<HourLog>> {
        if from > to {
            return Err(ApiError::validation("from", "起始日期不能晚于结束日期"));
        }
        Ok(self.hour_log_repo.list_between(from, to)?)
    }

    pub fn total_hours_for_machine(&self, machine_id: i64) -> ApiResult<Decimal> {
        Ok(self.hour_log_repo.total_hours_for_machine(machine_id)?)
    }
}
