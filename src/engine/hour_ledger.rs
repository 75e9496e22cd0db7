// ==========================================
// 车队维保管理系统 - 工时记录服务
// ==========================================
// 流程 (机器锁内串行):
//   1. 校验前置条件（按字段报错）
//   2. 单事务提交: 机器工时 + 分配工时 + 工时记录
//   3. 调用阈值评估；评估失败不回滚已提交的工时
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info};

use crate::domain::hour_log::MAX_NOTES_CHARS;
use crate::domain::{HourLog, HourLogRequest, Machine, ProjectAssignment};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::machine_locks::MachineLocks;
use crate::engine::repositories::{
    AssignmentLedger, FleetRepositories, HourLedgerStore, MachineRegistry,
};
use crate::engine::threshold::{EvaluationReport, ThresholdEvaluator};
use crate::repository::RepositoryError;

/// 工时记录结果
#[derive(Debug, Clone, Serialize)]
pub struct HourLogOutcome {
    pub log: HourLog,
    pub machine: Machine,
    pub assignment: Option<ProjectAssignment>,
    pub evaluation: Option<EvaluationReport>,
    /// 评估失败信息（工时已提交，属于部分成功）
    pub evaluation_error: Option<String>,
}

impl HourLogOutcome {
    pub fn is_partial_success(&self) -> bool {
        self.evaluation_error.is_some()
    }
}

pub struct HourLoggingService {
    machines: Arc<dyn MachineRegistry>,
    assignments: Arc<dyn AssignmentLedger>,
    hour_logs: Arc<dyn HourLedgerStore>,
    evaluator: Arc<ThresholdEvaluator>,
    locks: Arc<MachineLocks>,
}

impl HourLoggingService {
    pub fn new(
        repos: &FleetRepositories,
        evaluator: Arc<ThresholdEvaluator>,
        locks: Arc<MachineLocks>,
    ) -> Self {
        Self {
            machines: repos.machines.clone(),
            assignments: repos.assignments.clone(),
            hour_logs: repos.hour_logs.clone(),
            evaluator,
            locks,
        }
    }

    /// 记录工时（以本地日期作为“今天”）
    pub fn record(&self, request: &HourLogRequest) -> EngineResult<HourLogOutcome> {
        self.record_as_of(request, chrono::Local::now().date_naive())
    }

    /// 记录工时
    ///
    /// # 参数
    /// - `request`: 工时记录请求
    /// - `today`: 判断“未来日期”的基准日
    pub fn record_as_of(
        &self,
        request: &HourLogRequest,
        today: NaiveDate,
    ) -> EngineResult<HourLogOutcome> {
        validate_request_shape(request, today)?;

        self.locks.with_lock(request.machine_id, || {
            let assignment = self.check_preconditions(request)?;

            let committed = self
                .hour_logs
                .commit(request, assignment.as_ref())
                .map_err(|e| match e {
                    RepositoryError::UniqueConstraintViolation(_) => EngineError::validation(
                        "work_date",
                        format!("机器 {} 在 {} 已有工时记录", request.machine_id, request.work_date),
                    ),
                    other => EngineError::Repository(other),
                })?;

            info!(
                machine_id = request.machine_id,
                log_id = committed.log.log_id,
                hours = %request.hours_worked,
                total_hours = %committed.machine.total_hours,
                "工时记录已提交"
            );

            let mut outcome = HourLogOutcome {
                log: committed.log,
                machine: committed.machine,
                assignment: committed.assignment,
                evaluation: None,
                evaluation_error: None,
            };

            match self.evaluator.evaluate_locked(request.machine_id) {
                Ok(report) => {
                    outcome.machine = report.machine.clone();
                    outcome.evaluation = Some(report);
                }
                Err(e) => {
                    error!(
                        machine_id = request.machine_id,
                        log_id = outcome.log.log_id,
                        error = %e,
                        "工时已提交，但阈值评估失败"
                    );
                    outcome.evaluation_error = Some(e.to_string());
                }
            }

            Ok(outcome)
        })
    }

    /// 依赖存储状态的前置条件；返回已按累加规则更新后的分配快照
    fn check_preconditions(
        &self,
        request: &HourLogRequest,
    ) -> EngineResult<Option<ProjectAssignment>> {
        let machine = self.machines.get(request.machine_id)?.ok_or_else(|| {
            EngineError::validation("machine_id", format!("机器不存在: {}", request.machine_id))
        })?;

        if !machine.accepts_hours() {
            return Err(EngineError::validation(
                "machine_id",
                format!("机器 {} 已停用，不能记录工时", machine.machine_id),
            ));
        }

        if self
            .hour_logs
            .exists_for_day(request.machine_id, request.work_date)?
        {
            return Err(EngineError::validation(
                "work_date",
                format!("机器 {} 在 {} 已有工时记录", request.machine_id, request.work_date),
            ));
        }

        let Some(project_id) = request.project_id else {
            return Ok(None);
        };

        let mut assignment = self
            .assignments
            .active_assignment(request.machine_id, project_id)?
            .ok_or_else(|| {
                EngineError::validation(
                    "project_id",
                    format!(
                        "机器 {} 与项目 {} 之间没有未完结的分配",
                        request.machine_id, project_id
                    ),
                )
            })?;

        if assignment.would_exceed_pact(request.hours_worked) {
            return Err(EngineError::validation(
                "hours_worked",
                format!(
                    "超出项目约定工时: 已累计 {} h + 本次 {} h > 约定 {} h",
                    assignment.accumulated_hours.normalize(),
                    request.hours_worked.normalize(),
                    assignment.pact_hours.normalize()
                ),
            ));
        }

        assignment
            .apply_hours(request.hours_worked)
            .map_err(|e| EngineError::validation("project_id", e.to_string()))?;

        Ok(Some(assignment))
    }
}

/// 不依赖存储的请求校验
fn validate_request_shape(request: &HourLogRequest, today: NaiveDate) -> EngineResult<()> {
    if request.hours_worked <= Decimal::ZERO {
        return Err(EngineError::validation("hours_worked", "工时必须大于 0"));
    }
    if request.work_date > today {
        return Err(EngineError::validation(
            "work_date",
            format!("工作日期不能晚于今天: {}", request.work_date),
        ));
    }
    if let Some(notes) = &request.notes {
        if notes.chars().count() > MAX_NOTES_CHARS {
            return Err(EngineError::validation(
                "notes",
                format!("备注不能超过 {} 个字符", MAX_NOTES_CHARS),
            ));
        }
    }
    Ok(())
}
