// ==========================================
// 车队维保管理系统 - 保养阈值评估引擎
// ==========================================
// 职责: 对机器的每个定期保养计划计算剩余工时并分类
//       超期 → 严重告警 + 强制停用；即将到期 → 中级告警
// 红线: Engine 不拼 SQL，只依赖 repositories 中的接口
// 红线: 同一机器的评估必须在机器锁内执行
// ==========================================
// 分类规则 (remaining = 上次保养工时 + 间隔 - 当前累计工时):
//   remaining ≤ 0        → Overdue
//   0 < remaining ≤ 20   → DueSoon
//   remaining > 20       → UpToDate
// ==========================================

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::domain::{
    Alarm, AlarmKind, AlarmSeverity, Machine, MachineState, MaintenanceEvent, MaintenanceStatus,
    NewAlarm, PolicyKind, ScheduledMaintenancePolicy,
};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{FleetEvent, FleetEventPublisher, OptionalEventPublisher};
use crate::engine::machine_locks::MachineLocks;
use crate::engine::repositories::{
    AlarmSink, FleetRepositories, MachineRegistry, MaintenanceCatalog, MaintenanceHistory,
};

/// 即将到期区间 (小时)
pub const DUE_SOON_BAND_HOURS: i64 = 20;

/// 按剩余工时分类
pub fn classify(remaining: Decimal) -> MaintenanceStatus {
    if remaining <= Decimal::ZERO {
        MaintenanceStatus::Overdue
    } else if remaining <= Decimal::from(DUE_SOON_BAND_HOURS) {
        MaintenanceStatus::DueSoon
    } else {
        MaintenanceStatus::UpToDate
    }
}

// ==========================================
// PolicyAssessment - 单个计划的评估结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAssessment {
    pub policy_id: i64,
    pub policy_name: String,
    pub policy_kind: PolicyKind,
    pub baseline_hours: Decimal, // 上次保养时的累计工时
    pub next_due: Decimal,
    pub remaining: Decimal,
    pub status: MaintenanceStatus,
}

/// 评估单个计划；无保养基线时返回 None（计划处于休眠）
pub fn assess_policy(
    policy: &ScheduledMaintenancePolicy,
    last_event: Option<&MaintenanceEvent>,
    total_hours: Decimal,
) -> Option<PolicyAssessment> {
    let event = last_event?;
    let next_due = policy.next_due(event.hours_at_service);
    let remaining = next_due - total_hours;
    Some(PolicyAssessment {
        policy_id: policy.policy_id,
        policy_name: policy.name.clone(),
        policy_kind: policy.kind,
        baseline_hours: event.hours_at_service,
        next_due,
        remaining,
        status: classify(remaining),
    })
}

// ==========================================
// EvaluationReport - 单台机器的评估报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub machine_id: i64,
    pub total_hours: Decimal,
    pub assessments: Vec<PolicyAssessment>,
    pub alarms: Vec<Alarm>,
    pub machine: Machine, // 评估结束后的机器快照
    pub forced_out_of_service: bool,
}

impl EvaluationReport {
    pub fn resulting_state(&self) -> MachineState {
        self.machine.state
    }

    /// 机器整体保养状态（Overdue > DueSoon > UpToDate）
    pub fn overall_status(&self) -> MaintenanceStatus {
        self.assessments
            .iter()
            .map(|a| a.status)
            .max()
            .unwrap_or(MaintenanceStatus::UpToDate)
    }
}

/// 全车队评估结果
#[derive(Debug, Default)]
pub struct FleetEvaluation {
    pub reports: Vec<EvaluationReport>,
    pub failures: Vec<(i64, String)>,
}

impl FleetEvaluation {
    pub fn alarm_count(&self) -> usize {
        self.reports.iter().map(|r| r.alarms.len()).sum()
    }
}

// ==========================================
// ThresholdEvaluator - 阈值评估引擎
// ==========================================
pub struct ThresholdEvaluator {
    machines: Arc<dyn MachineRegistry>,
    catalog: Arc<dyn MaintenanceCatalog>,
    history: Arc<dyn MaintenanceHistory>,
    alarms: Arc<dyn AlarmSink>,
    locks: Arc<MachineLocks>,
    publisher: OptionalEventPublisher,
}

impl ThresholdEvaluator {
    pub fn new(repos: &FleetRepositories, locks: Arc<MachineLocks>) -> Self {
        Self {
            machines: repos.machines.clone(),
            catalog: repos.catalog.clone(),
            history: repos.history.clone(),
            alarms: repos.alarms.clone(),
            locks,
            publisher: OptionalEventPublisher::none(),
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn FleetEventPublisher>) -> Self {
        self.publisher = OptionalEventPublisher::with_publisher(publisher);
        self
    }

    /// 评估单台机器（自行获取机器锁）
    pub fn evaluate(&self, machine_id: i64) -> EngineResult<EvaluationReport> {
        self.locks
            .with_lock(machine_id, || self.evaluate_locked(machine_id))
    }

    /// 评估单台机器（调用方已持有该机器的锁）
    pub(crate) fn evaluate_locked(&self, machine_id: i64) -> EngineResult<EvaluationReport> {
        let mut machine = self
            .machines
            .get(machine_id)?
            .ok_or(EngineError::MachineNotFound(machine_id))?;
        let total_hours = machine.total_hours;

        let mut assessments = Vec::new();
        let mut alarms = Vec::new();
        let mut forced_out_of_service = false;

        for policy in self.catalog.list_for_machine(machine_id)? {
            let last_event = self.history.last_event_for(machine_id, policy.policy_id)?;
            let assessment = match assess_policy(&policy, last_event.as_ref(), total_hours) {
                Some(a) => a,
                None => {
                    debug!(
                        machine_id,
                        policy_id = policy.policy_id,
                        "保养计划尚无基线记录，跳过"
                    );
                    continue;
                }
            };

            match assessment.status {
                MaintenanceStatus::Overdue => {
                    if machine.state != MachineState::OutOfService {
                        let previous_state = machine.state;
                        machine = self
                            .machines
                            .set_state(machine_id, MachineState::OutOfService)?;
                        forced_out_of_service = true;
                        warn!(
                            machine_id,
                            policy_id = policy.policy_id,
                            %previous_state,
                            %total_hours,
                            "保养超期，机器被强制停用"
                        );
                        self.publisher.publish(&FleetEvent::MachineForcedOutOfService {
                            machine_id,
                            policy_id: policy.policy_id,
                            previous_state,
                            total_hours,
                        });
                    }
                    let description = format!(
                        "保养计划「{}」({}) 已到期: 机器 {} 当前累计工时 {} h，应于 {} h 执行保养",
                        policy.name,
                        policy.kind,
                        machine_id,
                        total_hours.normalize(),
                        assessment.next_due.normalize()
                    );
                    alarms.push(self.raise(machine_id, AlarmSeverity::Critical, description)?);
                }
                MaintenanceStatus::DueSoon => {
                    let description = format!(
                        "保养计划「{}」({}) 即将到期: 机器 {} 剩余 {} h",
                        policy.name,
                        policy.kind,
                        machine_id,
                        assessment.remaining.round_dp(2).normalize()
                    );
                    alarms.push(self.raise(machine_id, AlarmSeverity::Medium, description)?);
                }
                MaintenanceStatus::UpToDate => {}
            }

            assessments.push(assessment);
        }

        Ok(EvaluationReport {
            machine_id,
            total_hours,
            assessments,
            alarms,
            machine,
            forced_out_of_service,
        })
    }

    fn raise(
        &self,
        machine_id: i64,
        severity: AlarmSeverity,
        description: String,
    ) -> EngineResult<Alarm> {
        let alarm = self.alarms.create(&NewAlarm {
            machine_id,
            kind: AlarmKind::Maintenance.as_str().to_string(),
            severity,
            description: Some(description),
        })?;
        info!(
            machine_id,
            alarm_id = alarm.alarm_id,
            severity = %alarm.severity,
            "已生成保养告警"
        );
        Ok(alarm)
    }

    /// 全车队巡检：逐台评估，单台失败不影响其余机器
    pub fn evaluate_fleet(&self) -> EngineResult<FleetEvaluation> {
        let mut result = FleetEvaluation::default();
        for machine in self.machines.list_all()? {
            match self.evaluate(machine.machine_id) {
                Ok(report) => result.reports.push(report),
                Err(e) => {
                    error!(machine_id = machine.machine_id, error = %e, "机器阈值评估失败");
                    result.failures.push((machine.machine_id, e.to_string()));
                }
            }
        }
        info!(
            machines = result.reports.len(),
            failures = result.failures.len(),
            alarms = result.alarm_count(),
            "全车队阈值巡检完成"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::InMemoryFleet;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(d(0)), MaintenanceStatus::Overdue);
        assert_eq!(classify(d(-5)), MaintenanceStatus::Overdue);
        assert_eq!(classify(Decimal::new(1, 2)), MaintenanceStatus::DueSoon);
        assert_eq!(classify(d(20)), MaintenanceStatus::DueSoon);
        assert_eq!(classify(d(21)), MaintenanceStatus::UpToDate);
        assert_eq!(classify(Decimal::new(2001, 2)), MaintenanceStatus::UpToDate);
    }

    fn evaluator(fleet: &InMemoryFleet) -> ThresholdEvaluator {
        ThresholdEvaluator::new(&fleet.repositories(), Arc::new(MachineLocks::new()))
    }

    #[test]
    fn test_overdue_creates_critical_alarm_and_forces_out_of_service() {
        let fleet = InMemoryFleet::new();
        let m = fleet.add_machine(d(600), MachineState::Operational);
        let p = fleet.add_policy(m, "换机油", PolicyKind::Preventive, 100);
        fleet.add_event(m, Some(p), d(500));

        let report = evaluator(&fleet).evaluate(m).unwrap();

        assert_eq!(report.alarms.len(), 1);
        assert_eq!(report.alarms[0].severity, AlarmSeverity::Critical);
        assert_eq!(report.alarms[0].kind, "maintenance");
        assert_eq!(report.assessments[0].remaining, d(0));
        assert_eq!(report.resulting_state(), MachineState::OutOfService);
        assert!(report.forced_out_of_service);
        assert_eq!(fleet.machine(m).state, MachineState::OutOfService);
    }

    #[test]
    fn test_due_soon_creates_medium_alarm_and_keeps_state() {
        let fleet = InMemoryFleet::new();
        let m = fleet.add_machine(d(581), MachineState::Operational);
        let p = fleet.add_policy(m, "换机油", PolicyKind::Preventive, 100);
        fleet.add_event(m, Some(p), d(500));

        let report = evaluator(&fleet).evaluate(m).unwrap();

        assert_eq!(report.assessments[0].remaining, d(19));
        assert_eq!(report.alarms.len(), 1);
        assert_eq!(report.alarms[0].severity, AlarmSeverity::Medium);
        assert_eq!(report.resulting_state(), MachineState::Operational);
        assert!(!report.forced_out_of_service);
    }

    #[test]
    fn test_up_to_date_creates_no_alarm() {
        let fleet = InMemoryFleet::new();
        let m = fleet.add_machine(d(579), MachineState::Operational);
        let p = fleet.add_policy(m, "换机油", PolicyKind::Preventive, 100);
        fleet.add_event(m, Some(p), d(500));

        let report = evaluator(&fleet).evaluate(m).unwrap();
        assert!(report.alarms.is_empty());
        assert_eq!(report.overall_status(), MaintenanceStatus::UpToDate);
    }

    #[test]
    fn test_policy_without_baseline_is_dormant() {
        let fleet = InMemoryFleet::new();
        let m = fleet.add_machine(d(10_000), MachineState::Operational);
        fleet.add_policy(m, "液压检查", PolicyKind::Predictive, 50);

        let report = evaluator(&fleet).evaluate(m).unwrap();
        assert!(report.assessments.is_empty());
        assert!(report.alarms.is_empty());
        assert_eq!(report.resulting_state(), MachineState::Operational);
    }

    #[test]
    fn test_each_policy_raises_its_own_alarm() {
        let fleet = InMemoryFleet::new();
        let m = fleet.add_machine(d(600), MachineState::InMaintenance);
        let p1 = fleet.add_policy(m, "换机油", PolicyKind::Preventive, 100);
        let p2 = fleet.add_policy(m, "振动分析", PolicyKind::Predictive, 110);
        fleet.add_event(m, Some(p1), d(500));
        fleet.add_event(m, Some(p2), d(500));

        let report = evaluator(&fleet).evaluate(m).unwrap();
        let severities: Vec<_> = report.alarms.iter().map(|a| a.severity).collect();
        assert_eq!(severities, vec![AlarmSeverity::Critical, AlarmSeverity::Medium]);
        assert_eq!(report.overall_status(), MaintenanceStatus::Overdue);
        assert_eq!(report.resulting_state(), MachineState::OutOfService);
    }

    #[test]
    fn test_reevaluation_repeats_alarms_without_dedup() {
        let fleet = InMemoryFleet::new();
        let m = fleet.add_machine(d(600), MachineState::Operational);
        let p = fleet.add_policy(m, "换机油", PolicyKind::Preventive, 100);
        fleet.add_event(m, Some(p), d(500));
        let evaluator = evaluator(&fleet);

        let first = evaluator.evaluate(m).unwrap();
        let second = evaluator.evaluate(m).unwrap();

        assert!(first.forced_out_of_service);
        assert!(!second.forced_out_of_service);
        assert_eq!(second.resulting_state(), MachineState::OutOfService);
        assert_eq!(fleet.alarm_count(), 2);
    }

    #[test]
    fn test_latest_event_is_the_baseline() {
        let fleet = InMemoryFleet::new();
        let m = fleet.add_machine(d(600), MachineState::Operational);
        let p = fleet.add_policy(m, "换机油", PolicyKind::Preventive, 100);
        fleet.add_event(m, Some(p), d(400));
        fleet.add_event(m, Some(p), d(550));

        let report = evaluator(&fleet).evaluate(m).unwrap();
        assert_eq!(report.assessments[0].remaining, d(50));
        assert!(report.alarms.is_empty());
    }

    #[test]
    fn test_missing_machine_is_reported() {
        let fleet = InMemoryFleet::new();
        assert!(matches!(
            evaluator(&fleet).evaluate(99),
            Err(EngineError::MachineNotFound(99))
        ));
    }

    #[test]
    fn test_evaluate_fleet_covers_every_machine() {
        let fleet = InMemoryFleet::new();
        let a = fleet.add_machine(d(600), MachineState::Operational);
        let pa = fleet.add_policy(a, "换机油", PolicyKind::Preventive, 100);
        fleet.add_event(a, Some(pa), d(500));
        fleet.add_machine(d(10), MachineState::Operational);

        let result = evaluator(&fleet).evaluate_fleet().unwrap();
        assert_eq!(result.reports.len(), 2);
        assert!(result.failures.is_empty());
        assert_eq!(result.alarm_count(), 1);
    }
}
