// ==========================================
// 工时记录 → 阈值评估 集成测试
// ==========================================
// 测试范围:
// 1. 超期: 严重告警 + 强制停用 + 审计
// 2. 临近: 中等告警，机器保持运行
// 3. 前置条件: 同日重复 / 停用机器 / 未来日期 / 超出约定工时
// 4. 保养完成后机器恢复运行
// ==========================================


use fleet_maintenance::api::ApiError;
use fleet_maintenance::domain::{
    ActionType, AlarmSeverity, HourLogRequest, MachineState, MaintenanceKind,
    MaintenanceStatus, NewMaintenanceEvent, PolicyKind,
};
use test_helpers::*;

// ==========================================
// 阈值评估
// ==========================================

#[test]
fn test_overdue_raises_critical_alarm_and_forces_out_of_service() {
    let env = FleetTestEnv::new().unwrap();
    let machine = env.add_machine("挖掘机-01");
    let policy = env.add_policy(machine.machine_id, "500小时保养", PolicyKind::Preventive, 500);
    env.service(machine.machine_id, &policy, 100, june(1));

    // 应保养点 100 + 500 = 600 h，剩余恰为 0 即超期
    let outcome = env
        .state
        .hour_log_api
        .record_as_of(
            HourLogRequest::new(machine.machine_id, june(2), hours(600)),
            TEST_ACTOR,
            today(),
        )
        .unwrap();

    assert_eq!(outcome.machine.total_hours, hours(600));
    assert_eq!(outcome.machine.state, MachineState::OutOfService);
    assert!(!outcome.is_partial_success());

    let report = outcome.evaluation.expect("应返回评估报告");
    assert!(report.forced_out_of_service);
    assert_eq!(report.overall_status(), MaintenanceStatus::Overdue);
    assert_eq!(report.alarms.len(), 1);
    assert_eq!(report.alarms[0].severity, AlarmSeverity::Critical);
    assert_eq!(report.alarms[0].kind, "maintenance");

    let stored = env.machine(machine.machine_id);
    assert_eq!(stored.state, MachineState::OutOfService);

    let forced = env
        .state
        .action_log_repo
        .find_by_type(ActionType::ForcedOutOfService.as_str(), 10)
        .unwrap();
    assert_eq!(forced.len(), 1);
    assert_eq!(forced[0].machine_id, Some(machine.machine_id));
    assert_eq!(forced[0].actor, "system");

    let logged = env
        .state
        .action_log_repo
        .find_by_type(ActionType::HourLogRecorded.as_str(), 10)
        .unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].actor, TEST_ACTOR);
}

#[test]
fn test_due_soon_raises_medium_alarm_only() {
    let env = FleetTestEnv::new().unwrap();
    let machine = env.add_machine("装载机-02");
    let policy = env.add_policy(machine.machine_id, "500小时保养", PolicyKind::Preventive, 500);
    env.service(machine.machine_id, &policy, 100, june(1));

    // 剩余 600 - 581 = 19 h
    let outcome = env
        .state
        .hour_log_api
        .record_as_of(
            HourLogRequest::new(machine.machine_id, june(2), hours(581)),
            TEST_ACTOR,
            today(),
        )
        .unwrap();

    let report = outcome.evaluation.unwrap();
    assert_eq!(report.alarms.len(), 1);
    assert_eq!(report.alarms[0].severity, AlarmSeverity::Medium);
    assert!(!report.forced_out_of_service);
    assert_eq!(env.machine(machine.machine_id).state, MachineState::Operational);
}

#[test]
fn test_machine_without_baseline_raises_nothing() {
    let env = FleetTestEnv::new().unwrap();
    let machine = env.add_machine("压路机-03");
    env.add_policy(machine.machine_id, "250小时保养", PolicyKind::Preventive, 250);

    let outcome = env
        .state
        .hour_log_api
        .record_as_of(
            HourLogRequest::new(machine.machine_id, june(2), hours(900)),
            TEST_ACTOR,
            today(),
        )
        .unwrap();

    let report = outcome.evaluation.unwrap();
    assert!(report.alarms.is_empty());
    assert!(report.assessments.is_empty());
    assert_eq!(outcome.machine.state, MachineState::Operational);
}

// ==========================================
// 前置条件
// ==========================================

#[test]
fn test_second_log_same_day_is_rejected_on_work_date() {
    let env = FleetTestEnv::new().unwrap();
    let machine = env.add_machine("挖掘机-04");
    let api = &env.state.hour_log_api;

    api.record_as_of(
        HourLogRequest::new(machine.machine_id, june(3), hours(8)),
        TEST_ACTOR,
        today(),
    )
    .unwrap();
    let err = api
        .record_as_of(
            HourLogRequest::new(machine.machine_id, june(3), hours(4)),
            TEST_ACTOR,
            today(),
        )
        .unwrap_err();

    assert_eq!(err.fields(), vec!["work_date"]);
    assert_eq!(env.machine(machine.machine_id).total_hours, hours(8));
    assert_eq!(api.list_for_machine(machine.machine_id).unwrap().len(), 1);
}

#[test]
fn test_future_date_and_non_positive_hours_are_rejected() {
    let env = FleetTestEnv::new().unwrap();
    let machine = env.add_machine("挖掘机-05");
    let api = &env.state.hour_log_api;

    let future = today().succ_opt().unwrap();
    let err = api
        .record_as_of(
            HourLogRequest::new(machine.machine_id, future, hours(8)),
            TEST_ACTOR,
            today(),
        )
        .unwrap_err();
    assert_eq!(err.fields(), vec!["work_date"]);

    let err = api
        .record_as_of(
            HourLogRequest::new(machine.machine_id, june(4), hours(0)),
            TEST_ACTOR,
            today(),
        )
        .unwrap_err();
    assert_eq!(err.fields(), vec!["hours_worked"]);
}

#[test]
fn test_unknown_machine_is_a_validation_error() {
    let env = FleetTestEnv::new().unwrap();
    let err = env
        .state
        .hour_log_api
        .record_as_of(HourLogRequest::new(9999, june(4), hours(8)), TEST_ACTOR, today())
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation { ref field, .. } if field == "machine_id"));
}

#[test]
fn test_out_of_service_blocks_logging_until_maintenance_recorded() {
    let env = FleetTestEnv::new().unwrap();
    let machine = env.add_machine("推土机-06");
    let policy = env.add_policy(machine.machine_id, "300小时保养", PolicyKind::Preventive, 300);
    env.service(machine.machine_id, &policy, 50, june(1));

    let api = &env.state.hour_log_api;
    api.record_as_of(
        HourLogRequest::new(machine.machine_id, june(2), hours(360)),
        TEST_ACTOR,
        today(),
    )
    .unwrap();
    assert_eq!(env.machine(machine.machine_id).state, MachineState::OutOfService);

    let err = api
        .record_as_of(
            HourLogRequest::new(machine.machine_id, june(3), hours(8)),
            TEST_ACTOR,
            today(),
        )
        .unwrap_err();
    assert_eq!(err.fields(), vec!["machine_id"]);

    // 保养完成 → 恢复运行，新基线 360
    env.state
        .maintenance_api
        .record_as_of(
            NewMaintenanceEvent {
                machine_id: machine.machine_id,
                policy_id: Some(policy.policy_id),
                kind: MaintenanceKind::Preventive,
                description: "更换机油、滤芯并检查液压系统".to_string(),
                performed_on: june(4),
                hours_at_service: hours(360),
                cost: hours(1500),
            },
            TEST_ACTOR,
            today(),
        )
        .unwrap();
    assert_eq!(env.machine(machine.machine_id).state, MachineState::Operational);

    let outcome = api
        .record_as_of(
            HourLogRequest::new(machine.machine_id, june(5), hours(8)),
            TEST_ACTOR,
            today(),
        )
        .unwrap();
    let report = outcome.evaluation.unwrap();
    assert_eq!(report.overall_status(), MaintenanceStatus::UpToDate);
    assert!(report.alarms.is_empty());
    assert_eq!(outcome.machine.total_hours, hours(368));
}

#[test]
fn test_deleted_machine_no_longer_accepts_hours() {
    let env = FleetTestEnv::new().unwrap();
    let machine = env.add_machine("压路机-09");
    let api = &env.state.hour_log_api;

    api.record_as_of(
        HourLogRequest::new(machine.machine_id, june(1), hours(8)),
        TEST_ACTOR,
        today(),
    )
    .unwrap();

    env.state.machine_api.delete(machine.machine_id).unwrap();
    assert!(api.list_for_machine(machine.machine_id).unwrap().is_empty());

    let err = api
        .record_as_of(
            HourLogRequest::new(machine.machine_id, june(2), hours(8)),
            TEST_ACTOR,
            today(),
        )
        .unwrap_err();
    assert_eq!(err.fields(), vec!["machine_id"]);

    assert!(matches!(
        env.state.machine_api.delete(machine.machine_id),
        Err(ApiError::NotFound(_))
    ));
}

// ==========================================
// 项目约定工时
// ==========================================

#[test]
fn test_pact_exceeded_is_rejected_and_exact_fill_finalizes() {
    let env = FleetTestEnv::new().unwrap();
    let machine = env.add_machine("挖掘机-07");
    let assignment = env.assign(machine.machine_id, 42, 200);
    let api = &env.state.hour_log_api;

    api.record_as_of(
        HourLogRequest::new(machine.machine_id, june(1), hours(190)).with_project(42),
        TEST_ACTOR,
        today(),
    )
    .unwrap();

    let err = api
        .record_as_of(
            HourLogRequest::new(machine.machine_id, june(2), hours(15)).with_project(42),
            TEST_ACTOR,
            today(),
        )
        .unwrap_err();
    assert_eq!(err.fields(), vec!["hours_worked"]);
    assert_eq!(env.machine(machine.machine_id).total_hours, hours(190));

    let outcome = api
        .record_as_of(
            HourLogRequest::new(machine.machine_id, june(2), hours(10)).with_project(42),
            TEST_ACTOR,
            today(),
        )
        .unwrap();
    let updated = outcome.assignment.expect("应返回分配快照");
    assert_eq!(updated.assignment_id, assignment.assignment_id);
    assert_eq!(updated.accumulated_hours, hours(200));
    assert!(updated.finalized);

    // 分配已完结，不再接受该项目的工时
    let err = api
        .record_as_of(
            HourLogRequest::new(machine.machine_id, june(3), hours(1)).with_project(42),
            TEST_ACTOR,
            today(),
        )
        .unwrap_err();
    assert_eq!(err.fields(), vec!["project_id"]);

    assert_eq!(api.list_for_project(42).unwrap().len(), 2);
    assert_eq!(api.total_hours_for_machine(machine.machine_id).unwrap(), hours(200));
}

#[test]
fn test_decimal_hours_accumulate_exactly() {
    let env = FleetTestEnv::new().unwrap();
    let machine = env.add_machine("吊车-08");
    let api = &env.state.hour_log_api;

    for day in 1..=10 {
        api.record_as_of(
            HourLogRequest::new(machine.machine_id, june(day), "0.1".parse().unwrap()),
            TEST_ACTOR,
            today(),
        )
        .unwrap();
    }
    assert_eq!(env.machine(machine.machine_id).total_hours, hours(1));
    assert_eq!(api.list_between(june(3), june(5)).unwrap().len(), 3);
}
