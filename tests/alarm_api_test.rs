// ==========================================
// AlarmApi 集成测试
// ==========================================
// 测试范围:
// 1. 手动创建: 类型词表 / 描述长度 / 严重告警必填描述 / 去重
// 2. 确认与删除（含不存在的 id）
// 3. 仪表盘统计与配置项
// 4. 自动告警路径不去重
// ==========================================


use fleet_maintenance::api::ApiError;
use fleet_maintenance::config::config_keys;
use fleet_maintenance::domain::{ActionType, AlarmSeverity, HourLogRequest, NewAlarm, PolicyKind};
use test_helpers::*;

fn alarm(machine_id: i64, kind: &str, severity: AlarmSeverity, description: Option<&str>) -> NewAlarm {
    NewAlarm {
        machine_id,
        kind: kind.to_string(),
        severity,
        description: description.map(str::to_string),
    }
}

#[test]
fn test_manual_create_normalizes_kind_and_audits() {
    let env = FleetTestEnv::new().unwrap();
    let machine = env.add_machine("挖掘机-01");

    let created = env
        .state
        .alarm_api
        .create(
            alarm(machine.machine_id, "  Project ", AlarmSeverity::High, Some("项目工时即将用尽")),
            TEST_ACTOR,
        )
        .unwrap();
    assert_eq!(created.kind, "project");
    assert!(!created.acknowledged);

    let logs = env
        .state
        .action_log_repo
        .find_by_type(ActionType::AlarmCreated.as_str(), 10)
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].machine_id, Some(machine.machine_id));
}

#[test]
fn test_manual_create_field_validation() {
    let env = FleetTestEnv::new().unwrap();
    let machine = env.add_machine("挖掘机-02");
    let api = &env.state.alarm_api;

    let err = api
        .create(alarm(machine.machine_id, "weather", AlarmSeverity::Low, None), TEST_ACTOR)
        .unwrap_err();
    assert_eq!(err.fields(), vec!["kind"]);

    let err = api
        .create(
            alarm(machine.machine_id, "state", AlarmSeverity::Low, Some("  短  ")),
            TEST_ACTOR,
        )
        .unwrap_err();
    assert_eq!(err.fields(), vec!["description"]);

    let err = api
        .create(alarm(machine.machine_id, "system", AlarmSeverity::Critical, None), TEST_ACTOR)
        .unwrap_err();
    assert_eq!(err.fields(), vec!["description"]);

    // 类型无效与描述过短同时报告，类型排在最前
    let err = api
        .create(
            alarm(machine.machine_id, "weather", AlarmSeverity::Low, Some("短")),
            TEST_ACTOR,
        )
        .unwrap_err();
    assert_eq!(err.fields(), vec!["kind", "description"]);

    let err = api
        .create(alarm(9999, "system", AlarmSeverity::Low, None), TEST_ACTOR)
        .unwrap_err();
    assert_eq!(err.fields(), vec!["machine_id"]);
}

#[test]
fn test_manual_dedup_until_acknowledged() {
    let env = FleetTestEnv::new().unwrap();
    let machine = env.add_machine("装载机-03");
    let api = &env.state.alarm_api;

    let first = api
        .create(alarm(machine.machine_id, "state", AlarmSeverity::Medium, None), TEST_ACTOR)
        .unwrap();

    // 大小写不同仍视为同一类型
    let err = api
        .create(alarm(machine.machine_id, "STATE", AlarmSeverity::High, None), TEST_ACTOR)
        .unwrap_err();
    assert_eq!(err.fields(), vec!["kind"]);

    // 其他类型不受影响
    api.create(alarm(machine.machine_id, "system", AlarmSeverity::Low, None), TEST_ACTOR)
        .unwrap();

    let acked = api.acknowledge(first.alarm_id, TEST_ACTOR).unwrap();
    assert!(acked.acknowledged);

    api.create(alarm(machine.machine_id, "state", AlarmSeverity::Medium, None), TEST_ACTOR)
        .unwrap();
    assert_eq!(api.list_for_machine(machine.machine_id).unwrap().len(), 3);
    assert_eq!(api.count_unacknowledged().unwrap(), 2);
}

#[test]
fn test_acknowledge_and_delete_unknown_id_is_not_found() {
    let env = FleetTestEnv::new().unwrap();
    let api = &env.state.alarm_api;

    assert!(matches!(api.acknowledge(404, TEST_ACTOR), Err(ApiError::NotFound(_))));
    assert!(matches!(api.delete(404, TEST_ACTOR), Err(ApiError::NotFound(_))));
}

#[test]
fn test_delete_removes_alarm() {
    let env = FleetTestEnv::new().unwrap();
    let machine = env.add_machine("吊车-04");
    let api = &env.state.alarm_api;

    let created = api
        .create(alarm(machine.machine_id, "system", AlarmSeverity::Low, None), TEST_ACTOR)
        .unwrap();
    api.delete(created.alarm_id, TEST_ACTOR).unwrap();

    assert!(api.list_all().unwrap().is_empty());
    assert_eq!(
        env.state
            .action_log_repo
            .find_by_type(ActionType::AlarmDeleted.as_str(), 10)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_automatic_alarms_are_not_deduplicated() {
    let env = FleetTestEnv::new().unwrap();
    let machine = env.add_machine("推土机-05");
    let policy = env.add_policy(machine.machine_id, "500小时保养", PolicyKind::Preventive, 500);
    env.service(machine.machine_id, &policy, 100, june(1));
    env.state
        .hour_log_api
        .record_as_of(
            HourLogRequest::new(machine.machine_id, june(2), hours(585)),
            TEST_ACTOR,
            today(),
        )
        .unwrap();

    // 手动重复评估，每次都新增一条
    env.state.fleet_api.evaluate_machine(machine.machine_id).unwrap();
    env.state.fleet_api.evaluate_machine(machine.machine_id).unwrap();

    let alarms = env.state.alarm_api.list_by_kind("MAINTENANCE").unwrap();
    assert_eq!(alarms.len(), 3);
    assert!(alarms.iter().all(|a| a.severity == AlarmSeverity::Medium));

    // 手动入口仍对 maintenance 类型去重
    let err = env
        .state
        .alarm_api
        .create(alarm(machine.machine_id, "maintenance", AlarmSeverity::Low, None), TEST_ACTOR)
        .unwrap_err();
    assert_eq!(err.fields(), vec!["kind"]);
}

#[test]
fn test_dashboard_stats_and_latest_limit() {
    let env = FleetTestEnv::new().unwrap();
    let a = env.add_machine("挖掘机-06");
    let b = env.add_machine("挖掘机-07");
    let api = &env.state.alarm_api;

    let critical = api
        .create(
            alarm(a.machine_id, "maintenance", AlarmSeverity::Critical, Some("液压油温过高")),
            TEST_ACTOR,
        )
        .unwrap();
    api.create(alarm(a.machine_id, "project", AlarmSeverity::Low, None), TEST_ACTOR)
        .unwrap();
    api.create(alarm(b.machine_id, "project", AlarmSeverity::Medium, None), TEST_ACTOR)
        .unwrap();
    api.acknowledge(critical.alarm_id, TEST_ACTOR).unwrap();

    env.state
        .config_manager
        .set_global_config_value(config_keys::ALARM_DASHBOARD_LATEST_LIMIT, "2")
        .unwrap();

    let stats = api.dashboard_stats().unwrap();
    assert_eq!(stats.total_unacknowledged, 2);
    // 严重数与分组计数包含已确认告警
    assert_eq!(stats.total_critical, 1);
    assert_eq!(stats.by_severity.get("critical"), Some(&1));
    assert_eq!(stats.by_severity.get("low"), Some(&1));
    assert_eq!(stats.by_kind.get("project"), Some(&2));
    assert_eq!(stats.by_kind.get("maintenance"), Some(&1));
    assert_eq!(stats.latest.len(), 2);

    assert_eq!(api.list_critical().unwrap().len(), 1);
    assert_eq!(api.list_unacknowledged().unwrap().len(), 2);
    assert_eq!(api.list_recent(None).unwrap().len(), 3);
    assert_eq!(api.list_recent(Some(1)).unwrap().len(), 3);
    assert!(api.list_recent(Some(0)).is_err());
}
