// ==========================================
// 并发工时记录测试
// ==========================================
// 职责: 验证同一机器的工时提交与阈值评估串行执行
// ==========================================


#[cfg(test)]
mod concurrent_hour_log_test {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use fleet_maintenance::domain::{HourLogRequest, MachineState, PolicyKind};

    use crate::test_helpers::*;

    const WORKERS: usize = 8;

    #[test]
    fn test_same_day_race_commits_exactly_one_log() {
        let env = FleetTestEnv::new().unwrap();
        let machine = env.add_machine("挖掘机-并发-01");
        let api = env.state.hour_log_api.clone();
        let barrier = Arc::new(Barrier::new(WORKERS));

        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                let api = api.clone();
                let barrier = barrier.clone();
                let machine_id = machine.machine_id;
                thread::spawn(move || {
                    barrier.wait();
                    api.record_as_of(
                        HourLogRequest::new(machine_id, june(1), hours(6)),
                        TEST_ACTOR,
                        today(),
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(err.fields(), vec!["work_date"]);
        }

        assert_eq!(env.machine(machine.machine_id).total_hours, hours(6));
    }

    #[test]
    fn test_distinct_days_accumulate_without_lost_updates() {
        let env = FleetTestEnv::new().unwrap();
        let machine = env.add_machine("挖掘机-并发-02");
        let assignment = env.assign(machine.machine_id, 11, 1000);
        let api = env.state.hour_log_api.clone();
        let barrier = Arc::new(Barrier::new(WORKERS));

        let handles: Vec<_> = (0..WORKERS)
            .map(|i| {
                let api = api.clone();
                let barrier = barrier.clone();
                let machine_id = machine.machine_id;
                thread::spawn(move || {
                    barrier.wait();
                    api.record_as_of(
                        HourLogRequest::new(machine_id, june(i as u32 + 1), hours(10))
                            .with_project(11),
                        TEST_ACTOR,
                        today(),
                    )
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap().unwrap();
        }

        assert_eq!(env.machine(machine.machine_id).total_hours, hours(80));
        let stored = env.state.assignment_api.get(assignment.assignment_id).unwrap();
        assert_eq!(stored.accumulated_hours, hours(80));
        assert!(!stored.finalized);
    }

    #[test]
    fn test_crossing_threshold_concurrently_forces_out_of_service_once() {
        let env = FleetTestEnv::new().unwrap();
        let machine = env.add_machine("挖掘机-并发-03");
        let policy = env.add_policy(machine.machine_id, "100小时保养", PolicyKind::Preventive, 100);
        env.service(machine.machine_id, &policy, 10, june(1));
        let api = env.state.hour_log_api.clone();
        let barrier = Arc::new(Barrier::new(WORKERS));

        // 应保养点 110 h；每条 20 h，第 6 条累计 120 h 时超期
        let handles: Vec<_> = (0..WORKERS)
            .map(|i| {
                let api = api.clone();
                let barrier = barrier.clone();
                let machine_id = machine.machine_id;
                thread::spawn(move || {
                    barrier.wait();
                    api.record_as_of(
                        HourLogRequest::new(machine_id, june(i as u32 + 2), hours(20)),
                        TEST_ACTOR,
                        today(),
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let forced = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .filter(|o| o.evaluation.as_ref().map_or(false, |e| e.forced_out_of_service))
            .count();
        assert_eq!(forced, 1);

        // 停用后的提交被拒绝；总工时只包含停用前（含触发停用的那条）提交
        let accepted = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(accepted, 6);
        assert_eq!(rejected, WORKERS - 6);
        assert_eq!(env.machine(machine.machine_id).total_hours, hours(120));
        assert_eq!(env.machine(machine.machine_id).state, MachineState::OutOfService);
    }
}
