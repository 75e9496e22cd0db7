// ==========================================
// 引擎单元测试 - 内存协作方实现
// ==========================================

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::domain::{
    Alarm, HourLog, HourLogRequest, Machine, MachineState, MaintenanceEvent, MaintenanceKind,
    NewAlarm, PolicyKind, ProjectAssignment, ScheduledMaintenancePolicy,
};
use crate::engine::repositories::{
    AlarmSink, AssignmentLedger, CommittedHourLog, FleetRepositories, HourLedgerStore,
    MachineRegistry, MaintenanceCatalog, MaintenanceHistory,
};
use crate::repository::{RepositoryError, RepositoryResult};

fn ts() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

#[derive(Default)]
struct State {
    next_id: i64,
    machines: BTreeMap<i64, Machine>,
    policies: Vec<ScheduledMaintenancePolicy>,
    events: Vec<MaintenanceEvent>,
    assignments: BTreeMap<i64, ProjectAssignment>,
    alarms: Vec<Alarm>,
    logs: Vec<HourLog>,
    fail_alarm_writes: bool,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// 内存版车队数据，实现引擎依赖的全部接口
#[derive(Clone, Default)]
pub struct InMemoryFleet {
    state: Arc<Mutex<State>>,
}

impl InMemoryFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(&self) -> FleetRepositories {
        let shared = Arc::new(self.clone());
        FleetRepositories {
            machines: shared.clone(),
            catalog: shared.clone(),
            history: shared.clone(),
            assignments: shared.clone(),
            alarms: shared.clone(),
            hour_logs: shared,
        }
    }

    pub fn add_machine(&self, total_hours: Decimal, state: MachineState) -> i64 {
        let mut s = self.state.lock().unwrap();
        let id = s.next_id();
        s.machines.insert(
            id,
            Machine {
                machine_id: id,
                name: format!("M-{}", id),
                model: None,
                brand: None,
                serial_number: None,
                acquired_on: None,
                total_hours,
                state,
                created_at: ts(),
                updated_at: ts(),
            },
        );
        id
    }

    pub fn add_policy(&self, machine_id: i64, name: &str, kind: PolicyKind, interval: i64) -> i64 {
        let mut s = self.state.lock().unwrap();
        let id = s.next_id();
        s.policies.push(ScheduledMaintenancePolicy {
            policy_id: id,
            machine_id,
            name: name.to_string(),
            kind,
            interval_hours: interval,
            description: None,
            created_at: ts(),
        });
        id
    }

    pub fn add_event(&self, machine_id: i64, policy_id: Option<i64>, hours: Decimal) -> i64 {
        let mut s = self.state.lock().unwrap();
        let id = s.next_id();
        s.events.push(MaintenanceEvent {
            event_id: id,
            machine_id,
            policy_id,
            kind: MaintenanceKind::Preventive,
            description: "定期保养作业记录".to_string(),
            performed_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            hours_at_service: hours,
            cost: Decimal::ZERO,
            created_at: ts(),
        });
        id
    }

    pub fn add_assignment(
        &self,
        machine_id: i64,
        project_id: i64,
        pact: Decimal,
        accumulated: Decimal,
    ) -> i64 {
        let mut s = self.state.lock().unwrap();
        let id = s.next_id();
        s.assignments.insert(
            id,
            ProjectAssignment {
                assignment_id: id,
                machine_id,
                project_id,
                pact_hours: pact,
                accumulated_hours: accumulated,
                finalized: accumulated >= pact,
                created_at: ts(),
                updated_at: ts(),
            },
        );
        id
    }

    pub fn fail_alarm_writes(&self) {
        self.state.lock().unwrap().fail_alarm_writes = true;
    }

    pub fn machine(&self, machine_id: i64) -> Machine {
        self.state.lock().unwrap().machines[&machine_id].clone()
    }

    pub fn assignment(&self, assignment_id: i64) -> ProjectAssignment {
        self.state.lock().unwrap().assignments[&assignment_id].clone()
    }

    pub fn alarm_count(&self) -> usize {
        self.state.lock().unwrap().alarms.len()
    }

    pub fn log_count(&self) -> usize {
        self.state.lock().unwrap().logs.len()
    }
}

impl MachineRegistry for InMemoryFleet {
    fn get(&self, machine_id: i64) -> RepositoryResult<Option<Machine>> {
        Ok(self.state.lock().unwrap().machines.get(&machine_id).cloned())
    }

    fn list_all(&self) -> RepositoryResult<Vec<Machine>> {
        Ok(self.state.lock().unwrap().machines.values().cloned().collect())
    }

    fn add_hours(&self, machine_id: i64, delta: Decimal) -> RepositoryResult<Machine> {
        let mut s = self.state.lock().unwrap();
        let machine = s
            .machines
            .get_mut(&machine_id)
            .ok_or_else(|| RepositoryError::not_found("Machine", machine_id))?;
        machine.total_hours += delta;
        Ok(machine.clone())
    }

    fn set_state(&self, machine_id: i64, state: MachineState) -> RepositoryResult<Machine> {
        let mut s = self.state.lock().unwrap();
        let machine = s
            .machines
            .get_mut(&machine_id)
            .ok_or_else(|| RepositoryError::not_found("Machine", machine_id))?;
        machine.state = state;
        Ok(machine.clone())
    }
}

impl MaintenanceCatalog for InMemoryFleet {
    fn list_for_machine(&self, machine_id: i64) -> RepositoryResult<Vec<ScheduledMaintenancePolicy>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .policies
            .iter()
            .filter(|p| p.machine_id == machine_id)
            .cloned()
            .collect())
    }
}

impl MaintenanceHistory for InMemoryFleet {
    fn last_event_for(
        &self,
        machine_id: i64,
        policy_id: i64,
    ) -> RepositoryResult<Option<MaintenanceEvent>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|e| e.machine_id == machine_id && e.policy_id == Some(policy_id))
            .max_by_key(|e| (e.performed_on, e.event_id))
            .cloned())
    }
}

impl AssignmentLedger for InMemoryFleet {
    fn active_assignment(
        &self,
        machine_id: i64,
        project_id: i64,
    ) -> RepositoryResult<Option<ProjectAssignment>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .assignments
            .values()
            .find(|a| a.machine_id == machine_id && a.project_id == project_id && !a.finalized)
            .cloned())
    }

    fn active_for_machine(&self, machine_id: i64) -> RepositoryResult<Option<ProjectAssignment>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .assignments
            .values()
            .find(|a| a.machine_id == machine_id && !a.finalized)
            .cloned())
    }
}

impl AlarmSink for InMemoryFleet {
    fn create(&self, alarm: &NewAlarm) -> RepositoryResult<Alarm> {
        let mut s = self.state.lock().unwrap();
        if s.fail_alarm_writes {
            return Err(RepositoryError::DatabaseQueryError("alarm table unavailable".into()));
        }
        let id = s.next_id();
        let created = Alarm {
            alarm_id: id,
            machine_id: alarm.machine_id,
            kind: alarm.kind.clone(),
            severity: alarm.severity,
            description: alarm.description.clone(),
            acknowledged: false,
            created_at: ts(),
        };
        s.alarms.push(created.clone());
        Ok(created)
    }
}

impl HourLedgerStore for InMemoryFleet {
    fn exists_for_day(&self, machine_id: i64, work_date: NaiveDate) -> RepositoryResult<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .logs
            .iter()
            .any(|l| l.machine_id == machine_id && l.work_date == work_date))
    }

    fn commit(
        &self,
        request: &HourLogRequest,
        assignment: Option<&ProjectAssignment>,
    ) -> RepositoryResult<CommittedHourLog> {
        let mut s = self.state.lock().unwrap();
        if s
            .logs
            .iter()
            .any(|l| l.machine_id == request.machine_id && l.work_date == request.work_date)
        {
            return Err(RepositoryError::UniqueConstraintViolation(
                "UNIQUE constraint failed: machine_hour_log.machine_id, machine_hour_log.work_date"
                    .into(),
            ));
        }
        let machine = {
            let m = s
                .machines
                .get_mut(&request.machine_id)
                .ok_or_else(|| RepositoryError::not_found("Machine", request.machine_id))?;
            m.total_hours += request.hours_worked;
            m.clone()
        };
        if let Some(a) = assignment {
            s.assignments.insert(a.assignment_id, a.clone());
        }
        let id = s.next_id();
        let log = HourLog {
            log_id: id,
            machine_id: request.machine_id,
            project_id: request.project_id,
            assignment_id: assignment.map(|a| a.assignment_id),
            work_date: request.work_date,
            hours_worked: request.hours_worked,
            notes: request.notes.clone(),
            evidence: request.evidence.clone(),
            created_at: ts(),
        };
        s.logs.push(log.clone());
        Ok(CommittedHourLog {
            log,
            machine,
            assignment: assignment.cloned(),
        })
    }
}
