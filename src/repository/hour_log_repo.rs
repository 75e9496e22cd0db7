// ==========================================
// 车队维保管理系统 - 机器工时记录仓储
// ==========================================
// 对齐: schema machine_hour_log 表
// 红线: 机器工时 / 分配工时 / 工时记录 三处写入同一事务
// ==========================================

use crate::domain::assignment::ProjectAssignment;
use crate::domain::hour_log::{HourLog, HourLogRequest};
use crate::engine::repositories::{CommittedHourLog, HourLedgerStore};
use crate::repository::assignment_repo::write_assignment_hours;
use crate::repository::columns::{decimal_at, decimal_text, now};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::machine_repo::{add_machine_hours, MachineRepository};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

const LOG_COLUMNS: &str = "log_id, machine_id, project_id, assignment_id, work_date, \
     hours_worked, notes, evidence_json, created_at";

pub struct HourLogRepository {
    conn: Arc<Mutex<Connection>>,
    machines: MachineRepository,
}

impl HourLogRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            machines: MachineRepository::from_connection(conn.clone()),
            conn,
        }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<HourLog> {
        let evidence_raw: String = row.get(7)?;
        let evidence: Vec<String> = serde_json::from_str(&evidence_raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(HourLog {
            log_id: row.get(0)?,
            machine_id: row.get(1)?,
            project_id: row.get(2)?,
            assignment_id: row.get(3)?,
            work_date: row.get(4)?,
            hours_worked: decimal_at(row, 5)?,
            notes: row.get(6)?,
            evidence,
            created_at: row.get(8)?,
        })
    }

    fn query_list(&self, where_clause: &str, params: &[&dyn rusqlite::ToSql]) -> RepositoryResult<Vec<HourLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM machine_hour_log WHERE {} ORDER BY work_date DESC, log_id DESC",
            LOG_COLUMNS, where_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params, Self::map_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn find_by_id(&self, log_id: i64) -> RepositoryResult<Option<HourLog>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM machine_hour_log WHERE log_id = ?1", LOG_COLUMNS);
        Ok(conn.query_row(&sql, params![log_id], Self::map_row).optional()?)
    }

    pub fn exists_for_day(&self, machine_id: i64, work_date: NaiveDate) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM machine_hour_log WHERE machine_id = ?1 AND work_date = ?2",
                params![machine_id, work_date],
                |_| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    pub fn list_for_machine(&self, machine_id: i64) -> RepositoryResult<Vec<HourLog>> {
        self.query_list("machine_id = ?1", &[&machine_id])
    }

    pub fn list_for_project(&self, project_id: i64) -> RepositoryResult<Vec<HourLog>> {
        self.query_list("project_id = ?1", &[&project_id])
    }

    /// 日期闭区间查询
    pub fn list_between(&self, from: NaiveDate, to: NaiveDate) -> RepositoryResult<Vec<HourLog>> {
        self.query_list("work_date BETWEEN ?1 AND ?2", &[&from, &to])
    }

    /// 机器已记录工时合计
    pub fn total_hours_for_machine(&self, machine_id: i64) -> RepositoryResult<Decimal> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT hours_worked FROM machine_hour_log WHERE machine_id = ?1")?;
        let rows = stmt.query_map(params![machine_id], |row| decimal_at(row, 0))?;
        let mut total = Decimal::ZERO;
        for hours in rows {
            total += hours?;
        }
        Ok(total)
    }

    /// 单事务提交工时
    ///
    /// # 参数
    /// - `request`: 工时记录请求
    /// - `assignment`: 已更新的分配快照
    ///
    /// # 返回
    /// 提交后的工时记录、机器、分配快照
    pub fn commit(
        &self,
        request: &HourLogRequest,
        assignment: Option<&ProjectAssignment>,
    ) -> RepositoryResult<CommittedHourLog> {
        let log_id = {
            let conn = self.get_conn()?;
            let tx = conn
                .unchecked_transaction()
                .map_err(RepositoryError::transaction)?;

            add_machine_hours(&tx, request.machine_id, request.hours_worked)?;
            if let Some(assignment) = assignment {
                write_assignment_hours(&tx, assignment)?;
            }

            let evidence_json = serde_json::to_string(&request.evidence)
                .map_err(|e| RepositoryError::InternalError(e.to_string()))?;
            tx.execute(
                r#"
                INSERT INTO machine_hour_log (
                    machine_id, project_id, assignment_id, work_date, hours_worked,
                    notes, evidence_json, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    request.machine_id,
                    request.project_id,
                    assignment.map(|a| a.assignment_id),
                    request.work_date,
                    decimal_text(request.hours_worked),
                    request.notes,
                    evidence_json,
                    now(),
                ],
            )?;
            let log_id = tx.last_insert_rowid();
            tx.commit().map_err(RepositoryError::transaction)?;
            log_id
        };

        let log = self
            .find_by_id(log_id)?
            .ok_or_else(|| RepositoryError::not_found("HourLog", log_id))?;
        let machine = self
            .machines
            .find_by_id(request.machine_id)?
            .ok_or_else(|| RepositoryError::not_found("Machine", request.machine_id))?;

        Ok(CommittedHourLog {
            log,
            machine,
            assignment: assignment.cloned(),
        })
    }
}

impl HourLedgerStore for HourLogRepository {
    fn exists_for_day(&self, machine_id: i64, work_date: NaiveDate) -> RepositoryResult<bool> {
        HourLogRepository::exists_for_day(self, machine_id, work_date)
    }

    fn commit(
        &self,
        request: &HourLogRequest,
        assignment: Option<&ProjectAssignment>,
    ) -> RepositoryResult<CommittedHourLog> {
        HourLogRepository::commit(self, request, assignment)
    }
}
