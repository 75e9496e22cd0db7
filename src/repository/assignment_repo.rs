// ==========================================
// 车队维保管理系统 - 项目分配仓储
// ==========================================
// 对齐: schema project_assignment 表
// 约束: (machine_id, project_id) 唯一
// ==========================================

use crate::domain::assignment::{NewAssignment, ProjectAssignment};
use crate::engine::repositories::AssignmentLedger;
use crate::repository::columns::{decimal_at, decimal_text, now};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const ASSIGNMENT_COLUMNS: &str = "assignment_id, machine_id, project_id, pact_hours, \
     accumulated_hours, finalized, created_at, updated_at";

pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<ProjectAssignment> {
        Ok(ProjectAssignment {
            assignment_id: row.get(0)?,
            machine_id: row.get(1)?,
            project_id: row.get(2)?,
            pact_hours: decimal_at(row, 3)?,
            accumulated_hours: decimal_at(row, 4)?,
            finalized: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn query_one(&self, where_clause: &str, params: &[&dyn rusqlite::ToSql]) -> RepositoryResult<Option<ProjectAssignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM project_assignment WHERE {} ORDER BY assignment_id DESC LIMIT 1",
            ASSIGNMENT_COLUMNS, where_clause
        );
        Ok(conn.query_row(&sql, params, Self::map_row).optional()?)
    }

    pub fn create(&self, assignment: &NewAssignment) -> RepositoryResult<ProjectAssignment> {
        let assignment_id = {
            let conn = self.get_conn()?;
            let ts = now();
            conn.execute(
                r#"
                INSERT INTO project_assignment (
                    machine_id, project_id, pact_hours, accumulated_hours, finalized,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, '0', 0, ?4, ?4)
                "#,
                params![
                    assignment.machine_id,
                    assignment.project_id,
                    decimal_text(assignment.pact_hours),
                    ts,
                ],
            )?;
            conn.last_insert_rowid()
        };
        self.find_by_id(assignment_id)?
            .ok_or_else(|| RepositoryError::not_found("ProjectAssignment", assignment_id))
    }

    pub fn find_by_id(&self, assignment_id: i64) -> RepositoryResult<Option<ProjectAssignment>> {
        self.query_one("assignment_id = ?1", &[&assignment_id])
    }

    /// (机器, 项目) 的分配记录，不区分是否完结
    pub fn find_by_pair(&self, machine_id: i64, project_id: i64) -> RepositoryResult<Option<ProjectAssignment>> {
        self.query_one("machine_id = ?1 AND project_id = ?2", &[&machine_id, &project_id])
    }

    pub fn active_assignment(
        &self,
        machine_id: i64,
        project_id: i64,
    ) -> RepositoryResult<Option<ProjectAssignment>> {
        self.query_one(
            "machine_id = ?1 AND project_id = ?2 AND finalized = 0",
            &[&machine_id, &project_id],
        )
    }

    pub fn active_for_machine(&self, machine_id: i64) -> RepositoryResult<Option<ProjectAssignment>> {
        self.query_one("machine_id = ?1 AND finalized = 0", &[&machine_id])
    }

    pub fn list_for_machine(&self, machine_id: i64) -> RepositoryResult<Vec<ProjectAssignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM project_assignment WHERE machine_id = ?1 ORDER BY assignment_id",
            ASSIGNMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![machine_id], Self::map_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 写回累计工时与完结标记
    pub fn save_hours(&self, assignment: &ProjectAssignment) -> RepositoryResult<ProjectAssignment> {
        {
            let conn = self.get_conn()?;
            write_assignment_hours(&conn, assignment)?;
        }
        self.find_by_id(assignment.assignment_id)?
            .ok_or_else(|| RepositoryError::not_found("ProjectAssignment", assignment.assignment_id))
    }
}

/// 写回分配工时（供工时提交事务复用）
pub(crate) fn write_assignment_hours(
    conn: &Connection,
    assignment: &ProjectAssignment,
) -> RepositoryResult<()> {
    let affected = conn.execute(
        r#"
        UPDATE project_assignment
        SET accumulated_hours = ?1, finalized = ?2, updated_at = ?3
        WHERE assignment_id = ?4
        "#,
        params![
            decimal_text(assignment.accumulated_hours),
            assignment.finalized,
            now(),
            assignment.assignment_id,
        ],
    )?;
    if affected == 0 {
        return Err(RepositoryError::not_found(
            "ProjectAssignment",
            assignment.assignment_id,
        ));
    }
    Ok(())
}

impl AssignmentLedger for AssignmentRepository {
    fn active_assignment(
        &self,
        machine_id: i64,
        project_id: i64,
    ) -> RepositoryResult<Option<ProjectAssignment>> {
        AssignmentRepository::active_assignment(self, machine_id, project_id)
    }

    fn active_for_machine(&self, machine_id: i64) -> RepositoryResult<Option<ProjectAssignment>> {
        AssignmentRepository::active_for_machine(self, machine_id)
    }
}
