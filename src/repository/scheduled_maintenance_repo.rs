// ==========================================
// 车队维保管理系统 - 定期保养计划仓储
// ==========================================
// 对齐: schema scheduled_maintenance 表
// 约束: (machine_id, name) 唯一
// ==========================================

use crate::domain::maintenance::{NewPolicy, ScheduledMaintenancePolicy};
use crate::domain::types::PolicyKind;
use crate::engine::repositories::MaintenanceCatalog;
use crate::repository::columns::{enum_at, now};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct ScheduledMaintenanceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduledMaintenanceRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<ScheduledMaintenancePolicy> {
        Ok(ScheduledMaintenancePolicy {
            policy_id: row.get(0)?,
            machine_id: row.get(1)?,
            name: row.get(2)?,
            kind: enum_at(row, 3, PolicyKind::from_db_str)?,
            interval_hours: row.get(4)?,
            description: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    /// 新建保养计划
    pub fn create(&self, policy: &NewPolicy) -> RepositoryResult<ScheduledMaintenancePolicy> {
        let policy_id = {
            let conn = self.get_conn()?;
            conn.execute(
                r#"
                INSERT INTO scheduled_maintenance (
                    machine_id, name, kind, interval_hours, description, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    policy.machine_id,
                    policy.name,
                    policy.kind.to_db_str(),
                    policy.interval_hours,
                    policy.description,
                    now(),
                ],
            )?;
            conn.last_insert_rowid()
        };
        self.find_by_id(policy_id)?
            .ok_or_else(|| RepositoryError::not_found("ScheduledMaintenance", policy_id))
    }

    pub fn find_by_id(&self, policy_id: i64) -> RepositoryResult<Option<ScheduledMaintenancePolicy>> {
        let conn = self.get_conn()?;
        let policy = conn
            .query_row(
                r#"
                SELECT policy_id, machine_id, name, kind, interval_hours, description, created_at
                FROM scheduled_maintenance WHERE policy_id = ?1
                "#,
                params![policy_id],
                Self::map_row,
            )
            .optional()?;
        Ok(policy)
    }

    /// 机器名下是否已存在同名计划
    pub fn exists_by_name(&self, machine_id: i64, name: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM scheduled_maintenance WHERE machine_id = ?1 AND name = ?2",
                params![machine_id, name],
                |_| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    pub fn list_for_machine(&self, machine_id: i64) -> RepositoryResult<Vec<ScheduledMaintenancePolicy>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT policy_id, machine_id, name, kind, interval_hours, description, created_at
            FROM scheduled_maintenance
            WHERE machine_id = ?1
            ORDER BY policy_id
            "#,
        )?;
        let rows = stmt.query_map(params![machine_id], Self::map_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn delete(&self, policy_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM scheduled_maintenance WHERE policy_id = ?1",
            params![policy_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("ScheduledMaintenance", policy_id));
        }
        Ok(())
    }
}

impl MaintenanceCatalog for ScheduledMaintenanceRepository {
    fn list_for_machine(&self, machine_id: i64) -> RepositoryResult<Vec<ScheduledMaintenancePolicy>> {
        ScheduledMaintenanceRepository::list_for_machine(self, machine_id)
    }
}
