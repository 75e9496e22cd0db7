// ==========================================
// 车队维保管理系统 - 保养记录仓储
// ==========================================
// 红线: 保养记录只追加
// ==========================================

use crate::domain::maintenance::{MaintenanceEvent, NewMaintenanceEvent};
use crate::domain::types::{MachineState, MaintenanceKind};
use crate::engine::repositories::MaintenanceHistory;
use crate::repository::columns::{decimal_at, decimal_text, enum_at, now};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

const EVENT_COLUMNS: &str = "event_id, machine_id, policy_id, kind, description, performed_on, \
     hours_at_service, cost, created_at";

pub struct MaintenanceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaintenanceRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<MaintenanceEvent> {
        Ok(MaintenanceEvent {
            event_id: row.get(0)?,
            machine_id: row.get(1)?,
            policy_id: row.get(2)?,
            kind: enum_at(row, 3, MaintenanceKind::from_db_str)?,
            description: row.get(4)?,
            performed_on: row.get(5)?,
            hours_at_service: decimal_at(row, 6)?,
            cost: decimal_at(row, 7)?,
            created_at: row.get(8)?,
        })
    }

    /// 追加保养记录，并在同一事务内把机器恢复为 operational
    pub fn record(&self, event: &NewMaintenanceEvent) -> RepositoryResult<MaintenanceEvent> {
        let event_id = {
            let conn = self.get_conn()?;
            let tx = conn
                .unchecked_transaction()
                .map_err(RepositoryError::transaction)?;
            let ts = now();
            tx.execute(
                r#"
                INSERT INTO maintenance_event (
                    machine_id, policy_id, kind, description, performed_on,
                    hours_at_service, cost, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    event.machine_id,
                    event.policy_id,
                    event.kind.to_db_str(),
                    event.description,
                    event.performed_on,
                    decimal_text(event.hours_at_service),
                    decimal_text(event.cost),
                    ts,
                ],
            )?;
            let event_id = tx.last_insert_rowid();
            tx.execute(
                "UPDATE machine SET state = ?1, updated_at = ?2 WHERE machine_id = ?3",
                params![MachineState::Operational.to_db_str(), ts, event.machine_id],
            )?;
            tx.commit().map_err(RepositoryError::transaction)?;
            event_id
        };
        self.find_by_id(event_id)?
            .ok_or_else(|| RepositoryError::not_found("MaintenanceEvent", event_id))
    }

    pub fn find_by_id(&self, event_id: i64) -> RepositoryResult<Option<MaintenanceEvent>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM maintenance_event WHERE event_id = ?1", EVENT_COLUMNS);
        Ok(conn.query_row(&sql, params![event_id], Self::map_row).optional()?)
    }

    /// 指定 (机器, 计划) 最近一次保养: 按执行日期，其次按记录 ID
    pub fn last_event_for(
        &self,
        machine_id: i64,
        policy_id: i64,
    ) -> RepositoryResult<Option<MaintenanceEvent>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM maintenance_event \
             WHERE machine_id = ?1 AND policy_id = ?2 \
             ORDER BY performed_on DESC, event_id DESC LIMIT 1",
            EVENT_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![machine_id, policy_id], Self::map_row)
            .optional()?)
    }

    /// 机器历次保养中的最高工时读数（不区分计划与日期）
    ///
    /// Decimal 以 TEXT 存储，比较在内存中完成
    pub fn max_hours_at_service(&self, machine_id: i64) -> RepositoryResult<Option<Decimal>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT hours_at_service FROM maintenance_event WHERE machine_id = ?1")?;
        let rows = stmt.query_map(params![machine_id], |row| decimal_at(row, 0))?;
        let mut max: Option<Decimal> = None;
        for hours in rows {
            let hours = hours?;
            max = Some(max.map_or(hours, |m| m.max(hours)));
        }
        Ok(max)
    }

    pub fn list_for_machine(&self, machine_id: i64) -> RepositoryResult<Vec<MaintenanceEvent>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM maintenance_event WHERE machine_id = ?1 \
             ORDER BY performed_on DESC, event_id DESC",
            EVENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![machine_id], Self::map_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl MaintenanceHistory for MaintenanceRepository {
    fn last_event_for(
        &self,
        machine_id: i64,
        policy_id: i64,
    ) -> RepositoryResult<Option<MaintenanceEvent>> {
        MaintenanceRepository::last_event_for(self, machine_id, policy_id)
    }
}
