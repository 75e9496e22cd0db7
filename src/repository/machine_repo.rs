// ==========================================
// 车队维保管理系统 - 机器数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::machine::{Machine, NewMachine};
use crate::domain::types::MachineState;
use crate::engine::repositories::MachineRegistry;
use crate::repository::columns::{decimal_at, decimal_text, enum_at, now};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

const MACHINE_COLUMNS: &str = "machine_id, name, model, brand, serial_number, acquired_on, \
     total_hours, state, created_at, updated_at";

// ==========================================
// MachineRepository - 机器仓储
// ==========================================
/// 职责: 管理 machine 表的 CRUD 操作
pub struct MachineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MachineRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Machine> {
        Ok(Machine {
            machine_id: row.get(0)?,
            name: row.get(1)?,
            model: row.get(2)?,
            brand: row.get(3)?,
            serial_number: row.get(4)?,
            acquired_on: row.get(5)?,
            total_hours: decimal_at(row, 6)?,
            state: enum_at(row, 7, MachineState::from_db_str)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    /// 新建机器（初始状态 operational，工时 0）
    pub fn create(&self, new_machine: &NewMachine) -> RepositoryResult<Machine> {
        let machine_id = {
            let conn = self.get_conn()?;
            let ts = now();
            conn.execute(
                r#"
                INSERT INTO machine (
                    name, model, brand, serial_number, acquired_on,
                    total_hours, state, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, '0', ?6, ?7, ?7)
                "#,
                params![
                    new_machine.name,
                    new_machine.model,
                    new_machine.brand,
                    new_machine.serial_number,
                    new_machine.acquired_on,
                    MachineState::Operational.to_db_str(),
                    ts,
                ],
            )?;
            conn.last_insert_rowid()
        };
        self.find_by_id(machine_id)?
            .ok_or_else(|| RepositoryError::not_found("Machine", machine_id))
    }

    /// 按 ID 查询
    pub fn find_by_id(&self, machine_id: i64) -> RepositoryResult<Option<Machine>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM machine WHERE machine_id = ?1", MACHINE_COLUMNS);
        let machine = conn
            .query_row(&sql, params![machine_id], Self::map_row)
            .optional()?;
        Ok(machine)
    }

    /// 按序列号查询
    pub fn find_by_serial(&self, serial_number: &str) -> RepositoryResult<Option<Machine>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM machine WHERE serial_number = ?1", MACHINE_COLUMNS);
        let machine = conn
            .query_row(&sql, params![serial_number], Self::map_row)
            .optional()?;
        Ok(machine)
    }

    /// 全部机器（按 ID 升序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Machine>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM machine ORDER BY machine_id", MACHINE_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::map_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 按状态筛选
    pub fn list_by_state(&self, state: MachineState) -> RepositoryResult<Vec<Machine>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM machine WHERE state = ?1 ORDER BY machine_id",
            MACHINE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![state.to_db_str()], Self::map_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 最近更新的机器
    pub fn latest_updated(&self, limit: usize) -> RepositoryResult<Vec<Machine>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM machine ORDER BY updated_at DESC, machine_id DESC LIMIT ?1",
            MACHINE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], Self::map_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 累加工时
    ///
    /// 说明: 读取与写回在同一事务内完成，避免并发丢失更新
    pub fn add_hours(&self, machine_id: i64, delta: Decimal) -> RepositoryResult<Machine> {
        {
            let conn = self.get_conn()?;
            let tx = conn
                .unchecked_transaction()
                .map_err(RepositoryError::transaction)?;
            add_machine_hours(&tx, machine_id, delta)?;
            tx.commit().map_err(RepositoryError::transaction)?;
        }
        self.find_by_id(machine_id)?
            .ok_or_else(|| RepositoryError::not_found("Machine", machine_id))
    }

    /// 设置状态
    pub fn set_state(&self, machine_id: i64, state: MachineState) -> RepositoryResult<Machine> {
        {
            let conn = self.get_conn()?;
            let affected = conn.execute(
                "UPDATE machine SET state = ?1, updated_at = ?2 WHERE machine_id = ?3 AND state <> ?1",
                params![state.to_db_str(), now(), machine_id],
            )?;
            if affected == 0 {
                let exists: bool = conn
                    .query_row(
                        "SELECT 1 FROM machine WHERE machine_id = ?1",
                        params![machine_id],
                        |_| Ok(true),
                    )
                    .optional()?
                    .unwrap_or(false);
                if !exists {
                    return Err(RepositoryError::not_found("Machine", machine_id));
                }
            }
        }
        self.find_by_id(machine_id)?
            .ok_or_else(|| RepositoryError::not_found("Machine", machine_id))
    }

    /// 删除机器（依赖记录级联删除）
    pub fn delete(&self, machine_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM machine WHERE machine_id = ?1", params![machine_id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Machine", machine_id));
        }
        Ok(())
    }
}

/// 事务内累加机器工时
///
/// 供工时提交事务复用
pub(crate) fn add_machine_hours(
    conn: &Connection,
    machine_id: i64,
    delta: Decimal,
) -> RepositoryResult<Decimal> {
    let current = conn
        .query_row(
            "SELECT total_hours FROM machine WHERE machine_id = ?1",
            params![machine_id],
            |row| decimal_at(row, 0),
        )
        .optional()?
        .ok_or_else(|| RepositoryError::not_found("Machine", machine_id))?;

    let total = current + delta;
    conn.execute(
        "UPDATE machine SET total_hours = ?1, updated_at = ?2 WHERE machine_id = ?3",
        params![decimal_text(total), now(), machine_id],
    )?;
    Ok(total)
}

impl MachineRegistry for MachineRepository {
    fn get(&self, machine_id: i64) -> RepositoryResult<Option<Machine>> {
        self.find_by_id(machine_id)
    }

    fn list_all(&self) -> RepositoryResult<Vec<Machine>> {
        MachineRepository::list_all(self)
    }

    fn add_hours(&self, machine_id: i64, delta: Decimal) -> RepositoryResult<Machine> {
        MachineRepository::add_hours(self, machine_id, delta)
    }

    fn set_state(&self, machine_id: i64, state: MachineState) -> RepositoryResult<Machine> {
        MachineRepository::set_state(self, machine_id, state)
    }
}
