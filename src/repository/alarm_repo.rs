// ==========================================
// 车队维保管理系统 - 告警仓储
// ==========================================
// 对齐: schema alarm 表
// 说明: 去重规则属于调用方（手动创建入口），存储层不做约束
// ==========================================

use crate::domain::alarm::{Alarm, NewAlarm};
use crate::domain::types::AlarmSeverity;
use crate::engine::repositories::AlarmSink;
use crate::repository::columns::{enum_at, now};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const ALARM_COLUMNS: &str =
    "alarm_id, machine_id, kind, severity, description, acknowledged, created_at";

pub struct AlarmRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AlarmRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Alarm> {
        Ok(Alarm {
            alarm_id: row.get(0)?,
            machine_id: row.get(1)?,
            kind: row.get(2)?,
            severity: enum_at(row, 3, AlarmSeverity::from_db_str)?,
            description: row.get(4)?,
            acknowledged: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn query_list(
        &self,
        where_clause: &str,
        params: &[&dyn rusqlite::ToSql],
        limit: Option<usize>,
    ) -> RepositoryResult<Vec<Alarm>> {
        let conn = self.get_conn()?;
        let mut sql = format!(
            "SELECT {} FROM alarm WHERE {} ORDER BY created_at DESC, alarm_id DESC",
            ALARM_COLUMNS, where_clause
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params, Self::map_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn create(&self, alarm: &NewAlarm) -> RepositoryResult<Alarm> {
        let alarm_id = {
            let conn = self.get_conn()?;
            conn.execute(
                r#"
                INSERT INTO alarm (machine_id, kind, severity, description, acknowledged, created_at)
                VALUES (?1, ?2, ?3, ?4, 0, ?5)
                "#,
                params![
                    alarm.machine_id,
                    alarm.kind,
                    alarm.severity.to_db_str(),
                    alarm.description,
                    now(),
                ],
            )?;
            conn.last_insert_rowid()
        };
        self.find_by_id(alarm_id)?
            .ok_or_else(|| RepositoryError::not_found("Alarm", alarm_id))
    }

    pub fn find_by_id(&self, alarm_id: i64) -> RepositoryResult<Option<Alarm>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM alarm WHERE alarm_id = ?1", ALARM_COLUMNS);
        Ok(conn.query_row(&sql, params![alarm_id], Self::map_row).optional()?)
    }

    /// 是否存在同 (机器, 类型) 的未确认告警（类型大小写不敏感）
    pub fn has_unacknowledged(&self, machine_id: i64, kind: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM alarm WHERE machine_id = ?1 AND lower(kind) = lower(?2) AND acknowledged = 0 LIMIT 1",
                params![machine_id, kind],
                |_| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Alarm>> {
        self.query_list("1 = 1", &[], None)
    }

    pub fn list_unacknowledged(&self) -> RepositoryResult<Vec<Alarm>> {
        self.query_list("acknowledged = 0", &[], None)
    }

    pub fn list_by_severity(&self, severity: AlarmSeverity) -> RepositoryResult<Vec<Alarm>> {
        self.query_list("severity = ?1", &[&severity.to_db_str()], None)
    }

    pub fn list_for_machine(&self, machine_id: i64) -> RepositoryResult<Vec<Alarm>> {
        self.query_list("machine_id = ?1", &[&machine_id], None)
    }

    pub fn list_by_kind(&self, kind: &str) -> RepositoryResult<Vec<Alarm>> {
        self.query_list("lower(kind) = lower(?1)", &[&kind], None)
    }

    /// 指定时间之后创建的告警
    pub fn list_since(&self, since: NaiveDateTime) -> RepositoryResult<Vec<Alarm>> {
        self.query_list("created_at >= ?1", &[&since], None)
    }

    pub fn latest(&self, limit: usize) -> RepositoryResult<Vec<Alarm>> {
        self.query_list("1 = 1", &[], Some(limit))
    }

    /// 确认告警
    pub fn acknowledge(&self, alarm_id: i64) -> RepositoryResult<Alarm> {
        {
            let conn = self.get_conn()?;
            let affected = conn.execute(
                "UPDATE alarm SET acknowledged = 1 WHERE alarm_id = ?1",
                params![alarm_id],
            )?;
            if affected == 0 {
                return Err(RepositoryError::not_found("Alarm", alarm_id));
            }
        }
        self.find_by_id(alarm_id)?
            .ok_or_else(|| RepositoryError::not_found("Alarm", alarm_id))
    }

    pub fn delete(&self, alarm_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM alarm WHERE alarm_id = ?1", params![alarm_id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Alarm", alarm_id));
        }
        Ok(())
    }

    pub fn count_unacknowledged(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM alarm WHERE acknowledged = 0",
            [],
            |row| row.get(0),
        )?)
    }

    /// 严重告警数量（含已确认）
    pub fn count_critical(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM alarm WHERE severity = 'critical'",
            [],
            |row| row.get(0),
        )?)
    }

    /// 按列分组计数
    fn grouped_count(&self, column: &str) -> RepositoryResult<BTreeMap<String, i64>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {col}, COUNT(*) FROM alarm GROUP BY {col}",
            col = column
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        Ok(rows.collect::<Result<BTreeMap<_, _>, _>>()?)
    }

    pub fn count_by_severity(&self) -> RepositoryResult<BTreeMap<String, i64>> {
        self.grouped_count("severity")
    }

    pub fn count_by_kind(&self) -> RepositoryResult<BTreeMap<String, i64>> {
        self.grouped_count("lower(kind)")
    }
}

impl AlarmSink for AlarmRepository {
    fn create(&self, alarm: &NewAlarm) -> RepositoryResult<Alarm> {
        AlarmRepository::create(self, alarm)
    }
}
