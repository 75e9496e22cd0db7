// ==========================================
// 车队维保管理系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为 (外键 / busy_timeout)
// - 幂等建表，并写入 schema_version
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 全量建表语句（IF NOT EXISTS，可重复执行）
///
/// 说明：工时 / 费用 / 约定工时均以 TEXT 存储十进制字符串，读取时精确解析。
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS machine (
    machine_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL,
    model          TEXT,
    brand          TEXT,
    serial_number  TEXT UNIQUE,
    acquired_on    TEXT,
    total_hours    TEXT NOT NULL DEFAULT '0',
    state          TEXT NOT NULL DEFAULT 'operational'
                   CHECK (state IN ('operational', 'in_maintenance', 'out_of_service')),
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS scheduled_maintenance (
    policy_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    machine_id      INTEGER NOT NULL REFERENCES machine(machine_id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    kind            TEXT NOT NULL CHECK (kind IN ('preventive', 'predictive')),
    interval_hours  INTEGER NOT NULL CHECK (interval_hours BETWEEN 1 AND 100000),
    description     TEXT,
    created_at      TEXT NOT NULL,
    UNIQUE (machine_id, name)
);

CREATE TABLE IF NOT EXISTS maintenance_event (
    event_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    machine_id        INTEGER NOT NULL REFERENCES machine(machine_id) ON DELETE CASCADE,
    policy_id         INTEGER REFERENCES scheduled_maintenance(policy_id) ON DELETE SET NULL,
    kind              TEXT NOT NULL CHECK (kind IN ('preventive', 'corrective', 'predictive')),
    description       TEXT NOT NULL,
    performed_on      TEXT NOT NULL,
    hours_at_service  TEXT NOT NULL,
    cost              TEXT NOT NULL DEFAULT '0',
    created_at        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_maintenance_event_machine_policy
    ON maintenance_event (machine_id, policy_id, performed_on);

CREATE TABLE IF NOT EXISTS project_assignment (
    assignment_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    machine_id         INTEGER NOT NULL REFERENCES machine(machine_id) ON DELETE CASCADE,
    project_id         INTEGER NOT NULL,
    pact_hours         TEXT NOT NULL,
    accumulated_hours  TEXT NOT NULL DEFAULT '0',
    finalized          INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL,
    UNIQUE (machine_id, project_id)
);

CREATE TABLE IF NOT EXISTS machine_hour_log (
    log_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    machine_id     INTEGER NOT NULL REFERENCES machine(machine_id) ON DELETE CASCADE,
    project_id     INTEGER,
    assignment_id  INTEGER REFERENCES project_assignment(assignment_id) ON DELETE SET NULL,
    work_date      TEXT NOT NULL,
    hours_worked   TEXT NOT NULL,
    notes          TEXT,
    evidence_json  TEXT NOT NULL DEFAULT '[]',
    created_at     TEXT NOT NULL,
    UNIQUE (machine_id, work_date)
);

CREATE TABLE IF NOT EXISTS alarm (
    alarm_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    machine_id    INTEGER NOT NULL REFERENCES machine(machine_id) ON DELETE CASCADE,
    kind          TEXT NOT NULL,
    severity      TEXT NOT NULL DEFAULT 'low'
                  CHECK (severity IN ('low', 'medium', 'high', 'critical')),
    description   TEXT,
    acknowledged  INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_alarm_machine_kind ON alarm (machine_id, kind, acknowledged);

CREATE TABLE IF NOT EXISTS action_log (
    action_id     TEXT PRIMARY KEY,
    action_type   TEXT NOT NULL,
    action_ts     TEXT NOT NULL,
    actor         TEXT NOT NULL,
    machine_id    INTEGER,
    payload_json  TEXT,
    detail        TEXT
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL DEFAULT 'global',
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 幂等建表并登记 schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_absent_on_empty_db() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }
}
