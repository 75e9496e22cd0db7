// ==========================================
// 车队维保管理系统 - 告警 API
// ==========================================
// 手动创建规则（引擎自动告警不经此入口，不去重）:
// - kind 属于 {maintenance, project, state, system}，大小写不敏感，统一小写存储
// - description 提供时至少 5 个非空白字符
// - severity = critical 时 description 必填
// - 同一 (机器, kind) 已有未确认告警时拒绝
// ==========================================

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;

use crate::api::audit::AuditTrail;
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::FieldValidator;
use crate::config::ConfigManager;
use crate::domain::{
    ActionType, Alarm, AlarmDashboardStats, AlarmKind, AlarmSeverity, NewAlarm,
};
use crate::engine::{EngineError, MachineLocks};
use crate::repository::{AlarmRepository, MachineRepository};

/// 告警描述最少字符数
pub const MIN_ALARM_DESCRIPTION_CHARS: usize = 5;

pub struct AlarmApi {
    alarm_repo: Arc<AlarmRepository>,
    machine_repo: Arc<MachineRepository>,
    config_manager: Arc<ConfigManager>,
    locks: Arc<MachineLocks>,
    audit: Arc<AuditTrail>,
}

impl AlarmApi {
    pub fn new(
        alarm_repo: Arc<AlarmRepository>,
        machine_repo: Arc<MachineRepository>,
        config_manager: Arc<ConfigManager>,
        locks: Arc<MachineLocks>,
        audit: Arc<AuditTrail>,
    ) -> Self {
        Self {
            alarm_repo,
            machine_repo,
            config_manager,
            locks,
            audit,
        }
    }

    // ==========================================
    // 手动创建
    // ==========================================

    pub fn create(&self, request: NewAlarm, actor: &str) -> ApiResult<Alarm> {
        let description = request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        let mut v = FieldValidator::new();
        if let Some(text) = &request.description {
            v.min_chars("description", text, MIN_ALARM_DESCRIPTION_CHARS);
        }
        v.check(
            !(request.severity == AlarmSeverity::Critical && description.is_none()),
            "description",
            "严重告警必须填写描述",
        );
        let kind = v.finish_with(
            "kind",
            AlarmKind::parse(&request.kind),
            format!(
                "告警类型必须是 {} 之一",
                AlarmKind::ALL
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(" / ")
            ),
        )?;

        let normalized = NewAlarm {
            machine_id: request.machine_id,
            kind: kind.as_str().to_string(),
            severity: request.severity,
            description: description.map(str::to_string),
        };

        let alarm = self.locks.with_lock(request.machine_id, || {
            if self.machine_repo.find_by_id(normalized.machine_id)?.is_none() {
                return Err(EngineError::validation(
                    "machine_id",
                    format!("机器不存在: {}", normalized.machine_id),
                ));
            }
            if self
                .alarm_repo
                .has_unacknowledged(normalized.machine_id, &normalized.kind)?
            {
                return Err(EngineError::validation(
                    "kind",
                    format!("该机器已有未确认的 {} 告警", normalized.kind),
                ));
            }
            Ok(self.alarm_repo.create(&normalized)?)
        })?;

        tracing::info!(
            alarm_id = alarm.alarm_id,
            machine_id = alarm.machine_id,
            kind = %alarm.kind,
            severity = %alarm.severity,
            "手动告警已创建"
        );
        self.audit.record(
            ActionType::AlarmCreated,
            actor,
            Some(alarm.machine_id),
            json!({
                "alarm_id": alarm.alarm_id,
                "kind": alarm.kind,
                "severity": alarm.severity,
            }),
            format!("手动创建{}告警", alarm.kind),
        );
        Ok(alarm)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get(&self, alarm_id: i64) -> ApiResult<Alarm> {
        self.alarm_repo
            .find_by_id(alarm_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Alarm(id={})不存在", alarm_id)))
    }

    pub fn list_all(&self) -> ApiResult<Vec<Alarm>> {
        Ok(self.alarm_repo.list_all()?)
    }

    pub fn list_unacknowledged(&self) -> ApiResult<Vec<Alarm>> {
        Ok(self.alarm_repo.list_unacknowledged()?)
    }

    /// 严重告警（含已确认，与仪表盘计数口径一致）
    pub fn list_critical(&self) -> ApiResult<Vec<Alarm>> {
        Ok(self.alarm_repo.list_by_severity(AlarmSeverity::Critical)?)
    }

    pub fn list_for_machine(&self, machine_id: i64) -> ApiResult<Vec<Alarm>> {
        Ok(self.alarm_repo.list_for_machine(machine_id)?)
    }

    pub fn list_by_kind(&self, kind: &str) -> ApiResult<Vec<Alarm>> {
        Ok(self.alarm_repo.list_by_kind(kind.trim())?)
    }

    /// 近期告警
    ///
    /// # 参数
    /// - `window_hours`: 时间窗口；None 时读取配置 alarm.recent_window_hours
    pub fn list_recent(&self, window_hours: Option<i64>) -> ApiResult<Vec<Alarm>> {
        let hours = match window_hours {
            Some(h) if h <= 0 => {
                return Err(ApiError::validation("window_hours", "时间窗口必须大于 0"))
            }
            Some(h) => h,
            None => self
                .config_manager
                .get_recent_window_hours()
                .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?,
        };
        let since = Utc::now().naive_utc() - Duration::hours(hours);
        Ok(self.alarm_repo.list_since(since)?)
    }

    pub fn count_unacknowledged(&self) -> ApiResult<i64> {
        Ok(self.alarm_repo.count_unacknowledged()?)
    }

    /// 仪表盘统计
    ///
    /// 严重数与分组计数覆盖全部告警；未确认数仅统计未确认
    pub fn dashboard_stats(&self) -> ApiResult<AlarmDashboardStats> {
        let limit = self
            .config_manager
            .get_dashboard_latest_limit()
            .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?;

        Ok(AlarmDashboardStats {
            total_unacknowledged: self.alarm_repo.count_unacknowledged()?,
            total_critical: self.alarm_repo.count_critical()?,
            by_severity: self.alarm_repo.count_by_severity()?,
            by_kind: self.alarm_repo.count_by_kind()?,
            latest: self.alarm_repo.latest(limit)?,
        })
    }

    // ==========================================
    // 确认 / 删除
    // ==========================================

    pub fn acknowledge(&self, alarm_id: i64, actor: &str) -> ApiResult<Alarm> {
        let alarm = self.alarm_repo.acknowledge(alarm_id)?;
        self.audit.record(
            ActionType::AlarmAcknowledged,
            actor,
            Some(alarm.machine_id),
            json!({ "alarm_id": alarm_id, "kind": alarm.kind }),
            format!("确认告警 {}", alarm_id),
        );
        Ok(alarm)
    }

    pub fn delete(&self, alarm_id: i64, actor: &str) -> ApiResult<()> {
        let alarm = self.get(alarm_id)?;
        self.alarm_repo.delete(alarm_id)?;
        self.audit.record(
            ActionType::AlarmDeleted,
            actor,
            Some(alarm.machine_id),
            json!({
                "alarm_id": alarm_id,
                "kind": alarm.kind,
                "acknowledged": alarm.acknowledged,
            }),
            format!("删除告警 {}", alarm_id),
        );
        Ok(())
    }
}
