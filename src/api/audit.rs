// ==========================================
// 车队维保管理系统 - 操作审计
// ==========================================
// 职责: 写入 action_log；同时作为引擎事件发布者记录强制停用
// 约定: 审计写入失败只记录日志，不影响业务结果
// ==========================================

use std::error::Error;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::domain::{ActionLog, ActionType};
use crate::engine::{FleetEvent, FleetEventPublisher};
use crate::repository::ActionLogRepository;

/// 系统自动操作的操作人
pub const SYSTEM_ACTOR: &str = "system";

pub struct AuditTrail {
    action_log_repo: Arc<ActionLogRepository>,
}

impl AuditTrail {
    pub fn new(action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self { action_log_repo }
    }

    fn build(
        action_type: ActionType,
        actor: &str,
        machine_id: Option<i64>,
        payload: JsonValue,
        detail: String,
    ) -> ActionLog {
        ActionLog {
            action_id: Uuid::new_v4().to_string(),
            action_type: action_type.as_str().to_string(),
            action_ts: Utc::now().naive_utc(),
            actor: actor.to_string(),
            machine_id,
            payload_json: Some(payload),
            detail: Some(detail),
        }
    }

    /// 记录一条审计日志
    pub fn record(
        &self,
        action_type: ActionType,
        actor: &str,
        machine_id: Option<i64>,
        payload: JsonValue,
        detail: impl Into<String>,
    ) {
        let log = Self::build(action_type, actor, machine_id, payload, detail.into());
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!(
                action_type = %action_type,
                machine_id = ?machine_id,
                error = %e,
                "审计日志写入失败"
            );
        }
    }
}

impl FleetEventPublisher for AuditTrail {
    fn publish(&self, event: &FleetEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        match event {
            FleetEvent::MachineForcedOutOfService {
                machine_id,
                policy_id,
                previous_state,
                total_hours,
            } => {
                let log = Self::build(
                    ActionType::ForcedOutOfService,
                    SYSTEM_ACTOR,
                    Some(*machine_id),
                    json!({
                        "policy_id": policy_id,
                        "previous_state": previous_state,
                        "total_hours": total_hours.to_string(),
                    }),
                    format!("保养计划 {} 超期，机器 {} 强制停用", policy_id, machine_id),
                );
                self.action_log_repo.insert(&log)?;
            }
        }
        Ok(())
    }
}
