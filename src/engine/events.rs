// ==========================================
// 车队维保管理系统 - 引擎层事件发布
// ==========================================
// 职责: 定义维保事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，API 层实现审计适配器
// ==========================================

use crate::domain::types::MachineState;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

/// 维保事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FleetEvent {
    /// 超期导致机器被强制停用
    MachineForcedOutOfService {
        machine_id: i64,
        policy_id: i64,
        previous_state: MachineState,
        total_hours: Decimal,
    },
}

impl FleetEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            FleetEvent::MachineForcedOutOfService { .. } => "MachineForcedOutOfService",
        }
    }

    pub fn machine_id(&self) -> i64 {
        match self {
            FleetEvent::MachineForcedOutOfService { machine_id, .. } => *machine_id,
        }
    }
}

/// 维保事件发布者 Trait
pub trait FleetEventPublisher: Send + Sync {
    /// 发布事件
    ///
    /// # 返回
    /// - `Err`: 发布失败（调用方只记录日志，不影响主流程）
    fn publish(&self, event: &FleetEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 可选的事件发布者包装
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn FleetEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn FleetEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）；失败只记录告警日志
    pub fn publish(&self, event: &FleetEvent) {
        if let Some(publisher) = &self.inner {
            if let Err(e) = publisher.publish(event) {
                tracing::warn!(
                    "事件发布失败 - event={}, machine_id={}, error={}",
                    event.as_str(),
                    event.machine_id(),
                    e
                );
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording(Mutex<Vec<FleetEvent>>);

    impl FleetEventPublisher for Recording {
        fn publish(&self, event: &FleetEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    #[test]
    fn test_optional_publisher_forwards_events() {
        let recording = Arc::new(Recording(Mutex::new(Vec::new())));
        let publisher = OptionalEventPublisher::with_publisher(recording.clone());
        let event = FleetEvent::MachineForcedOutOfService {
            machine_id: 7,
            policy_id: 3,
            previous_state: MachineState::Operational,
            total_hours: Decimal::from(600),
        };
        publisher.publish(&event);
        assert_eq!(recording.0.lock().unwrap().as_slice(), &[event]);
    }

    #[test]
    fn test_unconfigured_publisher_is_silent() {
        let publisher = OptionalEventPublisher::default();
        assert!(!publisher.is_configured());
        publisher.publish(&FleetEvent::MachineForcedOutOfService {
            machine_id: 1,
            policy_id: 1,
            previous_state: MachineState::InMaintenance,
            total_hours: Decimal::ZERO,
        });
    }
}
