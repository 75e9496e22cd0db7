// ==========================================
// 车队维保管理系统 - 机器级互斥锁
// ==========================================
// 职责: 同一台机器的 工时提交 → 阈值评估 串行执行
// 说明: 不同机器之间互不阻塞
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 机器锁注册表
#[derive(Default)]
pub struct MachineLocks {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl MachineLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取（必要时创建）指定机器的锁句柄
    pub fn handle(&self, machine_id: i64) -> EngineResult<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| EngineError::LockError(e.to_string()))?;
        Ok(locks
            .entry(machine_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// 移除已删除机器的锁条目
    ///
    /// 仍持有旧句柄的调用方不受影响；之后的调用会拿到新锁
    pub fn forget(&self, machine_id: i64) -> EngineResult<()> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| EngineError::LockError(e.to_string()))?;
        locks.remove(&machine_id);
        Ok(())
    }

    /// 在机器锁内执行闭包
    pub fn with_lock<T>(
        &self,
        machine_id: i64,
        f: impl FnOnce() -> EngineResult<T>,
    ) -> EngineResult<T> {
        let handle = self.handle(machine_id)?;
        let _guard = handle
            .lock()
            .map_err(|e| EngineError::LockError(e.to_string()))?;
        f()
    }
}
