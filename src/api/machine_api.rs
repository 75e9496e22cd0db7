// ==========================================
// 车队维保管理系统 - 机器台账 API
// ==========================================

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::FieldValidator;
use crate::domain::{Machine, MachineState, NewMachine};
use crate::engine::{EngineError, MachineLocks};
use crate::repository::MachineRepository;

pub struct MachineApi {
    machine_repo: Arc<MachineRepository>,
    locks: Arc<MachineLocks>,
}

impl MachineApi {
    pub fn new(machine_repo: Arc<MachineRepository>, locks: Arc<MachineLocks>) -> Self {
        Self {
            machine_repo,
            locks,
        }
    }

    /// 新建机器
    ///
    /// # 规则
    /// - name 必填
    /// - serial_number 提供时必须唯一
    pub fn create(&self, request: NewMachine) -> ApiResult<Machine> {
        let mut validator = FieldValidator::new();
        validator.require_text("name", &request.name);
        if let Some(serial) = &request.serial_number {
            validator.require_text("serial_number", serial);
        }
        validator.finish()?;

        let mut request = request;
        request.name = request.name.trim().to_string();
        request.serial_number = request.serial_number.map(|s| s.trim().to_string());

        if let Some(serial) = &request.serial_number {
            if self.machine_repo.find_by_serial(serial)?.is_some() {
                return Err(ApiError::validation("serial_number", "序列号已存在"));
            }
        }

        let machine = self.machine_repo.create(&request)?;
        tracing::info!(machine_id = machine.machine_id, name = %machine.name, "机器已登记");
        Ok(machine)
    }

    pub fn get(&self, machine_id: i64) -> ApiResult<Machine> {
        self.machine_repo
            .find_by_id(machine_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Machine(id={})不存在", machine_id)))
    }

    pub fn list_all(&self) -> ApiResult<Vec<Machine>> {
        Ok(self.machine_repo.list_all()?)
    }

    pub fn list_by_state(&self, state: MachineState) -> ApiResult<Vec<Machine>> {
        Ok(self.machine_repo.list_by_state(state)?)
    }

    pub fn latest_updated(&self, limit: usize) -> ApiResult<Vec<Machine>> {
        Ok(self.machine_repo.latest_updated(limit)?)
    }

    /// 直接累加机器工时（不经工时记录，不触发评估）
    pub fn add_hours(&self, machine_id: i64, delta: Decimal) -> ApiResult<Machine> {
        if delta <= Decimal::ZERO {
            return Err(ApiError::validation("delta", "累加工时必须大于 0"));
        }
        let machine = self.locks.with_lock(machine_id, || {
            let machine = self
                .machine_repo
                .find_by_id(machine_id)?
                .ok_or(EngineError::MachineNotFound(machine_id))?;
            if !machine.accepts_hours() {
                return Err(EngineError::validation("machine_id", "机器已停用，不能累加工时"));
            }
            Ok(self.machine_repo.add_hours(machine_id, delta)?)
        })?;
        Ok(machine)
    }

    /// 设置机器状态（状态未变化时为空操作）
    pub fn set_state(&self, machine_id: i64, state: MachineState) -> ApiResult<Machine> {
        let machine = self
            .locks
            .with_lock(machine_id, || Ok(self.machine_repo.set_state(machine_id, state)?))?;
        Ok(machine)
    }

    /// 删除机器（级联删除其计划、保养、分配、工时与告警），并释放机器锁条目
    pub fn delete(&self, machine_id: i64) -> ApiResult<()> {
        self.locks
            .with_lock(machine_id, || Ok(self.machine_repo.delete(machine_id)?))?;
        self.locks.forget(machine_id)?;
        Ok(())
    }
}
