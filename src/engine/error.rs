// ==========================================
// 车队维保管理系统 - 引擎层错误类型
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 引擎层错误
#[derive(Error, Debug)]
pub enum EngineError {
    /// 业务前置条件不满足（按字段标记，可恢复）
    #[error("校验失败 (field={field}): {message}")]
    Validation { field: String, message: String },

    #[error("机器不存在: machine_id={0}")]
    MachineNotFound(i64),

    #[error("机器锁获取失败: {0}")]
    LockError(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
