// ==========================================
// 车队维保管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将仓储 / 引擎错误转换为按字段标记的业务错误
// 约定: 校验类错误始终可恢复，返回给调用方，不中断进程
// ==========================================

use crate::engine::EngineError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 单个字段的校验违规
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 校验错误（含一致性违规）
    // ==========================================
    #[error("校验失败 (field={field}): {message}")]
    Validation { field: String, message: String },

    #[error("校验失败: {}", format_violations(.0))]
    ValidationErrors(Vec<FieldViolation>),

    // ==========================================
    // 资源 / 权限
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("权限不足: role={role}, permission={permission}")]
    PermissionDenied { role: String, permission: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// 返回所有违规字段（便于调用方按字段展示）
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ApiError::Validation { field, .. } => vec![field.as_str()],
            ApiError::ValidationErrors(violations) => {
                violations.iter().map(|v| v.field.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation { .. } | ApiError::ValidationErrors(_))
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),

            // 唯一约束: 每机每日一条工时记录
            RepositoryError::UniqueConstraintViolation(msg) => {
                if msg.contains("machine_hour_log") {
                    ApiError::validation("work_date", "该机器当天已有工时记录")
                } else if msg.contains("scheduled_maintenance") {
                    ApiError::validation("name", "该机器已存在同名保养计划")
                } else if msg.contains("serial_number") {
                    ApiError::validation("serial_number", "序列号已存在")
                } else if msg.contains("project_assignment") {
                    ApiError::validation("project_id", "该机器已分配到此项目")
                } else {
                    ApiError::validation("unknown", format!("唯一约束违反: {}", msg))
                }
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::validation("reference", format!("引用的记录不存在: {}", msg))
            }

            RepositoryError::FieldValueError { field, message } => {
                ApiError::InternalError(format!("存储字段{}无法解析: {}", field, message))
            }

            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation { field, message } => ApiError::Validation { field, message },
            EngineError::MachineNotFound(id) => {
                ApiError::NotFound(format!("Machine(id={})不存在", id))
            }
            EngineError::LockError(msg) => ApiError::InternalError(format!("机器锁获取失败: {}", msg)),
            EngineError::Repository(e) => e.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
