// ==========================================
// 车队维保管理系统 - 输入校验器
// ==========================================
// 职责: 收集按字段标记的校验违规，一次性返回给调用方
// ==========================================

use crate::api::error::{ApiError, ApiResult, FieldViolation};
use rust_decimal::Decimal;

/// 字段校验收集器
#[derive(Debug, Default)]
pub struct FieldValidator {
    violations: Vec<FieldViolation>,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 条件不满足时记录违规
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.violations.push(FieldViolation::new(field, message));
        }
        self
    }

    /// 必填文本（去除首尾空白后非空）
    pub fn require_text(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "不能为空")
    }

    /// 文本最少字符数（去除首尾空白后计数）
    pub fn min_chars(&mut self, field: &str, value: &str, min: usize) -> &mut Self {
        let count = value.trim().chars().count();
        self.check(count >= min, field, format!("至少需要 {} 个字符", min))
    }

    pub fn positive(&mut self, field: &str, value: Decimal) -> &mut Self {
        self.check(value > Decimal::ZERO, field, "必须大于 0")
    }

    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// 结束校验：无违规返回 Ok，单个违规返回 Validation，多个返回 ValidationErrors
    pub fn finish(self) -> ApiResult<()> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(into_error(self.violations))
        }
    }

    /// 结束校验并取出解析结果
    ///
    /// `parsed` 为 None 时记为 `field` 的违规（排在最前），与已收集的违规一并返回
    pub fn finish_with<T>(
        mut self,
        field: &str,
        parsed: Option<T>,
        message: impl Into<String>,
    ) -> ApiResult<T> {
        match parsed {
            Some(value) if self.violations.is_empty() => Ok(value),
            Some(_) => Err(into_error(self.violations)),
            None => {
                self.violations.insert(0, FieldViolation::new(field, message));
                Err(into_error(self.violations))
            }
        }
    }
}

fn into_error(mut violations: Vec<FieldViolation>) -> ApiError {
    if violations.len() == 1 {
        let v = violations.remove(0);
        ApiError::Validation {
            field: v.field,
            message: v.message,
        }
    } else {
        ApiError::ValidationErrors(violations)
    }
}
