// ==========================================
// 车队维保管理系统 - 项目分配领域模型
// ==========================================
// 职责: 机器与项目的工时合同 (约定工时 / 累计工时 / 完结标记)
// 红线: accumulated_hours 永不超过 pact_hours
// 红线: 同一机器同一时间最多一个未完结分配
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// ProjectAssignment - 项目分配
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAssignment {
    pub assignment_id: i64,
    pub machine_id: i64,
    pub project_id: i64,
    pub pact_hours: Decimal,
    pub accumulated_hours: Decimal,
    pub finalized: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// 累加工时被拒绝
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssignmentHoursError {
    #[error("分配已完结且工时已达约定上限: accumulated={accumulated}, pact={pact}")]
    AlreadyCompleted { accumulated: Decimal, pact: Decimal },

    #[error("累加工时必须大于 0: {0}")]
    NonPositiveDelta(Decimal),
}

impl ProjectAssignment {
    /// 是否为活动分配
    pub fn is_active(&self) -> bool {
        !self.finalized
    }

    /// 剩余可用工时
    pub fn remaining_hours(&self) -> Decimal {
        (self.pact_hours - self.accumulated_hours).max(Decimal::ZERO)
    }

    /// 判断追加工时后是否会超出约定
    pub fn would_exceed_pact(&self, delta: Decimal) -> bool {
        self.accumulated_hours + delta > self.pact_hours
    }

    /// 累加工时
    ///
    /// 规则:
    /// - 已完结且累计已达约定: 拒绝
    /// - 已完结但累计低于约定: 重新激活后累加
    /// - 累加后达到或超过约定: 截断到约定值并标记完结
    ///
    /// # 返回
    /// - `Ok(true)`: 本次累加导致分配完结
    /// - `Ok(false)`: 分配仍为活动状态
    pub fn apply_hours(&mut self, delta: Decimal) -> Result<bool, AssignmentHoursError> {
        if delta <= Decimal::ZERO {
            return Err(AssignmentHoursError::NonPositiveDelta(delta));
        }

        if self.finalized {
            if self.accumulated_hours >= self.pact_hours {
                return Err(AssignmentHoursError::AlreadyCompleted {
                    accumulated: self.accumulated_hours,
                    pact: self.pact_hours,
                });
            }
            self.finalized = false;
        }

        self.accumulated_hours += delta;
        if self.accumulated_hours >= self.pact_hours {
            self.accumulated_hours = self.pact_hours;
            self.finalized = true;
        }

        Ok(self.finalized)
    }
}

/// 新建项目分配请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssignment {
    pub machine_id: i64,
    pub project_id: i64,
    pub pact_hours: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn assignment(pact: i64, accumulated: i64, finalized: bool) -> ProjectAssignment {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ProjectAssignment {
            assignment_id: 1,
            machine_id: 1,
            project_id: 1,
            pact_hours: Decimal::from(pact),
            accumulated_hours: Decimal::from(accumulated),
            finalized,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_reaching_pact_exactly_finalizes() {
        let mut a = assignment(200, 190, false);
        assert_eq!(a.apply_hours(Decimal::from(10)), Ok(true));
        assert_eq!(a.accumulated_hours, Decimal::from(200));
        assert!(a.finalized);
    }

    #[test]
    fn test_overshoot_is_clamped_to_pact() {
        let mut a = assignment(200, 190, false);
        a.apply_hours(Decimal::from(15)).unwrap();
        assert_eq!(a.accumulated_hours, Decimal::from(200));
        assert!(a.finalized);
    }

    #[test]
    fn test_finalized_and_full_is_rejected() {
        let mut a = assignment(200, 200, true);
        assert!(matches!(
            a.apply_hours(Decimal::from(1)),
            Err(AssignmentHoursError::AlreadyCompleted { .. })
        ));
        assert_eq!(a.accumulated_hours, Decimal::from(200));
    }

    #[test]
    fn test_finalized_below_pact_is_reactivated() {
        let mut a = assignment(200, 150, true);
        assert_eq!(a.apply_hours(Decimal::new(105, 1)), Ok(false));
        assert_eq!(a.accumulated_hours, Decimal::new(1605, 1));
        assert!(a.is_active());
    }

    #[test]
    fn test_would_exceed_pact() {
        let a = assignment(200, 190, false);
        assert!(a.would_exceed_pact(Decimal::from(15)));
        assert!(!a.would_exceed_pact(Decimal::from(10)));
        assert_eq!(a.remaining_hours(), Decimal::from(10));
    }
}
