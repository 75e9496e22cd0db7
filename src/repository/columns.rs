// ==========================================
// 车队维保管理系统 - 列值编解码工具
// ==========================================
// 约定: Decimal 以 TEXT 存储；时间戳统一 UTC naive
// ==========================================

use chrono::{NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use rust_decimal::Decimal;
use std::str::FromStr;

/// 读取 TEXT 列并精确解析为 Decimal
pub fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(raw.trim())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decimal 写入格式（规范化去除多余尾零）
pub fn decimal_text(value: Decimal) -> String {
    value.normalize().to_string()
}

/// 当前时间戳
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// 将 TEXT 枚举列解析为领域枚举，失败时报告列转换错误
pub fn enum_at<T>(
    row: &Row<'_>,
    idx: usize,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("无法识别的枚举值: {}", raw).into(),
        )
    })
}
