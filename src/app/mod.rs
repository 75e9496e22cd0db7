// ==========================================
// 车队维保管理系统 - 应用层
// ==========================================
// 职责: 组件装配，供外层服务 / 命令入口使用
// ==========================================

pub mod state;

// 重导出
pub use state::AppState;
