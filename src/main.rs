// ==========================================
// 车队维保管理系统 - 服务入口
// ==========================================
// 启动: 读取配置 → 初始化日志 → 装配 AppState → 输出车队汇总
// 可选: FLEET_SWEEP_INTERVAL_SECS > 0 时定时全车队阈值巡检，Ctrl+C 退出
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;

use fleet_maintenance::api::FleetApi;
use fleet_maintenance::config::AppConfig;
use fleet_maintenance::{logging, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    logging::init_with(config.log_json);

    tracing::info!("==================================================");
    tracing::info!("{}", fleet_maintenance::APP_NAME);
    tracing::info!("系统版本: {}", fleet_maintenance::VERSION);
    tracing::info!("==================================================");
    tracing::info!("使用数据库: {}", config.db_path);

    let state = AppState::new(config.db_path.clone())
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;

    let summary = state.fleet_api.summarize().context("车队汇总失败")?;
    tracing::info!(
        in_operation = summary.in_operation,
        up_to_date = summary.up_to_date,
        due_soon = summary.due_soon,
        overdue = summary.overdue,
        "车队保养状态汇总"
    );

    if !config.sweep_enabled() {
        tracing::info!("未启用定时巡检 (FLEET_SWEEP_INTERVAL_SECS=0)，退出");
        return Ok(());
    }

    run_sweep_loop(state.fleet_api.clone(), config.sweep_interval_secs).await;
    tracing::info!("服务已退出");
    Ok(())
}

/// 定时巡检循环，直到收到 Ctrl+C
async fn run_sweep_loop(fleet_api: Arc<FleetApi>, interval_secs: u64) {
    tracing::info!(interval_secs, "定时阈值巡检已启动");

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                tracing::info!("收到退出信号");
                break;
            }
            _ = ticker.tick() => {
                // SQLite 访问为阻塞调用，放到阻塞线程池执行
                let api = fleet_api.clone();
                match tokio::task::spawn_blocking(move || api.evaluate_fleet()).await {
                    Ok(Ok(result)) => tracing::info!(
                        machines = result.reports.len(),
                        failures = result.failures.len(),
                        alarms = result.alarm_count(),
                        "巡检完成"
                    ),
                    Ok(Err(e)) => tracing::error!(error = %e, "巡检失败"),
                    Err(e) => tracing::error!(error = %e, "巡检任务异常终止"),
                }
            }
        }
    }
}
