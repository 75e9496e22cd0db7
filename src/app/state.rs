// ==========================================
// 车队维保管理系统 - 应用状态
// ==========================================
// 职责: 用一条共享连接装配 Repository / Engine / API
// 约定: 所有组件在此处一次性构造并注入，无全局单例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{
    AlarmApi, AssignmentApi, AuditTrail, AuthorizationGate, FleetApi, HourLogApi, MachineApi,
    MaintenanceApi, RolePermissionTable, ScheduledMaintenanceApi,
};
use crate::config::config_manager::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::engine::{
    FleetRepositories, FleetSummaryEngine, HourLoggingService, MachineLocks, ThresholdEvaluator,
};
use crate::repository::{
    ActionLogRepository, AlarmRepository, AssignmentRepository, HourLogRepository,
    MachineRepository, MaintenanceRepository, ScheduledMaintenanceRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub machine_api: Arc<MachineApi>,
    pub scheduled_maintenance_api: Arc<ScheduledMaintenanceApi>,
    pub maintenance_api: Arc<MaintenanceApi>,
    pub assignment_api: Arc<AssignmentApi>,
    pub hour_log_api: Arc<HourLogApi>,
    pub alarm_api: Arc<AlarmApi>,
    pub fleet_api: Arc<FleetApi>,

    /// 权限网关（调用方在进入各 API 前校验）
    pub authorization: Arc<AuthorizationGate>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 操作日志仓储（用于审计查询）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 使用标准权限表创建 AppState
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_permissions(db_path, RolePermissionTable::standard())
    }

    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - permissions: 注入的角色权限表
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开连接并幂等建表
    /// 2. 初始化所有Repository
    /// 3. 初始化所有Engine
    /// 4. 创建所有API实例
    pub fn with_permissions(
        db_path: String,
        permissions: RolePermissionTable,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let machine_repo = Arc::new(MachineRepository::from_connection(conn.clone()));
        let policy_repo = Arc::new(ScheduledMaintenanceRepository::from_connection(conn.clone()));
        let maintenance_repo = Arc::new(MaintenanceRepository::from_connection(conn.clone()));
        let assignment_repo = Arc::new(AssignmentRepository::from_connection(conn.clone()));
        let hour_log_repo = Arc::new(HourLogRepository::from_connection(conn.clone()));
        let alarm_repo = Arc::new(AlarmRepository::from_connection(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let repos = FleetRepositories {
            machines: machine_repo.clone(),
            catalog: policy_repo.clone(),
            history: maintenance_repo.clone(),
            assignments: assignment_repo.clone(),
            alarms: alarm_repo.clone(),
            hour_logs: hour_log_repo.clone(),
        };

        let locks = Arc::new(MachineLocks::new());
        let audit = Arc::new(AuditTrail::new(action_log_repo.clone()));

        // 强制停用事件写入审计日志（Engine 不直接依赖 API 层）
        let evaluator = Arc::new(
            ThresholdEvaluator::new(&repos, locks.clone()).with_publisher(audit.clone()),
        );
        let hour_logging = Arc::new(HourLoggingService::new(
            &repos,
            evaluator.clone(),
            locks.clone(),
        ));
        let summary_engine = Arc::new(FleetSummaryEngine::new(&repos));

        // ==========================================
        // 初始化API层
        // ==========================================
        let machine_api = Arc::new(MachineApi::new(machine_repo.clone(), locks.clone()));
        let scheduled_maintenance_api = Arc::new(ScheduledMaintenanceApi::new(
            policy_repo.clone(),
            machine_repo.clone(),
        ));
        let maintenance_api = Arc::new(MaintenanceApi::new(
            maintenance_repo,
            policy_repo,
            machine_repo.clone(),
            locks.clone(),
            audit.clone(),
        ));
        let assignment_api = Arc::new(AssignmentApi::new(
            assignment_repo,
            machine_repo.clone(),
            locks.clone(),
        ));
        let hour_log_api = Arc::new(HourLogApi::new(
            hour_logging,
            hour_log_repo,
            audit.clone(),
        ));
        let alarm_api = Arc::new(AlarmApi::new(
            alarm_repo,
            machine_repo,
            config_manager.clone(),
            locks,
            audit,
        ));
        let fleet_api = Arc::new(FleetApi::new(summary_engine, evaluator));

        let authorization = Arc::new(AuthorizationGate::new(permissions));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            machine_api,
            scheduled_maintenance_api,
            maintenance_api,
            assignment_api,
            hour_log_api,
            alarm_api,
            fleet_api,
            authorization,
            config_manager,
            action_log_repo,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}
