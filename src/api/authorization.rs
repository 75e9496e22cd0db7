// ==========================================
// 车队维保管理系统 - 权限网关
// ==========================================
// 规则: 请求通过 ⇔ "<resource>:<action>" 在角色权限集中，或 action 属于公开动作
// 约定: 权限表启动时构建一次并注入，无动态授权，无状态变更
// ==========================================

use std::collections::{HashMap, HashSet};

use crate::api::error::{ApiError, ApiResult};

/// 角色名
pub mod roles {
    pub const ADMIN: &str = "ADMIN";
    pub const ASSISTANT: &str = "ASSISTANT";
    pub const MAINTENANCE_MANAGER: &str = "MAINTENANCE_MANAGER";
    pub const OPERATOR: &str = "OPERATOR";
    pub const MAINTENANCE_TECHNICIAN: &str = "MAINTENANCE_TECHNICIAN";
}

const CRUD_ACTIONS: [&str; 6] = [
    "list",
    "retrieve",
    "create",
    "update",
    "partial_update",
    "destroy",
];

/// 默认公开动作
pub const PUBLIC_ACTIONS: [&str; 1] = ["authenticate"];

fn keys(resource: &str, actions: &[&str]) -> Vec<String> {
    actions
        .iter()
        .map(|action| format!("{}:{}", resource, action))
        .collect()
}

fn crud(resource: &str, extra: &[&str]) -> Vec<String> {
    let mut all = keys(resource, &CRUD_ACTIONS);
    all.extend(keys(resource, extra));
    all
}

// ==========================================
// RolePermissionTable - 角色权限表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RolePermissionTable {
    grants: HashMap<String, HashSet<String>>,
    public_actions: HashSet<String>,
}

impl RolePermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 授予角色一组权限键
    pub fn grant<I, S>(mut self, role: &str, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grants
            .entry(role.to_string())
            .or_default()
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn with_public_action(mut self, action: &str) -> Self {
        self.public_actions.insert(action.to_string());
        self
    }

    pub fn is_public(&self, action: &str) -> bool {
        self.public_actions.contains(action)
    }

    pub fn has_permission(&self, role: &str, permission: &str) -> bool {
        self.grants
            .get(role)
            .map(|set| set.contains(permission))
            .unwrap_or(false)
    }

    pub fn permissions_of(&self, role: &str) -> Option<&HashSet<String>> {
        self.grants.get(role)
    }

    /// 标准权限表
    pub fn standard() -> Self {
        let office = [
            crud("user", &[]),
            crud("machine", &["fleet_summary"]),
            crud("driver", &[]),
            crud("course", &["courses_by_user"]),
            crud("project", &["list_by_company"]),
            crud("scheduled_maintenance", &["by_machine"]),
            crud("maintenance", &["by_machine", "by_user"]),
            crud("life_record", &[]),
            crud("project_assignment", &["by_project", "by_machine"]),
            crud("hour_log", &["by_machine"]),
            keys("alarm", &["list", "retrieve", "acknowledge", "unacknowledged_count"]),
        ]
        .concat();

        let mut table = Self::new()
            .grant(roles::ADMIN, crud("login", &[]))
            .grant(roles::ADMIN, office.clone())
            .grant(roles::ASSISTANT, office)
            .grant(
                roles::MAINTENANCE_MANAGER,
                [
                    keys("machine", &["list", "retrieve"]),
                    crud("scheduled_maintenance", &["by_machine"]),
                    keys("alarm", &["list", "retrieve"]),
                ]
                .concat(),
            )
            .grant(
                roles::OPERATOR,
                [
                    keys("machine", &["list", "retrieve"]),
                    crud("hour_log", &["by_machine"]),
                    keys("scheduled_maintenance", &["by_machine"]),
                    keys("life_record", &["list", "retrieve"]),
                    keys("alarm", &["list", "retrieve"]),
                ]
                .concat(),
            )
            .grant(
                roles::MAINTENANCE_TECHNICIAN,
                [
                    keys("machine", &["list", "retrieve"]),
                    keys("scheduled_maintenance", &["list", "retrieve"]),
                    crud("maintenance", &["by_machine", "by_user"]),
                    keys("alarm", &["list", "retrieve"]),
                ]
                .concat(),
            );

        for action in PUBLIC_ACTIONS {
            table = table.with_public_action(action);
        }
        table
    }
}

// ==========================================
// AuthorizationGate - 权限网关
// ==========================================
pub struct AuthorizationGate {
    table: RolePermissionTable,
}

impl AuthorizationGate {
    pub fn new(table: RolePermissionTable) -> Self {
        Self { table }
    }

    /// 判断请求是否放行
    ///
    /// # 参数
    /// - `role`: 调用者角色（未登录为 None）
    /// - `resource`: 资源键，如 "hour_log"
    /// - `action`: 动作名，如 "create"
    pub fn is_authorized(&self, role: Option<&str>, resource: &str, action: &str) -> bool {
        if self.table.is_public(action) {
            return true;
        }
        let Some(role) = role else {
            return false;
        };
        self.table
            .has_permission(role, &format!("{}:{}", resource, action))
    }

    /// 判断并在拒绝时返回 PermissionDenied
    pub fn authorize(&self, role: Option<&str>, resource: &str, action: &str) -> ApiResult<()> {
        if self.is_authorized(role, resource, action) {
            Ok(())
        } else {
            tracing::debug!(role = ?role, resource, action, "权限校验未通过");
            Err(ApiError::PermissionDenied {
                role: role.unwrap_or("<anonymous>").to_string(),
                permission: format!("{}:{}", resource, action),
            })
        }
    }

    pub fn table(&self) -> &RolePermissionTable {
        &self.table
    }
}
