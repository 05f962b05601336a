use crate::error::{AppError, Result};
use crate::models::{PermissionAction, PermissionModule, User};

/// Answers "may the current user do X in module Y" for a user snapshot.
///
/// Evaluation is fail-closed: no user, no permission map, a missing module
/// entry or a missing flag all deny. Admin-equivalent roles are granted
/// everything before the map is consulted.
#[derive(Debug, Clone, Copy)]
pub struct PermissionEvaluator<'a> {
    user: Option<&'a User>,
}

impl<'a> PermissionEvaluator<'a> {
    pub fn new(user: Option<&'a User>) -> Self {
        Self { user }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn user(&self) -> Option<&'a User> {
        self.user
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_some_and(|u| u.role.is_admin_equivalent())
    }

    pub fn has_permission(&self, module: PermissionModule, action: PermissionAction) -> bool {
        let Some(user) = self.user else {
            return false;
        };
        if user.role.is_admin_equivalent() {
            return true;
        }
        user.permissions
            .as_ref()
            .and_then(|p| p.get(module))
            .is_some_and(|flags| flags.allows(action))
    }

    /// True when any of the four flags is set for `module`.
    pub fn has_any_permission(&self, module: PermissionModule) -> bool {
        if self.is_admin() {
            return true;
        }
        self.user
            .and_then(|u| u.permissions.as_ref())
            .and_then(|p| p.get(module))
            .is_some_and(|flags| flags.any())
    }

    pub fn can_view(&self, module: PermissionModule) -> bool {
        self.has_permission(module, PermissionAction::Ver)
    }

    pub fn can_create(&self, module: PermissionModule) -> bool {
        self.has_permission(module, PermissionAction::Crear)
    }

    pub fn can_edit(&self, module: PermissionModule) -> bool {
        self.has_permission(module, PermissionAction::Editar)
    }

    pub fn can_delete(&self, module: PermissionModule) -> bool {
        self.has_permission(module, PermissionAction::Eliminar)
    }

    /// Guard form of [`has_permission`](Self::has_permission).
    pub fn require(&self, module: PermissionModule, action: PermissionAction) -> Result<()> {
        if self.user.is_none() {
            return Err(AppError::NotAuthenticated);
        }
        if !self.has_permission(module, action) {
            tracing::debug!(%module, %action, "permission denied");
            return Err(AppError::Forbidden { module, action });
        }
        Ok(())
    }

    /// Full module × action matrix, in declaration order.
    pub fn matrix(&self) -> Vec<(PermissionModule, [bool; 4])> {
        PermissionModule::ALL
            .into_iter()
            .map(|module| {
                let row = PermissionAction::ALL.map(|action| self.has_permission(module, action));
                (module, row)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModulePermissions, Permissions, Role};
    use serde_json::json;

    fn user_with(role: &str, permisos: serde_json::Value) -> User {
        serde_json::from_value(json!({
            "id": 10,
            "username": "tester",
            "email": "tester@creditpro.app",
            "role": role,
            "permisos": permisos
        }))
        .unwrap()
    }

    #[test]
    fn test_no_user_denies_everything() {
        let evaluator = PermissionEvaluator::anonymous();
        for module in PermissionModule::ALL {
            for action in PermissionAction::ALL {
                assert!(!evaluator.has_permission(module, action));
            }
        }
        assert!(matches!(
            evaluator.require(PermissionModule::Creditos, PermissionAction::Ver),
            Err(AppError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_admin_roles_bypass_the_map() {
        for role in ["admin", "superadmin", "administrador"] {
            let user = user_with(role, json!(null));
            let evaluator = PermissionEvaluator::new(Some(&user));
            for module in PermissionModule::ALL {
                for action in PermissionAction::ALL {
                    assert!(evaluator.has_permission(module, action), "{role}");
                }
                assert!(evaluator.has_any_permission(module));
            }
            assert!(evaluator.is_admin());
        }
    }

    #[test]
    fn test_non_admin_follows_flags() {
        let user = user_with(
            "asesor",
            json!({
                "creditos": { "ver": true, "crear": false, "editar": false, "eliminar": false }
            }),
        );
        let evaluator = PermissionEvaluator::new(Some(&user));

        assert!(evaluator.can_view(PermissionModule::Creditos));
        assert!(!evaluator.can_create(PermissionModule::Creditos));
        assert!(!evaluator.can_edit(PermissionModule::Creditos));
        assert!(!evaluator.can_delete(PermissionModule::Creditos));
        // absent module entry
        assert!(!evaluator.can_view(PermissionModule::Bancos));
        assert!(!evaluator.has_any_permission(PermissionModule::Bancos));
        assert!(evaluator.has_any_permission(PermissionModule::Creditos));
    }

    #[test]
    fn test_missing_map_denies_non_admin() {
        let user = user_with("user", json!(null));
        let evaluator = PermissionEvaluator::new(Some(&user));
        assert!(!evaluator.can_view(PermissionModule::Reportes));
    }

    #[test]
    fn test_every_granted_flag_is_honoured() {
        let mut user = user_with("user", json!({}));
        for module in PermissionModule::ALL {
            for action in PermissionAction::ALL {
                let mut flags = ModulePermissions::default();
                match action {
                    PermissionAction::Ver => flags.ver = true,
                    PermissionAction::Crear => flags.crear = true,
                    PermissionAction::Editar => flags.editar = true,
                    PermissionAction::Eliminar => flags.eliminar = true,
                }
                user.permissions = Some(Permissions::new().with(module, flags));
                let evaluator = PermissionEvaluator::new(Some(&user));
                assert!(evaluator.has_permission(module, action));
                for other in PermissionAction::ALL.into_iter().filter(|a| *a != action) {
                    assert!(!evaluator.has_permission(module, other));
                }
            }
        }
    }

    #[test]
    fn test_require_reports_forbidden() {
        let mut user = user_with("asesor", json!({}));
        user.permissions = Some(Permissions::asesor());
        let evaluator = PermissionEvaluator::new(Some(&user));

        assert!(evaluator
            .require(PermissionModule::Clientes, PermissionAction::Editar)
            .is_ok());
        let err = evaluator
            .require(PermissionModule::Clientes, PermissionAction::Eliminar)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Forbidden {
                module: PermissionModule::Clientes,
                action: PermissionAction::Eliminar
            }
        ));
        assert_eq!(user.role, Role::Asesor);
    }

    #[test]
    fn test_matrix_covers_all_modules() {
        let user = user_with("admin", json!({}));
        let matrix = PermissionEvaluator::new(Some(&user)).matrix();
        assert_eq!(matrix.len(), 10);
        assert!(matrix.iter().all(|(_, row)| row.iter().all(|b| *b)));
    }
}
