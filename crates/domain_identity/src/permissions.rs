//! Role predicates used by the API guards

use crate::user::{AdminSubRole, Role, User};

impl User {
    /// ADMIN or SUPER_ADMIN
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::SuperAdmin)
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn is_vendor(&self) -> bool {
        self.role == Role::Vendor
    }

    pub fn is_lawyer(&self) -> bool {
        self.role == Role::Lawyer
    }

    pub fn is_admin_or_lawyer(&self) -> bool {
        self.is_admin() || self.is_lawyer()
    }

    /// Super admins hold every permission; others need an explicit grant
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_super_admin()
            || self.sub_role == Some(AdminSubRole::SuperAdmin)
            || self.permissions.iter().any(|p| p == permission)
    }
}

#[cfg(test)]
mod tests {
    use crate::user::{NewUser, Role, User};

    fn user(role: Role) -> User {
        User::new(
            NewUser {
                username: "someone".to_string(),
                email: "someone@example.com".to_string(),
                first_name: String::new(),
                last_name: String::new(),
                role,
                sub_role: None,
            },
            "hash".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_role_predicates() {
        assert!(user(Role::SuperAdmin).is_admin());
        assert!(user(Role::Admin).is_admin());
        assert!(!user(Role::Admin).is_super_admin());
        assert!(user(Role::Lawyer).is_admin_or_lawyer());
        assert!(!user(Role::Vendor).is_admin_or_lawyer());
        assert!(!user(Role::Client).is_admin());
    }

    #[test]
    fn test_permission_grants() {
        let mut admin = user(Role::Admin);
        assert!(!admin.has_permission("cases.export"));
        admin.permissions.push("cases.export".to_string());
        assert!(admin.has_permission("cases.export"));
        assert!(user(Role::SuperAdmin).has_permission("anything"));
    }
}
