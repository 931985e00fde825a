use crate::api::Gateway;
use crate::error::ClientError;
use crate::models::{Identity, Role, User, UserUpdate};
use crate::policy::UserScope;
use tracing::info;

pub const ACCESS_DENIED: &str = "Access denied: only admins and doctors can view users";

/// The user directory as one caller sees it.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    viewer: Identity,
    scope: UserScope,
    users: Vec<User>,
}

impl UserDirectory {
    /// Fetches the directory. Roles without access get
    /// [`ClientError::Forbidden`] and no request is made.
    pub fn load(gateway: &dyn Gateway, viewer: Option<&Identity>) -> Result<Self, ClientError> {
        let viewer = viewer.ok_or_else(|| ClientError::forbidden(ACCESS_DENIED))?;
        let scope = viewer
            .role
            .user_scope()
            .ok_or_else(|| ClientError::forbidden(ACCESS_DENIED))?;

        let mut directory = Self {
            viewer: viewer.clone(),
            scope,
            users: Vec::new(),
        };
        directory.refresh(gateway)?;
        Ok(directory)
    }

    pub fn refresh(&mut self, gateway: &dyn Gateway) -> Result<(), ClientError> {
        let scope = self.scope;
        self.users = gateway
            .list_users()?
            .into_iter()
            .filter(|u| scope.admits(u))
            .collect();
        Ok(())
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn can_manage(&self) -> bool {
        self.viewer.role.can_manage_users()
    }

    fn ensure_manageable(&self, id: i64) -> Result<(), ClientError> {
        if !self.can_manage() {
            return Err(ClientError::forbidden("Only admins can manage users"));
        }
        if id == self.viewer.id {
            return Err(ClientError::validation("You cannot modify your own account here"));
        }
        Ok(())
    }

    pub fn delete(&mut self, gateway: &dyn Gateway, id: i64) -> Result<(), ClientError> {
        self.ensure_manageable(id)?;
        gateway.delete_user(id)?;
        info!(user_id = id, "user deleted");
        self.refresh(gateway)
    }

    pub fn change_role(
        &mut self,
        gateway: &dyn Gateway,
        id: i64,
        role: Role,
    ) -> Result<(), ClientError> {
        self.ensure_manageable(id)?;
        gateway.update_user(
            id,
            &UserUpdate {
                role: Some(role),
                ..Default::default()
            },
        )?;
        info!(user_id = id, role = %role, "user role changed");
        self.refresh(gateway)
    }
}
