use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::UserRepository;
use crate::domain::user::{Permission, Role, User, UserFilter, UserStatus};

/// Account administration.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<Page<User>, DomainError> {
        let (users, total) = self.users.list(filter, page)?;
        Ok(Page::new(users, total, page))
    }

    pub fn get(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)?
            .ok_or_else(|| DomainError::not_found("User"))
    }

    pub fn change_role(&self, actor: &User, id: Uuid, role: Role) -> Result<User, DomainError> {
        actor.require(Permission::ManageUsers)?;
        if actor.id == id {
            return Err(DomainError::Forbidden(
                "You cannot change your own role".to_string(),
            ));
        }
        let user = self.get(id)?;
        if role == Role::SuperAdmin || user.role == Role::SuperAdmin {
            actor.require(Permission::AssignAdminRoles)?;
        }
        if user.role == role {
            return Ok(user);
        }

        log::info!("{} changed role of {} from {} to {role}", actor.id, user.id, user.role);
        self.users.set_role(user.id, role, Utc::now())
    }

    pub fn change_status(&self, actor: &User, id: Uuid, status: UserStatus) -> Result<User, DomainError> {
        actor.require(Permission::ManageUsers)?;
        if actor.id == id {
            return Err(DomainError::Forbidden(
                "You cannot change your own account status".to_string(),
            ));
        }
        let user = self.get(id)?;
        if user.role == Role::SuperAdmin {
            actor.require(Permission::AssignAdminRoles)?;
        }

        log::info!("{} set status of {} to {status}", actor.id, user.id);
        self.users.set_status(user.id, status, Utc::now())
    }
}
