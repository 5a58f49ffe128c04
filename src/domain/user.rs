use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
    SuperAdmin,
}

/// What a role is allowed to do. Routes check capabilities, never role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    ManageCatalog,
    ManageOrders,
    ManageUsers,
    ViewDashboard,
    UploadMedia,
    AssignAdminRoles,
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ManageCatalog,
    Permission::ManageOrders,
    Permission::ManageUsers,
    Permission::ViewDashboard,
    Permission::UploadMedia,
];

const SUPER_ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ManageCatalog,
    Permission::ManageOrders,
    Permission::ManageUsers,
    Permission::ViewDashboard,
    Permission::UploadMedia,
    Permission::AssignAdminRoles,
];

impl Role {
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Customer => &[],
            Role::Admin => ADMIN_PERMISSIONS,
            Role::SuperAdmin => SUPER_ADMIN_PERMISSIONS,
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn require(&self, permission: Permission) -> Result<(), DomainError> {
        if self.role.can(permission) {
            Ok(())
        } else {
            Err(DomainError::Forbidden(format!(
                "Insufficient permissions: {permission} required"
            )))
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl ProfileChanges {
    pub fn apply(&self, user: &mut User) {
        if let Some(v) = &self.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            user.last_name = v.clone();
        }
        if let Some(v) = &self.phone {
            user.phone = Some(v.clone());
        }
    }
}

/// Emails are compared case-insensitively and stored lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
