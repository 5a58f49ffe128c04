use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::password::{hash_password, validate_password, verify_password};
use super::tokens::{TokenPair, TokenService};
use crate::domain::errors::DomainError;
use crate::domain::ports::UserRepository;
use crate::domain::user::{normalize_email, NewUser, ProfileChanges, Role, User};

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    pub fn register(&self, input: Registration) -> Result<AuthSession, DomainError> {
        validate_password(&input.password)?;
        let email = normalize_email(&input.email);
        if self.users.find_by_email(&email)?.is_some() {
            return Err(DomainError::Conflict(format!(
                "User with email '{email}' already exists"
            )));
        }

        let user = self.users.create(NewUser {
            email,
            password_hash: hash_password(&input.password)?,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            phone: input.phone,
            role: Role::Customer,
        })?;
        log::info!("registered user {}", user.id);

        let tokens = self.tokens.issue(&user)?;
        Ok(AuthSession { user, tokens })
    }

    pub fn login(&self, email: &str, password: &str) -> Result<AuthSession, DomainError> {
        let invalid = || DomainError::Unauthorized("Invalid email or password".to_string());

        let user = self
            .users
            .find_by_email(&normalize_email(email))?
            .ok_or_else(invalid)?;
        if !verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }
        if !user.is_active() {
            return Err(DomainError::Unauthorized("Account is inactive".to_string()));
        }

        let now = Utc::now();
        self.users.record_login(user.id, now)?;
        let user = User {
            last_login_at: Some(now),
            ..user
        };
        let tokens = self.tokens.issue(&user)?;
        Ok(AuthSession { user, tokens })
    }

    /// Re-issues both tokens. Refresh tokens are not tracked, so a leaked one
    /// stays valid until it expires.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        let user_id = self.tokens.verify_refresh(refresh_token)?;
        let user = self.active_user(user_id)?;
        self.tokens.issue(&user)
    }

    /// Resolves a bearer token to a freshly loaded, active user.
    pub fn authenticate(&self, access_token: &str) -> Result<User, DomainError> {
        let user_id = self.tokens.verify_access(access_token)?;
        self.active_user(user_id)
    }

    pub fn update_profile(&self, user_id: Uuid, changes: ProfileChanges) -> Result<User, DomainError> {
        self.active_user(user_id)?;
        self.users.update_profile(user_id, &changes, Utc::now())
    }

    pub fn change_password(
        &self,
        user_id: Uuid,
        current: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        let user = self.active_user(user_id)?;
        if !verify_password(current, &user.password_hash)? {
            return Err(DomainError::validation("Current password is incorrect"));
        }
        validate_password(new_password)?;
        let hash = hash_password(new_password)?;
        self.users.set_password_hash(user.id, &hash, Utc::now())
    }

    fn active_user(&self, user_id: Uuid) -> Result<User, DomainError> {
        let user = self
            .users
            .find_by_id(user_id)?
            .ok_or_else(|| DomainError::Unauthorized("User no longer exists".to_string()))?;
        if !user.is_active() {
            return Err(DomainError::Unauthorized("Account is inactive".to_string()));
        }
        Ok(user)
    }
}
