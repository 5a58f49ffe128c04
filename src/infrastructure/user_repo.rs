use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::pagination::PageRequest;
use crate::domain::ports::UserRepository;
use crate::domain::user::{
    normalize_email, NewUser, ProfileChanges, Role, User, UserFilter, UserStatus,
};
use crate::schema::users;

use super::models::{convert_all, NewUserRow, ProfileChangeset, UserRow};

pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn filtered(filter: &UserFilter) -> users::BoxedQuery<'static, Pg> {
    let mut query = users::table.into_boxed();
    if let Some(role) = filter.role {
        query = query.filter(users::role.eq(role.to_string()));
    }
    if let Some(status) = filter.status {
        query = query.filter(users::status.eq(status.to_string()));
    }
    if let Some(text) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{text}%");
        query = query.filter(
            users::email
                .ilike(pattern.clone())
                .or(users::first_name.ilike(pattern.clone()))
                .or(users::last_name.ilike(pattern)),
        );
    }
    query
}

fn updated(row: Option<UserRow>) -> Result<User, DomainError> {
    User::try_from(row.ok_or_else(|| DomainError::not_found("User"))?)
}

impl UserRepository for DieselUserRepository {
    fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(users::table)
            .values(&NewUserRow {
                id: Uuid::new_v4(),
                email: normalize_email(&user.email),
                password_hash: user.password_hash,
                first_name: user.first_name,
                last_name: user.last_name,
                phone: user.phone,
                role: user.role.to_string(),
                status: UserStatus::Active.to_string(),
            })
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| match DomainError::from(e) {
                DomainError::Conflict(_) => {
                    DomainError::Conflict("User with this email already exists".to_string())
                }
                other => other,
            })?;
        User::try_from(row)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;
        users::table
            .find(id)
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(User::try_from)
            .transpose()
    }

    /// Emails are stored normalized, so an exact match is case-insensitive.
    fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;
        users::table
            .filter(users::email.eq(normalize_email(email)))
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(User::try_from)
            .transpose()
    }

    fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<(Vec<User>, i64), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered(filter).count().get_result(conn)?;
            let rows = filtered(filter)
                .select(UserRow::as_select())
                .order(users::created_at.desc())
                .then_order_by(users::id.asc())
                .limit(page.limit)
                .offset(page.offset())
                .load(conn)?;
            Ok((convert_all(rows)?, total))
        })
    }

    fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
        at: DateTime<Utc>,
    ) -> Result<User, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(users::table.find(id))
            .set(ProfileChangeset::new(changes, at))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        updated(row)
    }

    fn set_role(&self, id: Uuid, role: Role, at: DateTime<Utc>) -> Result<User, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(users::table.find(id))
            .set((users::role.eq(role.to_string()), users::updated_at.eq(at)))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        updated(row)
    }

    fn set_status(&self, id: Uuid, status: UserStatus, at: DateTime<Utc>) -> Result<User, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(users::table.find(id))
            .set((users::status.eq(status.to_string()), users::updated_at.eq(at)))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        updated(row)
    }

    fn set_password_hash(&self, id: Uuid, hash: &str, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let changed = diesel::update(users::table.find(id))
            .set((users::password_hash.eq(hash), users::updated_at.eq(at)))
            .execute(&mut conn)?;
        if changed == 0 {
            return Err(DomainError::not_found("User"));
        }
        Ok(())
    }

    fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::update(users::table.find(id))
            .set(users::last_login_at.eq(Some(at)))
            .execute(&mut conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_db::setup_db;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".into(),
            first_name: "Nida".into(),
            last_name: "Raza".into(),
            phone: None,
            role: Role::Customer,
        }
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn email_is_unique_case_insensitively() {
        let (_container, pool) = setup_db().await;
        let repo = DieselUserRepository::new(pool);
        repo.create(new_user("Nida@Example.test")).expect("create");

        assert!(repo
            .find_by_email("NIDA@example.TEST")
            .expect("find")
            .is_some());
        assert!(matches!(
            repo.create(new_user("nida@example.test")),
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn targeted_writes_leave_other_columns_alone() {
        let (_container, pool) = setup_db().await;
        let repo = DieselUserRepository::new(pool);
        let user = repo.create(new_user("sana@example.test")).expect("create");

        repo.set_status(user.id, UserStatus::Inactive, Utc::now())
            .expect("status");
        let changes = ProfileChanges {
            phone: Some("03001234567".into()),
            ..ProfileChanges::default()
        };
        let after = repo
            .update_profile(user.id, &changes, Utc::now())
            .expect("profile");
        assert_eq!(after.status, UserStatus::Inactive);
        assert_eq!(after.first_name, "Nida");
        assert_eq!(after.phone.as_deref(), Some("03001234567"));

        repo.set_password_hash(user.id, "new-hash", Utc::now())
            .expect("password");
        let after = repo.set_role(user.id, Role::Admin, Utc::now()).expect("role");
        assert_eq!(after.password_hash, "new-hash");
        assert_eq!(after.status, UserStatus::Inactive);
        assert_eq!(after.phone.as_deref(), Some("03001234567"));

        assert!(matches!(
            repo.set_role(Uuid::new_v4(), Role::Admin, Utc::now()),
            Err(DomainError::NotFound(_))
        ));
    }
}
