use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool, Type};
use strum::{Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

use super::{Page, Pagination, like_pattern};
use crate::validation::{ValidationError, validate_email, validate_username};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize, EnumString, Display, Default,
)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string; never leaves the server.
    #[serde(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Admin-side account changes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserAdmin {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role, is_active, last_login_at, created_at, updated_at";

impl User {
    pub async fn create(pool: &SqlitePool, data: &CreateUser) -> Result<Self, UserError> {
        let username = data.username.trim();
        let email = data.email.trim().to_lowercase();
        validate_username(username)?;
        validate_email(&email)?;

        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, email, password_hash, role, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, 1, $6, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(username)
        .bind(&email)
        .bind(&data.password_hash)
        .bind(data.role)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                let field = if db_err.message().contains("email") {
                    "email"
                } else {
                    "username"
                };
                return UserError::Conflict(format!("An account with this {field} already exists"));
            }
            UserError::from(e)
        })
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Emails are stored lowercased; lookup is case-insensitive.
    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await
    }

    /// Paged listing for the admin console, newest accounts first.
    pub async fn list(
        pool: &SqlitePool,
        search: Option<&str>,
        pagination: &Pagination,
    ) -> Result<Page<Self>, sqlx::Error> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users");
        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        if let Some(term) = search {
            let pattern = like_pattern(&term.to_lowercase());
            for builder in [&mut count, &mut select] {
                builder
                    .push(" WHERE (lower(username) LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\' OR email LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\')");
            }
        }
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;
        let items = select.build_query_as::<User>().fetch_all(pool).await?;
        Ok(Page::new(items, total, pagination))
    }

    pub async fn update_admin(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateUserAdmin,
    ) -> Result<Self, UserError> {
        let existing = Self::find_by_id(pool, id).await?.ok_or(UserError::NotFound)?;
        let role = data.role.unwrap_or(existing.role);
        let is_active = data.is_active.unwrap_or(existing.is_active);

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2, is_active = $3, updated_at = $4
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role)
        .bind(is_active)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    pub async fn update_password(
        pool: &SqlitePool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), UserError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .bind(Utc::now())
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(UserError::NotFound);
        }
        Ok(())
    }

    pub async fn touch_login(pool: &SqlitePool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Hard delete. Journals, mood entries and conversations cascade.
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }

    pub async fn count_active(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = 1")
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_pool, create_test_user};

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (pool, _tmp) = create_test_pool().await;
        create_test_user(&pool, "amira").await;

        let err = User::create(
            &pool,
            &CreateUser {
                username: "someone_else".into(),
                email: "AMIRA@example.com".into(),
                password_hash: "h".into(),
                role: UserRole::User,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UserError::Conflict(msg) if msg.contains("email")));
    }

    #[tokio::test]
    async fn duplicate_username_ignores_case() {
        let (pool, _tmp) = create_test_pool().await;
        create_test_user(&pool, "amira").await;

        let err = User::create(
            &pool,
            &CreateUser {
                username: "Amira".into(),
                email: "other@example.com".into(),
                password_hash: "h".into(),
                role: UserRole::User,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UserError::Conflict(msg) if msg.contains("username")));
    }

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() {
        let (pool, _tmp) = create_test_pool().await;
        let user = create_test_user(&pool, "yusuf").await;

        let found = User::find_by_email(&pool, " Yusuf@Example.COM ")
            .await
            .unwrap()
            .expect("user by email");
        assert_eq!(found.id, user.id);
        assert!(found.is_active);
        assert_eq!(found.role, UserRole::User);
    }

    #[tokio::test]
    async fn admin_update_and_counts() {
        let (pool, _tmp) = create_test_pool().await;
        let user = create_test_user(&pool, "layla").await;
        create_test_user(&pool, "omar").await;

        let updated = User::update_admin(
            &pool,
            user.id,
            &UpdateUserAdmin {
                role: Some(UserRole::Admin),
                is_active: Some(false),
            },
        )
        .await
        .unwrap();
        assert!(updated.is_admin());
        assert!(!updated.is_active);

        assert_eq!(User::count(&pool).await.unwrap(), 2);
        assert_eq!(User::count_active(&pool).await.unwrap(), 1);

        let missing = User::update_admin(&pool, Uuid::new_v4(), &UpdateUserAdmin::default()).await;
        assert!(matches!(missing, Err(UserError::NotFound)));
    }

    #[tokio::test]
    async fn list_filters_by_search_term() {
        let (pool, _tmp) = create_test_pool().await;
        create_test_user(&pool, "sara_k").await;
        create_test_user(&pool, "saad").await;
        create_test_user(&pool, "zaid").await;

        let page = User::list(&pool, Some("SA"), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let page = User::list(&pool, Some("_k"), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1, "underscore must match literally");
        assert_eq!(page.items[0].username, "sara_k");

        let page = User::list(&pool, None, &Pagination::new(2, 2)).await.unwrap();
        assert_eq!((page.total, page.items.len()), (3, 1));
    }

    #[tokio::test]
    async fn login_and_password_updates() {
        let (pool, _tmp) = create_test_pool().await;
        let user = create_test_user(&pool, "huda").await;
        assert!(user.last_login_at.is_none());

        User::touch_login(&pool, user.id).await.unwrap();
        User::update_password(&pool, user.id, "new-hash").await.unwrap();

        let reloaded = User::find_by_id(&pool, user.id).await.unwrap().unwrap();
        assert!(reloaded.last_login_at.is_some());
        assert_eq!(reloaded.password_hash, "new-hash");

        assert_eq!(User::delete(&pool, user.id).await.unwrap(), 1);
        assert!(User::find_by_id(&pool, user.id).await.unwrap().is_none());
    }
}
