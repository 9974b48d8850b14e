use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::AccountError;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_activated, created_at, updated_at";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where<T>(&self, condition: &str, value: T) -> Result<Option<User>, AccountError>
    where
        T: for<'q> sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + Send + 'static,
    {
        let query = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, condition);

        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    is_activated: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AccountError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(r.id),
            username: Username::new(r.username)?,
            email: EmailAddress::new(r.email)?,
            password_hash: r.password_hash,
            is_activated: r.is_activated,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Map unique violations on the users table to their domain errors.
fn map_write_error(e: sqlx::Error, user: &User) -> AccountError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            if db_err.constraint() == Some("users_username_key") {
                return AccountError::UsernameAlreadyExists(user.username.as_str().to_string());
            }
            if db_err.constraint() == Some("users_email_key") {
                return AccountError::EmailAlreadyExists(user.email.as_str().to_string());
            }
        }
    }
    AccountError::DatabaseError(e.to_string())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, AccountError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, is_activated, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.0)
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.is_activated)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user))?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AccountError> {
        self.fetch_one_where("id = $1", id.0).await
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, AccountError> {
        self.fetch_one_where("username = $1", username.as_str().to_string())
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        self.fetch_one_where("email = $1", EmailAddress::normalize(email))
            .await
    }

    async fn update(&self, user: User) -> Result<User, AccountError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = $4, is_activated = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.is_activated)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user))?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound(user.id.to_string()));
        }

        Ok(user)
    }

    async fn find_by_social_account(
        &self,
        provider: &str,
        uid: &str,
    ) -> Result<Option<User>, AccountError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.is_activated, u.created_at, u.updated_at
            FROM users u
            JOIN social_accounts s ON s.user_id = u.id
            WHERE s.provider = $1 AND s.uid = $2
            "#,
        )
        .bind(provider)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn link_social_account(
        &self,
        user_id: &UserId,
        provider: &str,
        uid: &str,
    ) -> Result<(), AccountError> {
        sqlx::query(
            r#"
            INSERT INTO social_accounts (provider, uid, user_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (provider, uid) DO NOTHING
            "#,
        )
        .bind(provider)
        .bind(uid)
        .bind(user_id.0)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
