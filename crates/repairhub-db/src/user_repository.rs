use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};

use repairhub_core::error::AppError;
use repairhub_core::models::{NewUser, User, UserRole, UserUpdate};
use repairhub_core::pagination::{Page, PageParams};

use crate::sql::{contains_pattern, db_error, parse_column};

/// Repository for users. Web accounts are keyed by email, bot accounts by
/// Telegram id.
#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, params: PageParams) -> Result<Page<User>, AppError> {
        self.search("", params).await
    }

    /// Users whose email or full name contains `keyword`.
    pub async fn search(&self, keyword: &str, params: PageParams) -> Result<Page<User>, AppError> {
        let params = params.normalized();
        let pattern = contains_pattern(keyword);
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE COALESCE(email, '') ILIKE $1 OR COALESCE(full_name, '') ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT * FROM users
            WHERE COALESCE(email, '') ILIKE $1 OR COALESCE(full_name, '') ILIKE $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        let items = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Page::new(items, total, params))
    }

    pub async fn service_owners(&self, params: PageParams) -> Result<Page<User>, AppError> {
        let params = params.normalized();
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(UserRole::ServiceOwner.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE role = $1 ORDER BY id LIMIT $2 OFFSET $3",
        )
        .bind(UserRole::ServiceOwner.as_str())
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        let items = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Page::new(items, total, params))
    }

    pub async fn get(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(User::try_from).transpose()
    }

    pub async fn require(&self, id: i64) -> Result<User, AppError> {
        self.get(id)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(User::try_from).transpose()
    }

    pub async fn get_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE telegram_id = $1")
            .bind(telegram_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(User::try_from).transpose()
    }

    async fn email_taken(&self, email: &str, except: Option<i64>) -> Result<bool, AppError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND id IS DISTINCT FROM $2)",
        )
        .bind(email.trim())
        .bind(except)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    pub async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        if let Some(email) = &user.email
            && self.email_taken(email, None).await?
        {
            return Err(AppError::BadRequest(format!(
                "User with email {email} already exists"
            )));
        }
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (
                email, password_hash, full_name, phone, role, is_active,
                telegram_id, username, first_name, last_name, language_code
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(user.email.as_deref().map(str::trim))
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.telegram_id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.language_code)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        row.try_into()
    }

    /// Returns the user bound to `telegram_id`, creating an active bot
    /// account from `profile` when there is none.
    pub async fn get_or_create_telegram(&self, profile: &NewUser) -> Result<User, AppError> {
        let telegram_id = profile
            .telegram_id
            .ok_or_else(|| AppError::BadRequest("telegram_id is required".into()))?;
        if let Some(user) = self.get_by_telegram_id(telegram_id).await? {
            return Ok(user);
        }
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (telegram_id, username, first_name, last_name, language_code, role, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            ON CONFLICT (telegram_id) DO UPDATE SET telegram_id = EXCLUDED.telegram_id
            RETURNING *
            "#,
        )
        .bind(telegram_id)
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.language_code)
        .bind(UserRole::User.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        tracing::info!(telegram_id, user_id = row.id, "Registered Telegram user");
        row.try_into()
    }

    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<User, AppError> {
        self.require(id).await?;
        if let Some(email) = &update.email
            && self.email_taken(email, Some(id)).await?
        {
            return Err(AppError::BadRequest(format!(
                "User with email {email} already exists"
            )));
        }
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                full_name = COALESCE($3, full_name),
                phone = COALESCE($4, phone),
                is_active = COALESCE($5, is_active),
                role = COALESCE($6, role),
                city_id = COALESCE($7, city_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.email.as_deref().map(str::trim))
        .bind(&update.full_name)
        .bind(&update.phone)
        .bind(update.is_active)
        .bind(update.role.map(|r| r.as_str()))
        .bind(update.city_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        row.try_into()
    }

    pub async fn set_role(&self, id: i64, role: UserRole) -> Result<User, AppError> {
        self.update(
            id,
            &UserUpdate {
                role: Some(role),
                ..UserUpdate::default()
            },
        )
        .await
    }

    pub async fn deactivate(&self, id: i64) -> Result<User, AppError> {
        self.update(
            id,
            &UserUpdate {
                is_active: Some(false),
                ..UserUpdate::default()
            },
        )
        .await
    }

    /// Stores the user's default city. The city must exist.
    pub async fn set_city(&self, id: i64, city_id: i64) -> Result<User, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cities WHERE id = $1)")
            .bind(city_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        if !exists {
            return Err(AppError::not_found("City", city_id));
        }
        self.update(
            id,
            &UserUpdate {
                city_id: Some(city_id),
                ..UserUpdate::default()
            },
        )
        .await
    }

    pub async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User", id));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User", id));
        }
        Ok(())
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: Option<String>,
    password_hash: Option<String>,
    full_name: Option<String>,
    phone: Option<String>,
    is_active: bool,
    role: String,
    telegram_id: Option<i64>,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    language_code: Option<String>,
    city_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            full_name: row.full_name,
            phone: row.phone,
            is_active: row.is_active,
            role: parse_column::<UserRole>("role", &row.role)?,
            telegram_id: row.telegram_id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            language_code: row.language_code,
            city_id: row.city_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
