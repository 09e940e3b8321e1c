use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};

use repairhub_core::error::AppError;
use repairhub_core::models::{BotLog, NewBotLog};

use crate::sql::db_error;

/// Append-only log of bot requests and the replies they produced.
#[derive(Clone)]
pub struct BotLogRepository {
    pool: Pool<Postgres>,
}

impl BotLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, entry: &NewBotLog) -> Result<BotLog, AppError> {
        let row = sqlx::query_as::<_, BotLogRow>(
            r#"
            INSERT INTO bot_logs (telegram_user_id, request_text, response_text)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(entry.telegram_user_id)
        .bind(&entry.request_text)
        .bind(&entry.response_text)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    /// Most recent entries for a Telegram user, newest first.
    pub async fn recent_for_user(
        &self,
        telegram_user_id: i64,
        limit: i64,
    ) -> Result<Vec<BotLog>, AppError> {
        let rows = sqlx::query_as::<_, BotLogRow>(
            r#"
            SELECT * FROM bot_logs
            WHERE telegram_user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(telegram_user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct BotLogRow {
    id: i64,
    telegram_user_id: i64,
    request_text: String,
    response_text: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<BotLogRow> for BotLog {
    fn from(row: BotLogRow) -> Self {
        BotLog {
            id: row.id,
            telegram_user_id: row.telegram_user_id,
            request_text: row.request_text,
            response_text: row.response_text,
            created_at: row.created_at,
        }
    }
}
