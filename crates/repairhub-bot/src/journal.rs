use serde_json::json;

use repairhub_core::models::NewBotLog;
use repairhub_db::Database;

/// Records one handled request and the reply it produced.
/// Failures are logged, not propagated.
pub async fn record(db: &Database, telegram_user_id: i64, request: &str, reply: &str) {
    let entry = NewBotLog {
        telegram_user_id,
        request_text: request.to_string(),
        response_text: json!({ "text": reply }),
    };
    if let Err(e) = db.bot_log_repo().record(&entry).await {
        tracing::warn!(telegram_user_id, error = %e, "Failed to record bot log");
    }
}
