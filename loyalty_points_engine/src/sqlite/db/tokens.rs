//! Bearer token storage. Each user holds at most one token at a time.
use sqlx::SqliteConnection;

use super::SQL_NOW;

/// Stores `token` for the user, replacing any token they held before.
pub async fn upsert_token(user_id: i64, token: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let q = format!(
        "INSERT INTO tokens (user_id, token) VALUES ($1, $2) ON CONFLICT(user_id) DO UPDATE SET token = \
         excluded.token, created_at = {SQL_NOW}"
    );
    sqlx::query(&q).bind(user_id).bind(token).execute(conn).await?;
    Ok(())
}

pub async fn user_id_for_token(token: &str, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let id = sqlx::query_scalar("SELECT user_id FROM tokens WHERE token = $1").bind(token).fetch_optional(conn).await?;
    Ok(id)
}
