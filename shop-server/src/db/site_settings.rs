//! Site settings (single JSONB row, id = 1)

use shared::models::SiteSettings;
use shared::util::now_millis;
use sqlx::PgPool;
use sqlx::types::Json;

use crate::core::ServiceResult;

/// Stored settings, or defaults when nothing has been saved yet
pub async fn get(pool: &PgPool) -> ServiceResult<SiteSettings> {
    let row: Option<(Json<SiteSettings>,)> =
        sqlx::query_as("SELECT data FROM site_settings WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(data,)| data.0).unwrap_or_default())
}

/// Replace the stored settings document
pub async fn upsert(pool: &PgPool, settings: &SiteSettings) -> ServiceResult<SiteSettings> {
    sqlx::query(
        "INSERT INTO site_settings (id, data, updated_at) VALUES (1, $1, $2) \
         ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data, updated_at = EXCLUDED.updated_at",
    )
    .bind(Json(settings))
    .bind(now_millis())
    .execute(pool)
    .await?;
    tracing::info!(store_name = %settings.store_name, "Site settings updated");
    Ok(settings.clone())
}
