//! Site settings handlers

use axum::{Json, extract::State};
use shared::models::SiteSettings;

use crate::api::{ApiResult, ok};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::site_settings;
use crate::utils::AppError;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, validate_amount,
    validate_email, validate_optional_amount, validate_optional_text, validate_required_text,
    validate_tax_rate,
};

/// Hero banners on the homepage
const MAX_HERO_BANNERS: usize = 10;

fn validate_settings(settings: &SiteSettings) -> Result<(), AppError> {
    validate_required_text(&settings.store_name, "store_name", MAX_NAME_LEN)?;
    validate_required_text(&settings.currency, "currency", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&settings.logo, "logo", MAX_URL_LEN)?;
    if let Some(email) = settings.contact_email.as_deref()
        && !email.trim().is_empty()
    {
        validate_email(email.trim())?;
    }
    validate_optional_text(&settings.contact_phone, "contact_phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&settings.address, "address", MAX_ADDRESS_LEN)?;
    validate_optional_text(&settings.footer_text, "footer_text", MAX_NOTE_LEN)?;
    validate_amount(settings.shipping_fee, "shipping_fee")?;
    validate_optional_amount(settings.free_shipping_threshold, "free_shipping_threshold")?;
    validate_tax_rate(settings.tax_rate)?;

    if settings.hero_banners.len() > MAX_HERO_BANNERS {
        return Err(AppError::invalid_field(
            "hero_banners",
            format!("At most {MAX_HERO_BANNERS} hero banners"),
        ));
    }
    for banner in &settings.hero_banners {
        validate_required_text(&banner.image, "hero_banners.image", MAX_URL_LEN)?;
        validate_optional_text(&banner.link, "hero_banners.link", MAX_URL_LEN)?;
    }
    for (network, url) in &settings.social_links {
        validate_required_text(network, "social_links", MAX_SHORT_TEXT_LEN)?;
        validate_required_text(url, "social_links", MAX_URL_LEN)?;
    }
    Ok(())
}

/// GET /api/site-settings
pub async fn get(State(state): State<ServerState>) -> ApiResult<SiteSettings> {
    ok(site_settings::get(&state.pool).await?)
}

/// PUT /api/site-settings - 整体替换，缺省字段取默认值
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<SiteSettings>,
) -> ApiResult<SiteSettings> {
    validate_settings(&payload)?;
    let settings = site_settings::upsert(&state.pool, &payload).await?;
    tracing::info!(user_id = user.id, "Site settings updated");
    ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_settings() {
        assert!(validate_settings(&SiteSettings::default()).is_ok());

        let s = SiteSettings {
            tax_rate: 101.0,
            ..Default::default()
        };
        assert!(validate_settings(&s).is_err());

        let s = SiteSettings {
            store_name: " ".into(),
            ..Default::default()
        };
        assert!(validate_settings(&s).is_err());

        let s = SiteSettings {
            shipping_fee: -5.0,
            ..Default::default()
        };
        assert!(validate_settings(&s).is_err());
    }
}
