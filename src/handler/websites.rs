use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use validator::Validate;

use crate::{
    db::websitedb::WebsiteExt,
    dtos::{
        userdtos::FilterUserDto,
        websitedtos::{MarketplaceDto, RegisterWebsiteDto, WebsiteRegisteredDto},
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    service::error::ServiceError,
    AppState,
};

pub fn websites_handler() -> Router {
    Router::new()
        .route("/", post(register_website))
        .route("/mine", get(get_dashboard))
}

pub fn marketplace_handler() -> Router {
    Router::new().route("/marketplace", get(get_marketplace))
}

pub async fn register_website(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    WithRejection(Json(body), _): WithRejection<Json<RegisterWebsiteDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (website, analysis) = app_state
        .website_service
        .register_site(&auth.user, &body.domain, body.description.as_deref())
        .await?;

    let registered = WebsiteRegisteredDto { website, analysis };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": registered
        })),
    ))
}

pub async fn get_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let dashboard = app_state.website_service.dashboard(auth.user).await?;

    Ok(Json(json!({
        "status": "success",
        "data": {
            "user": FilterUserDto::filter_user(&dashboard.user),
            "sites": dashboard.sites,
            "stats": dashboard.stats
        }
    })))
}

/// Other users' sites whose owners can still pay for a link.
pub async fn get_marketplace(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let listings = app_state
        .db_client
        .get_marketplace_listings(auth.user.id)
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(json!({
        "status": "success",
        "data": MarketplaceDto::new(listings, auth.user.points)
    })))
}
