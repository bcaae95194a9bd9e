use std::sync::Arc;

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use validator::Validate;

use crate::{
    dtos::{
        exchangedtos::{ExchangeRequestDto, ExchangeResultDto, TransactionHistoryDto},
        userdtos::FilterUserDto,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn exchange_handler() -> Router {
    Router::new()
        .route("/exchanges", post(request_exchange))
        .route("/transactions", get(get_transactions))
}

pub async fn request_exchange(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    WithRejection(Json(body), _): WithRejection<Json<ExchangeRequestDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let receipt = app_state
        .exchange_service
        .request_exchange(
            &auth.user,
            body.target_website_id,
            body.source_website_id,
            body.source_url.as_deref(),
        )
        .await?;

    let result = ExchangeResultDto {
        transaction: receipt.transaction,
        user: FilterUserDto::filter_user(&receipt.provider),
    };

    Ok(Json(json!({
        "status": "success",
        "data": result
    })))
}

/// The caller's exchanges, newest first.
pub async fn get_transactions(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let transactions = app_state.exchange_service.history(auth.user.id).await?;
    let history = TransactionHistoryDto::for_user_all(transactions, &auth.user);

    Ok(Json(json!({
        "status": "success",
        "results": history.len(),
        "data": history
    })))
}
