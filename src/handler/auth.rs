use std::sync::Arc;

use axum::{response::IntoResponse, routing::post, Extension, Json, Router};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar},
    WithRejection,
};
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    dtos::userdtos::{FilterUserDto, GoogleLoginDto, Response, UserData, UserLoginResponseDto},
    error::{ErrorMessage, HttpError},
    models::usermodel::User,
    service::error::ServiceError,
    utils::token,
    AppState,
};

pub const DEMO_USER_NAME: &str = "Demo User";
pub const DEMO_USER_EMAIL: &str = "demo@linkauthority.app";

pub fn auth_handler() -> Router {
    Router::new()
        .route("/google", post(google_login))
        .route("/demo", post(demo_login))
        .route("/logout", post(logout))
}

pub async fn google_login(
    Extension(app_state): Extension<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(body), _): WithRejection<Json<GoogleLoginDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let google_auth = app_state.google_auth.as_ref().ok_or_else(|| {
        HttpError::unavailable(ErrorMessage::GoogleLoginUnavailable.to_string())
    })?;

    let user_info = google_auth
        .validate_id_token(&body.credential)
        .await
        .map_err(|e| {
            tracing::warn!("google sign-in rejected: {}", e);
            HttpError::unauthorized(ErrorMessage::LoginFailed.to_string())
        })?;

    let user = app_state
        .db_client
        .find_or_create_user(&user_info.name, &user_info.email, user_info.picture.as_deref())
        .await
        .map_err(ServiceError::from)?;

    tracing::info!(user_id = %user.id, "google sign-in");
    issue_session(&app_state, jar, &user)
}

/// Signs in as the shared demo account without any external call.
pub async fn demo_login(
    Extension(app_state): Extension<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .find_or_create_user(DEMO_USER_NAME, DEMO_USER_EMAIL, None)
        .await
        .map_err(ServiceError::from)?;

    tracing::info!(user_id = %user.id, "demo sign-in");
    issue_session(&app_state, jar, &user)
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build("token").path("/"));

    (
        jar,
        Json(Response {
            status: "success",
            message: "Logged out".to_string(),
        }),
    )
}

fn issue_session(
    app_state: &AppState,
    jar: CookieJar,
    user: &User,
) -> Result<(CookieJar, Json<UserLoginResponseDto>), HttpError> {
    let token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| {
        tracing::error!("failed to sign session token: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let cookie_duration = time::Duration::minutes(app_state.env.jwt_maxage);
    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(cookie_duration)
        .http_only(true)
        .build();

    Ok((
        jar.add(cookie),
        Json(UserLoginResponseDto {
            status: "success".to_string(),
            token,
            data: UserData {
                user: FilterUserDto::filter_user(user),
            },
        }),
    ))
}
