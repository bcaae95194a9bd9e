use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Extension, Json, Router};
use serde_json::json;

use crate::{
    db::snapshot::{SnapshotExt, SnapshotFile},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    service::error::ServiceError,
    AppState,
};

pub fn snapshot_handler() -> Router {
    Router::new().route("/snapshot", get(export_snapshot))
}

/// Whole-store dump under the `linkauthority_db` key.
pub async fn export_snapshot(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let snapshot = app_state
        .db_client
        .export_snapshot()
        .await
        .map_err(ServiceError::from)?;

    tracing::info!(user_id = %auth.user.id, "snapshot exported");
    let file = SnapshotFile {
        linkauthority_db: snapshot,
    };

    Ok(Json(json!({
        "status": "success",
        "data": file
    })))
}
