use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::error::HttpError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Website {0} not found")]
    WebsiteNotFound(Uuid),

    #[error("You must add a site first!")]
    NoSourceWebsite,

    #[error("Website {website_id} does not belong to user {user_id}")]
    NotWebsiteOwner { website_id: Uuid, user_id: Uuid },

    #[error("You cannot exchange a link with your own site")]
    SelfExchange,

    #[error("Website {0} is not listed in the marketplace")]
    WebsiteNotListed(Uuid),

    #[error("Domain {0} is already registered")]
    DomainTaken(String),

    #[error("{0}")]
    VerificationFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::UserNotFound(_) | ServiceError::WebsiteNotFound(_) => {
                StatusCode::NOT_FOUND
            }

            ServiceError::NoSourceWebsite
            | ServiceError::SelfExchange
            | ServiceError::WebsiteNotListed(_)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::NotWebsiteOwner { .. } => StatusCode::FORBIDDEN,

            ServiceError::DomainTaken(_) => StatusCode::CONFLICT,

            ServiceError::VerificationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,

            ServiceError::Database(_) | ServiceError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Database(ref e) => {
                tracing::error!("database failure: {}", e);
                HttpError::server_error(crate::error::ErrorMessage::ServerError.to_string())
            }
            ServiceError::Other(ref e) => {
                tracing::error!("service failure: {}", e);
                HttpError::server_error(crate::error::ErrorMessage::ServerError.to_string())
            }
            _ => HttpError::new(error.to_string(), error.status_code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_failure_keeps_its_reason() {
        let http: HttpError = ServiceError::VerificationFailed("Link is nofollow".into()).into();
        assert_eq!(http.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(http.message, "Link is nofollow");
    }

    #[test]
    fn database_errors_are_not_leaked() {
        let http: HttpError = ServiceError::Database(sqlx::Error::RowNotFound).into();
        assert_eq!(http.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!http.message.contains("no rows"));
    }
}
