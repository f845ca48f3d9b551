//! Taxonomie d'erreurs de l'API et mapping HTTP
//! Les détails internes sont loggés côté serveur, jamais exposés au client

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Paramètre manquant ou adresse malformée -> 400
    #[error("{0}")]
    InvalidArgument(String),

    /// Bank/pool/prix introuvable -> 404
    #[error("{0}")]
    NotFound(String),

    /// Service externe indisponible -> 500, message générique visible
    #[error("{0}")]
    Upstream(String),

    /// Exception inattendue -> 500 générique, détail loggé
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid(message: &str) -> Self {
        ApiError::InvalidArgument(message.to_string())
    }

    pub fn not_found(message: &str) -> Self {
        ApiError::NotFound(message.to_string())
    }

    pub fn upstream(message: &str) -> Self {
        ApiError::Upstream(message.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::InvalidArgument(m) | ApiError::NotFound(m) | ApiError::Upstream(m) => {
                m.clone()
            }
            ApiError::Internal(e) => {
                log::error!("❌ Erreur interne: {:#}", e);
                "Internal Server Error".to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::invalid("Invalid wallet address").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::not_found("Bank not found").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::upstream("Failed to fetch prices").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
