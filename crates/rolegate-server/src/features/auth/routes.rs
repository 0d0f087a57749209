//! Authentication routes
//!
//! - `POST /api/v1/login` - Exchange credentials for an access token

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use super::commands::{LoginCommand, LoginError};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::FeatureState;

pub fn auth_routes() -> Router<FeatureState> {
    Router::new().route("/login", post(login))
}

#[tracing::instrument(skip(state, command))]
async fn login(
    State(state): State<FeatureState>,
    Json(command): Json<LoginCommand>,
) -> Result<Response, LoginApiError> {
    let response =
        super::commands::login::handle(state.pool.clone(), &state.tokens, command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[derive(Debug)]
struct LoginApiError(LoginError);

impl From<LoginError> for LoginApiError {
    fn from(err: LoginError) -> Self {
        Self(err)
    }
}

impl IntoResponse for LoginApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            LoginError::MissingCredentials => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_ERROR", self.0.to_string()),
            ),
            LoginError::InvalidCredentials | LoginError::Disabled => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("UNAUTHORIZED", self.0.to_string()),
            ),
            LoginError::Token(_) | LoginError::Database(_) => {
                tracing::error!(error = %self.0, "Login failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "Login failed"),
                )
            },
        };
        (status, Json(error)).into_response()
    }
}
