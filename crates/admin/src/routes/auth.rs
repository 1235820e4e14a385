//! Operator login and logout.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::{RequireAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::auth::authenticate;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Log in with the operator email and password.
#[instrument(skip(state, session, request))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<CurrentAdmin>> {
    let credentials = &state.config().credentials;
    if let Err(e) = authenticate(credentials, &request.email, &request.password) {
        tracing::warn!(error = %e, "Failed admin login attempt");
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let admin = CurrentAdmin::new(credentials.email.clone());
    set_current_admin(&session, &admin).await?;

    tracing::info!(email = %admin.email, "Admin logged in");
    Ok(Json(admin))
}

/// End the session. Succeeds whether or not anyone was logged in.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in operator.
pub async fn me(RequireAdminAuth(admin): RequireAdminAuth) -> Json<CurrentAdmin> {
    Json(admin)
}
