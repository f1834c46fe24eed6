use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;

use crate::auth::guards::AuthUser;
use crate::auth::responses::{
    AccountView, AuthResponse, LoginRequest, ProfileResponse, RegisterRequest,
};
use crate::auth::{AuthError, AuthState, Authenticated};
use crate::error::ErrorEnvelope;

type ErrorResponse = status::Custom<Json<ErrorEnvelope>>;
type AuthRouteResult<T> = Result<Json<T>, ErrorResponse>;

/// Create an account and return it with a bearer token.
#[openapi(tag = "Auth")]
#[post("/register", data = "<payload>")]
pub async fn register(
    state: &State<AuthState>,
    payload: Json<RegisterRequest>,
) -> Result<status::Custom<Json<AuthResponse>>, ErrorResponse> {
    let authenticated = state
        .service()
        .register(&payload)
        .await
        .map_err(respond_error)?;

    Ok(status::Custom(
        Status::Created,
        Json(auth_response(authenticated)),
    ))
}

/// Exchange email and password for a bearer token.
#[openapi(tag = "Auth")]
#[post("/login", data = "<payload>")]
pub async fn login(
    state: &State<AuthState>,
    payload: Json<LoginRequest>,
) -> AuthRouteResult<AuthResponse> {
    let authenticated = state
        .service()
        .login(&payload.email, &payload.password)
        .await
        .map_err(respond_error)?;

    Ok(Json(auth_response(authenticated)))
}

/// Current account, including creation and last-login timestamps.
///
/// The guard has already loaded the live account; no second lookup.
#[openapi(tag = "Auth")]
#[get("/profile")]
pub async fn profile(user: AuthUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        success: true,
        user: AccountView::profile(&user.account),
    })
}

fn auth_response(authenticated: Authenticated) -> AuthResponse {
    AuthResponse {
        success: true,
        user: AccountView::summary(&authenticated.account),
        token: authenticated.token.token,
    }
}

pub(crate) fn respond_error(err: AuthError) -> ErrorResponse {
    let status = err.status();
    let message = if err.is_server_error() {
        log::error!("auth request failed: {}", err);
        crate::error::INTERNAL_ERROR_MESSAGE.to_string()
    } else {
        log::debug!("auth request rejected ({}): {}", status.code, err);
        err.to_string()
    };
    status::Custom(status, Json(ErrorEnvelope::new(message)))
}
