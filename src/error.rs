//! The `{success: false, message}` envelope and the catchers that emit it for
//! failures no handler produced itself: guard rejections, bad request bodies,
//! unknown routes.

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Catcher, Request, catch, catchers};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::auth::guards::GuardRejection;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid user data";

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

type CatcherResponse = status::Custom<Json<ErrorEnvelope>>;

pub fn catchers() -> Vec<Catcher> {
    catchers![bad_request, unprocessable, default_catcher]
}

/// Malformed JSON bodies.
#[catch(400)]
fn bad_request(request: &Request<'_>) -> CatcherResponse {
    log::debug!("bad request body on {}", request.uri().path());
    envelope(Status::BadRequest, INVALID_PAYLOAD_MESSAGE)
}

/// Rocket reports well-formed JSON of the wrong shape as 422; clients see 400.
#[catch(422)]
fn unprocessable(request: &Request<'_>) -> CatcherResponse {
    log::debug!("unprocessable body on {}", request.uri().path());
    envelope(Status::BadRequest, INVALID_PAYLOAD_MESSAGE)
}

#[catch(default)]
fn default_catcher(status: Status, request: &Request<'_>) -> CatcherResponse {
    if let GuardRejection(Some(message)) = request.local_cache(GuardRejection::default) {
        return envelope(status, message.clone());
    }

    let message = match status.code {
        401 => "Not authorized",
        404 => "Not found",
        code if code >= 500 => INTERNAL_ERROR_MESSAGE,
        _ => status.reason_lossy(),
    };
    if status.code >= 500 {
        log::error!("{} {} -> {}", request.method(), request.uri().path(), status.code);
    }
    envelope(status, message)
}

fn envelope(status: Status, message: impl Into<String>) -> CatcherResponse {
    status::Custom(status, Json(ErrorEnvelope::new(message)))
}
