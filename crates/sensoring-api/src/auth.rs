//! Shared-password authorization
//!
//! Clients send `X-Api-Password`. Read routes accept the read or the write
//! password; write routes accept only the write password. A password that is
//! not configured never matches.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::config::Passwords;
use crate::error::ApiError;
use crate::state::AppState;

pub const PASSWORD_HEADER: &str = "x-api-password";

/// Access level a route requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Passwords {
    /// Whether `provided` grants the requested access
    pub fn allows(&self, provided: &str, access: Access) -> bool {
        let matches = |expected: &Option<String>| expected.as_deref() == Some(provided);

        match access {
            Access::Write => matches(&self.write),
            Access::Read => matches(&self.read) || matches(&self.write),
        }
    }
}

fn authorize(headers: &HeaderMap, passwords: &Passwords, access: Access) -> Result<(), ApiError> {
    let provided = headers
        .get(PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(ApiError::unauthorized)?;

    if passwords.allows(provided, access) {
        Ok(())
    } else {
        tracing::debug!(?access, "Rejected API password");
        Err(ApiError::unauthorized())
    }
}

pub async fn require_read(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(request.headers(), &state.passwords, Access::Read)?;
    Ok(next.run(request).await)
}

pub async fn require_write(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(request.headers(), &state.passwords, Access::Write)?;
    Ok(next.run(request).await)
}
