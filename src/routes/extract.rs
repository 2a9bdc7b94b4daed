use crate::constants::{DEVICE_LOCATION_HEADER, SESSION_ID_HEADER};
use crate::error::AppError;
use crate::models::Waypoint;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Device position from the `x-device-location: <lat>,<lng>` header.
/// Absent means the client has no location fix; a malformed value is a
/// bad request.
#[derive(Debug, Clone, Copy)]
pub struct DeviceLocation(pub Option<Waypoint>);

impl DeviceLocation {
    /// The position, or `LocationUnavailable` naming what needed it
    pub fn require(&self, purpose: &str) -> Result<Waypoint, AppError> {
        self.0.ok_or_else(|| {
            AppError::LocationUnavailable(format!("Device location is required to {}", purpose))
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for DeviceLocation {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(DEVICE_LOCATION_HEADER) else {
            return Ok(DeviceLocation(None));
        };
        let raw = value.to_str().map_err(|_| {
            AppError::InvalidRequest(format!("{} must be ASCII", DEVICE_LOCATION_HEADER))
        })?;
        if raw.trim().is_empty() {
            return Ok(DeviceLocation(None));
        }
        raw.parse::<Waypoint>()
            .map(|w| DeviceLocation(Some(w)))
            .map_err(AppError::InvalidRequest)
    }
}

/// Planning session id from the `x-session-id` header, if any
#[derive(Debug, Clone)]
pub struct SessionId(pub Option<String>);

impl SessionId {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Ok(SessionId(id))
    }
}
