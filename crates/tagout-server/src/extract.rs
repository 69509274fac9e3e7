//! Acting user from request headers, and JSON bodies with API errors.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use tagout_core::identity::{Actor, Role, UserRef};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The [`Actor`] an upstream gateway resolved for this request.
///
/// `x-user-id` is required; `x-user-role` defaults to operator.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
        .map_err(|_| ApiError::Unauthorized(format!("unknown role {raw:?}")))
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;
        let id: Uuid = id
            .parse()
            .map_err(|_| ApiError::Unauthorized(format!("{USER_ID_HEADER} is not a uuid")))?;
        let name = header(parts, USER_NAME_HEADER).unwrap_or("unknown");
        let role = header(parts, USER_ROLE_HEADER).map(parse_role).transpose()?.unwrap_or_default();
        Ok(CurrentActor(Actor::new(UserRef::new(id, name), role)))
    }
}

/// [`Json`] whose rejection is reported as an [`ApiError`].
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}
