use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use db::models::user::User;
use deployment::Deployment;
use services::services::identity::IdentityError;

use crate::{DeploymentImpl, error::ApiError};

/// The authenticated user behind the current request.
#[derive(Debug, Clone)]
pub struct Caller(pub User);

/// A caller whose role is admin. Rejects with 403 otherwise.
#[derive(Debug, Clone)]
pub struct AdminCaller(pub User);

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn extract_request_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
        .map(str::to_string)
}

pub async fn require_api_auth(
    State(deployment): State<DeploymentImpl>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_request_token(&req) else {
        tracing::warn!(
            path = %req.uri().path(),
            method = %req.method(),
            reason = "missing_token",
            "Unauthorized API request"
        );
        return ApiError::Unauthorized.into_response();
    };

    let path = req.uri().path().to_string();
    let user = match deployment
        .identity()
        .resolve_caller(&deployment.db().pool, &token)
        .await
    {
        Ok(user) => user,
        Err(IdentityError::InvalidToken) => {
            tracing::warn!(
                path = %path,
                method = %req.method(),
                reason = "invalid_token",
                "Unauthorized API request"
            );
            return ApiError::Identity(IdentityError::InvalidToken).into_response();
        }
        Err(err) => return ApiError::from(err).into_response(),
    };

    req.extensions_mut().insert(Caller(user));
    next.run(req).await
}

/// Route layer for admin-only subtrees. Runs before model loaders so a
/// non-admin never learns whether an id exists.
pub async fn require_admin(_admin: AdminCaller, req: Request, next: Next) -> Response {
    next.run(req).await
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for AdminCaller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Caller(user) = Caller::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(
                user_id = %user.id,
                path = %parts.uri.path(),
                "Admin-only request rejected"
            );
            return Err(ApiError::Forbidden("Not enough permissions".to_string()));
        }
        Ok(AdminCaller(user))
    }
}

#[cfg(test)]
mod tests {
    use super::parse_authorization_bearer;

    #[test]
    fn bearer_prefix_is_case_insensitive() {
        assert_eq!(parse_authorization_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_authorization_bearer("bearer  abc "), Some("abc"));
        assert_eq!(parse_authorization_bearer("Basic abc"), None);
        assert_eq!(parse_authorization_bearer("Bearer "), None);
        assert_eq!(parse_authorization_bearer("abc"), None);
    }
}
