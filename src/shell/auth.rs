// Principal extraction. The real deployment puts an authenticating proxy in
// front of this service; it asserts the caller in `x-user-id` and
// `x-user-role` headers. A request without a valid assertion is a 401; a
// non-admin principal on an admin route is a 403. Role gating lives here at
// the edge, never inside the engines.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::application::errors::ApiError;
use crate::shell::envelope::ApiFailure;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn require_admin(&self) -> Result<(), ApiFailure> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiFailure(ApiError::forbidden("admin access required")))
        }
    }
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiFailure;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or(ApiFailure(ApiError::Unauthorized))?;

        let role = match parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            None | Some("user") => Role::User,
            Some("admin") => Role::Admin,
            Some(_) => return Err(ApiFailure(ApiError::Unauthorized)),
        };

        Ok(Self { user_id, role })
    }
}

#[cfg(test)]
mod auth_tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<Principal, ApiFailure> {
        let (mut parts, _) = req.into_parts();
        Principal::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn it_should_reject_a_missing_or_malformed_principal() {
        let req = Request::builder().body(()).unwrap();
        assert!(extract(req).await.is_err());

        let req = Request::builder()
            .header(USER_ID_HEADER, "not-a-uuid")
            .body(())
            .unwrap();
        assert!(extract(req).await.is_err());
    }

    #[tokio::test]
    async fn it_should_default_the_role_to_user() {
        let req = Request::builder()
            .header(USER_ID_HEADER, Uuid::now_v7().to_string())
            .body(())
            .unwrap();
        let principal = extract(req).await.unwrap();
        assert_eq!(principal.role, Role::User);
        assert!(principal.require_admin().is_err());
    }

    #[tokio::test]
    async fn it_should_accept_an_admin_assertion() {
        let req = Request::builder()
            .header(USER_ID_HEADER, Uuid::now_v7().to_string())
            .header(USER_ROLE_HEADER, "admin")
            .body(())
            .unwrap();
        let principal = extract(req).await.unwrap();
        assert!(principal.require_admin().is_ok());
    }
}
