/// Role-based authorization middleware.
///
/// Gates a route behind a verified access token plus a statically declared
/// allow-list of roles. On success the verified claims become the request's
/// principal, available to handlers through `web::ReqData<Claims>`. The
/// guard holds no cross-request state.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{verify_token, Role, TokenPurpose};
use crate::configuration::JwtSettings;
use crate::error::{AuthError, ErrorResponse};

/// Guard for protected routes.
///
/// An empty allow-list admits any authenticated role; a non-empty one
/// rejects every role outside it with 403.
pub struct RoleGuard {
    jwt_config: JwtSettings,
    allowed: Vec<Role>,
}

impl RoleGuard {
    pub fn new(jwt_config: JwtSettings, allowed: &[Role]) -> Self {
        Self {
            jwt_config,
            allowed: allowed.to_vec(),
        }
    }

    /// Require a valid access token but accept any role.
    pub fn any_authenticated(jwt_config: JwtSettings) -> Self {
        Self {
            jwt_config,
            allowed: Vec::new(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RoleGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RoleGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RoleGuardService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
            allowed: Rc::new(self.allowed.clone()),
        }))
    }
}

pub struct RoleGuardService<S> {
    service: Rc<S>,
    jwt_config: JwtSettings,
    allowed: Rc<Vec<Role>>,
}

fn rejection(status_response: HttpResponse, cause: &'static str) -> Error {
    actix_web::error::InternalError::from_response(cause, status_response).into()
}

impl<S, B> Service<ServiceRequest> for RoleGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string);

        let token = match bearer {
            Some(token) => token,
            None => {
                tracing::warn!(path = %req.path(), "Missing or invalid Authorization header");
                let response = HttpResponse::Unauthorized().json(ErrorResponse::new(
                    AuthError::MissingToken.to_string(),
                    "MISSING_TOKEN".to_string(),
                ));
                return Box::pin(async move { Err(rejection(response, "Unauthorized")) });
            }
        };

        let claims = match verify_token(&token, TokenPurpose::Access, &self.jwt_config) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!(path = %req.path(), "Access token rejected: {}", e);
                let response = HttpResponse::Unauthorized().json(ErrorResponse::new(
                    AuthError::TokenInvalid.to_string(),
                    "TOKEN_INVALID".to_string(),
                ));
                return Box::pin(async move { Err(rejection(response, "Unauthorized")) });
            }
        };

        if !self.allowed.is_empty() && !self.allowed.contains(&claims.role) {
            tracing::warn!(
                path = %req.path(),
                user_id = %claims.sub,
                role = %claims.role,
                "Role not permitted for this route"
            );
            let response = HttpResponse::Forbidden().json(ErrorResponse::new(
                AuthError::RoleNotAllowed.to_string(),
                "FORBIDDEN".to_string(),
            ));
            return Box::pin(async move { Err(rejection(response, "Forbidden")) });
        }

        tracing::debug!(
            user_id = %claims.sub,
            role = %claims.role,
            "Access token validated"
        );
        req.extensions_mut().insert(claims);

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}
