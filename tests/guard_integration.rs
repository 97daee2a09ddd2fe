//! End-to-end tests for the authorization guard: a request either reaches
//! the handler with a verified principal attached, or is rejected before
//! the handler runs.

use actix_web::body::{to_bytes, MessageBody};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App, HttpResponse};
use serde_json::Value;
use uuid::Uuid;

use skillbridge::auth::{issue_token, Claims, Role, TokenPurpose};
use skillbridge::configuration::JwtSettings;
use skillbridge::middleware::RoleGuard;

fn jwt_settings() -> JwtSettings {
    JwtSettings {
        access_secret: "access-secret-key-at-least-32-chars-long".to_string(),
        access_token_expiry: 3600,
        refresh_secret: "refresh-secret-key-at-least-32-chars-xx".to_string(),
        refresh_token_expiry: 604800,
        reset_secret: "reset-secret-key-at-least-32-chars-long".to_string(),
        reset_token_expiry: 600,
        issuer: "test".to_string(),
    }
}

/// Handler behind the guard: echoes the principal injected by the guard,
/// proving the request actually got through.
async fn protected(claims: web::ReqData<Claims>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "sub": claims.sub,
        "role": claims.role,
    }))
}

fn request(token: Option<&str>) -> actix_web::test::TestRequest {
    let mut req = test::TestRequest::get().uri("/admin-only");
    if let Some(token) = token {
        req = req.insert_header(("Authorization", format!("Bearer {}", token)));
    }
    req
}

/// Guard rejections travel as service errors until the HTTP dispatcher
/// turns them into responses, so both branches are folded here.
async fn into_status_json(
    result: Result<ServiceResponse<impl MessageBody + 'static>, actix_web::Error>,
) -> (StatusCode, Value) {
    match result {
        Ok(resp) => {
            let status = resp.status();
            let bytes = to_bytes(resp.into_body()).await.unwrap_or_default();
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        }
        Err(err) => {
            let resp = HttpResponse::from_error(err);
            let status = resp.status();
            let bytes = to_bytes(resp.into_body()).await.unwrap_or_default();
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        }
    }
}

#[actix_web::test]
async fn missing_token_is_rejected_with_401() {
    let app = test::init_service(
        App::new().service(
            web::resource("/admin-only")
                .wrap(RoleGuard::new(jwt_settings(), &[Role::Admin]))
                .route(web::get().to(protected)),
        ),
    )
    .await;

    let (status, body) = into_status_json(app.call(request(None).to_request()).await).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "MISSING_TOKEN");
}

#[actix_web::test]
async fn garbage_token_is_rejected_with_401() {
    let app = test::init_service(
        App::new().service(
            web::resource("/admin-only")
                .wrap(RoleGuard::new(jwt_settings(), &[Role::Admin]))
                .route(web::get().to(protected)),
        ),
    )
    .await;

    let (status, body) =
        into_status_json(app.call(request(Some("not.a.token")).to_request()).await).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "TOKEN_INVALID");
}

#[actix_web::test]
async fn expired_token_never_reaches_the_handler() {
    let mut config = jwt_settings();
    config.access_token_expiry = 0;
    let token = issue_token(&Uuid::new_v4(), Role::Admin, TokenPurpose::Access, &config)
        .expect("Failed to issue token");

    let app = test::init_service(
        App::new().service(
            web::resource("/admin-only")
                .wrap(RoleGuard::new(jwt_settings(), &[Role::Admin]))
                .route(web::get().to(protected)),
        ),
    )
    .await;

    let (status, body) =
        into_status_json(app.call(request(Some(&token)).to_request()).await).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "TOKEN_INVALID");
}

#[actix_web::test]
async fn refresh_token_is_not_accepted_as_access_token() {
    let config = jwt_settings();
    let token = issue_token(&Uuid::new_v4(), Role::Admin, TokenPurpose::Refresh, &config)
        .expect("Failed to issue token");

    let app = test::init_service(
        App::new().service(
            web::resource("/admin-only")
                .wrap(RoleGuard::new(jwt_settings(), &[Role::Admin]))
                .route(web::get().to(protected)),
        ),
    )
    .await;

    let (status, body) =
        into_status_json(app.call(request(Some(&token)).to_request()).await).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "TOKEN_INVALID");
}

#[actix_web::test]
async fn disallowed_role_is_rejected_with_403() {
    let config = jwt_settings();
    let token = issue_token(&Uuid::new_v4(), Role::Learner, TokenPurpose::Access, &config)
        .expect("Failed to issue token");

    let app = test::init_service(
        App::new().service(
            web::resource("/admin-only")
                .wrap(RoleGuard::new(jwt_settings(), &[Role::Admin]))
                .route(web::get().to(protected)),
        ),
    )
    .await;

    let (status, body) =
        into_status_json(app.call(request(Some(&token)).to_request()).await).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[actix_web::test]
async fn permitted_role_reaches_handler_with_principal_attached() {
    let config = jwt_settings();
    let user_id = Uuid::new_v4();
    let token = issue_token(&user_id, Role::Admin, TokenPurpose::Access, &config)
        .expect("Failed to issue token");

    let app = test::init_service(
        App::new().service(
            web::resource("/admin-only")
                .wrap(RoleGuard::new(jwt_settings(), &[Role::Admin]))
                .route(web::get().to(protected)),
        ),
    )
    .await;

    let (status, body) =
        into_status_json(app.call(request(Some(&token)).to_request()).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sub"], user_id.to_string());
    assert_eq!(body["role"], "ADMIN");
}

#[actix_web::test]
async fn any_authenticated_guard_accepts_every_role() {
    let config = jwt_settings();

    let app = test::init_service(
        App::new().service(
            web::resource("/admin-only")
                .wrap(RoleGuard::any_authenticated(jwt_settings()))
                .route(web::get().to(protected)),
        ),
    )
    .await;

    for role in [
        Role::Admin,
        Role::Vendor,
        Role::Teacher,
        Role::Learner,
        Role::User,
    ] {
        let token = issue_token(&Uuid::new_v4(), role, TokenPurpose::Access, &config)
            .expect("Failed to issue token");
        let (status, _) =
            into_status_json(app.call(request(Some(&token)).to_request()).await).await;
        assert_eq!(status, StatusCode::OK, "role {} should be accepted", role);
    }
}
