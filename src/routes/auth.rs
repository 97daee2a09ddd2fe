/// Authentication Routes
///
/// Signup, vendor signup, signin, token refresh, and the password lifecycle
/// (change, forgot, reset).

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{
    hash_password, issue_token, verify_password, verify_token, Claims, Role, TokenPurpose,
    UserStatus,
};
use crate::configuration::{EmailSettings, JwtSettings};
use crate::email_client::EmailClient;
use crate::error::{AppError, AuthError, DatabaseError, ErrorContext};
use crate::validators::{is_valid_email, is_valid_name};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct VendorSignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub shop_name: String,
    pub shop_description: String,
    pub logo_url: Option<String>,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Token pair returned on successful signin.
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Single fresh access token returned by the refresh endpoint.
#[derive(Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Credential record as exposed to callers. The password hash never leaves
/// the handler layer.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct ShopResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub logo_url: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct VendorSignupResponse {
    pub user: UserResponse,
    pub shop: ShopResponse,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/auth/signup
///
/// Register a regular account. The role is always forced to USER; elevated
/// accounts go through the vendor signup flow.
///
/// # Errors
/// - 400: invalid email/name/password
/// - 409: email already registered
pub async fn signup(
    form: web::Json<SignupRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_signup");

    let email = is_valid_email(&form.email)?;
    let name = is_valid_name(&form.name)?;
    let password_hash = hash_password(&form.password)?;

    let user_id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, status, is_deleted, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(user_id)
    .bind(&name)
    .bind(&email)
    .bind(&password_hash)
    .bind(Role::User.as_str())
    .bind(UserStatus::Active.as_str())
    .bind(false)
    .bind(now)
    .bind(now)
    .execute(pool.get_ref())
    .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "User signed up"
    );

    Ok(HttpResponse::Created().json(UserResponse {
        id: user_id.to_string(),
        name,
        email,
        role: Role::User,
        status: UserStatus::Active,
        created_at: now.to_rfc3339(),
    }))
}

/// POST /api/auth/vendor-signup
///
/// Register a vendor account together with its vendor profile and shop.
/// The three inserts run in one transaction: if any step fails, nothing is
/// left behind.
///
/// # Errors
/// - 400: invalid input
/// - 409: email already registered
pub async fn vendor_signup(
    form: web::Json<VendorSignupRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("vendor_signup");

    let email = is_valid_email(&form.email)?;
    let name = is_valid_name(&form.name)?;
    let shop_name = is_valid_name(&form.shop_name)?;
    let password_hash = hash_password(&form.password)?;
    let logo_url = form.logo_url.clone().unwrap_or_default();

    let user_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();
    let shop_id = Uuid::new_v4();
    let now = Utc::now();

    // All-or-nothing unit: an early return drops the transaction and rolls
    // every insert back.
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, status, is_deleted, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(user_id)
    .bind(&name)
    .bind(&email)
    .bind(&password_hash)
    .bind(Role::Vendor.as_str())
    .bind(UserStatus::Active.as_str())
    .bind(false)
    .bind(now)
    .bind(now)
    .execute(&mut tx)
    .await?;

    sqlx::query("INSERT INTO vendors (id, user_id) VALUES ($1, $2)")
        .bind(vendor_id)
        .bind(user_id)
        .execute(&mut tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO shops (id, vendor_id, name, description, logo_url, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(shop_id)
    .bind(vendor_id)
    .bind(&shop_name)
    .bind(&form.shop_description)
    .bind(&logo_url)
    .bind("ACTIVE")
    .bind(now)
    .execute(&mut tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        shop_id = %shop_id,
        "Vendor signed up"
    );

    Ok(HttpResponse::Created().json(VendorSignupResponse {
        user: UserResponse {
            id: user_id.to_string(),
            name,
            email,
            role: Role::Vendor,
            status: UserStatus::Active,
            created_at: now.to_rfc3339(),
        },
        shop: ShopResponse {
            id: shop_id.to_string(),
            name: shop_name,
            description: form.shop_description.clone(),
            logo_url,
            status: "ACTIVE".to_string(),
        },
    }))
}

/// POST /api/auth/signin
///
/// Authenticate with email and password; returns an access/refresh token
/// pair.
///
/// # Security Notes
/// Unknown email, suspended account, deleted account, and wrong password
/// all produce the same 401 so the endpoint cannot be used to enumerate
/// accounts. The distinct cause is logged internally.
pub async fn signin(
    form: web::Json<SigninRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_signin");

    let email = is_valid_email(&form.email)?;

    let user = sqlx::query_as::<_, (Uuid, String, String, String, bool)>(
        "SELECT id, password_hash, role, status, is_deleted FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await?;

    let (user_id, password_hash, role, status, is_deleted) = user.ok_or_else(|| {
        tracing::warn!(request_id = %context.request_id, "Signin attempt for unknown email");
        AppError::Auth(AuthError::InvalidCredentials)
    })?;

    let role = Role::parse(&role)?;

    if UserStatus::parse(&status)? == UserStatus::Suspended {
        tracing::warn!(
            request_id = %context.request_id,
            user_id = %user_id,
            "Signin attempt for suspended account"
        );
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    if is_deleted {
        tracing::warn!(
            request_id = %context.request_id,
            user_id = %user_id,
            "Signin attempt for deleted account"
        );
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    if !verify_password(&form.password, &password_hash)? {
        tracing::warn!(
            request_id = %context.request_id,
            user_id = %user_id,
            "Signin attempt with wrong password"
        );
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let access_token = issue_token(&user_id, role, TokenPurpose::Access, jwt_config.get_ref())?;
    let refresh_token = issue_token(&user_id, role, TokenPurpose::Refresh, jwt_config.get_ref())?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "User signed in"
    );

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_config.access_token_expiry,
    }))
}

/// POST /api/auth/refresh-token
///
/// Exchange a refresh token for a fresh access token. A token of any other
/// purpose is rejected as invalid, and the subject must still be an active,
/// non-deleted account.
///
/// # Errors
/// - 401: invalid/expired/wrong-purpose token, or subject no longer usable
pub async fn refresh_token(
    form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let claims = verify_token(
        &form.refresh_token,
        TokenPurpose::Refresh,
        jwt_config.get_ref(),
    )?;
    let user_id = claims.user_id()?;

    let user = sqlx::query_as::<_, (String, String, bool)>(
        "SELECT role, status, is_deleted FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool.get_ref())
    .await?;

    let (role, status, is_deleted) = user.ok_or_else(|| {
        tracing::warn!(
            request_id = %context.request_id,
            user_id = %user_id,
            "Refresh attempt for missing subject"
        );
        AppError::Auth(AuthError::InvalidCredentials)
    })?;

    let role = Role::parse(&role)?;

    if UserStatus::parse(&status)? == UserStatus::Suspended || is_deleted {
        tracing::warn!(
            request_id = %context.request_id,
            user_id = %user_id,
            "Refresh attempt for unusable account"
        );
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let access_token = issue_token(&user_id, role, TokenPurpose::Access, jwt_config.get_ref())?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "Access token refreshed"
    );

    Ok(HttpResponse::Ok().json(AccessTokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_config.access_token_expiry,
    }))
}

/// POST /api/auth/change-password
///
/// Change the authenticated principal's password.
///
/// # Errors
/// - 401: missing/invalid token (guard) or wrong old password
/// - 404: subject no longer exists
pub async fn change_password(
    claims: web::ReqData<Claims>,
    form: web::Json<ChangePasswordRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("change_password");
    let user_id = claims.user_id()?;

    let password_hash =
        sqlx::query_as::<_, (String,)>("SELECT password_hash FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool.get_ref())
            .await?
            .ok_or_else(|| {
                AppError::Database(DatabaseError::NotFound("User not found".to_string()))
            })?
            .0;

    if !verify_password(&form.old_password, &password_hash)? {
        tracing::warn!(
            request_id = %context.request_id,
            user_id = %user_id,
            "Password change with wrong old password"
        );
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let new_hash = hash_password(&form.new_password)?;

    sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
        .bind(&new_hash)
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool.get_ref())
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "Password changed"
    );

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Password changed successfully!".to_string(),
    }))
}

/// POST /api/auth/forget-password
///
/// Request a password-reset link. Always answers 200: a malformed or unknown
/// email is logged but not revealed to the caller. A delivery failure is
/// logged and does not fail the request.
pub async fn forgot_password(
    form: web::Json<ForgotPasswordRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
    email_settings: web::Data<EmailSettings>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("forgot_password");

    match is_valid_email(&form.email) {
        Err(e) => {
            tracing::warn!(
                request_id = %context.request_id,
                error = %e,
                "Password reset requested with malformed email"
            );
        }
        Ok(email) => {
            let user = sqlx::query_as::<_, (Uuid, String)>(
                "SELECT id, role FROM users WHERE email = $1 AND is_deleted = false",
            )
            .bind(&email)
            .fetch_optional(pool.get_ref())
            .await?;

            match user {
                None => {
                    tracing::warn!(
                        request_id = %context.request_id,
                        "Password reset requested for unknown email"
                    );
                }
                Some((user_id, role)) => {
                    let role = Role::parse(&role)?;
                    let reset_token =
                        issue_token(&user_id, role, TokenPurpose::Reset, jwt_config.get_ref())?;
                    let reset_link =
                        format!("{}?token={}", email_settings.reset_link_base, reset_token);
                    let html = format!(
                        "<p>Dear User,</p>\
                         <p>Click the link below to reset your password:</p>\
                         <a href=\"{}\">Reset Password</a>",
                        reset_link
                    );

                    if let Err(e) = email_client
                        .send_email(&email, "Reset your password", &html)
                        .await
                    {
                        tracing::error!(
                            request_id = %context.request_id,
                            user_id = %user_id,
                            error = %e,
                            "Failed to send password reset email"
                        );
                    } else {
                        tracing::info!(
                            request_id = %context.request_id,
                            user_id = %user_id,
                            "Password reset email sent"
                        );
                    }
                }
            }
        }
    }

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "If the account exists, a reset link has been sent.".to_string(),
    }))
}

/// POST /api/auth/reset-password
///
/// Set a new password using a reset-purpose token.
///
/// # Errors
/// - 401: invalid/expired/wrong-purpose token
/// - 404: subject no longer exists
pub async fn reset_password(
    form: web::Json<ResetPasswordRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("reset_password");

    let claims = verify_token(&form.token, TokenPurpose::Reset, jwt_config.get_ref())?;
    let user_id = claims.user_id()?;

    let new_hash = hash_password(&form.password)?;

    let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
        .bind(&new_hash)
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Database(DatabaseError::NotFound(
            "User not found".to_string(),
        )));
    }

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "Password reset"
    );

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Password reset successful!".to_string(),
    }))
}
