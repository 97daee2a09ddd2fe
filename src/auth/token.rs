/// Token issuance and verification.
///
/// Three token purposes (access, refresh, password reset) sign with
/// independent secrets and lifetimes from `JwtSettings`. A token is valid
/// exactly when its signature and expiry check out; there is no server-side
/// session state or revocation list.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, TokenPurpose};
use crate::auth::Role;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Issue a signed token for the given subject, role, and purpose.
///
/// # Errors
/// Fails only if signing itself fails, which indicates broken configuration
/// rather than a recoverable request error.
pub fn issue_token(
    user_id: &Uuid,
    role: Role,
    purpose: TokenPurpose,
    config: &JwtSettings,
) -> Result<String, AppError> {
    let claims = Claims::new(
        *user_id,
        role,
        purpose,
        config.expiry_for(purpose),
        config.issuer.clone(),
    );

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret_for(purpose).as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Verify a token against one expected purpose and return its claims.
///
/// Signature mismatch, malformed input, wrong purpose, wrong issuer, and
/// expiry all collapse into the same invalid-token failure so a caller
/// probing tokens learns nothing about which check failed.
pub fn verify_token(
    token: &str,
    purpose: TokenPurpose,
    config: &JwtSettings,
) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.leeway = 0;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret_for(purpose).as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("Token validation error: {}", e);
        AppError::Auth(AuthError::TokenInvalid)
    })?;

    // The purpose claim is checked on top of the secret split: even if two
    // purposes were ever configured with the same secret, a token still only
    // works for the purpose it was issued with.
    if claims.purpose != purpose {
        tracing::warn!(
            expected = ?purpose,
            presented = ?claims.purpose,
            "Token presented for wrong purpose"
        );
        return Err(AppError::Auth(AuthError::TokenInvalid));
    }

    if claims.is_expired() {
        tracing::warn!("Expired token presented");
        return Err(AppError::Auth(AuthError::TokenInvalid));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_config() -> JwtSettings {
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

    #[test]
    fn test_issue_and_verify_each_purpose() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        for purpose in [TokenPurpose::Access, TokenPurpose::Refresh, TokenPurpose::Reset] {
            let token = issue_token(&user_id, Role::Teacher, purpose, &config)
                .expect("Failed to issue token");
            let claims = verify_token(&token, purpose, &config).expect("Failed to verify token");

            assert_eq!(claims.sub, user_id.to_string());
            assert_eq!(claims.role, Role::Teacher);
            assert_eq!(claims.purpose, purpose);
            assert_eq!(claims.iss, "test");
        }
    }

    #[test]
    fn test_wrong_purpose_rejected() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        let refresh = issue_token(&user_id, Role::User, TokenPurpose::Refresh, &config).unwrap();
        assert!(verify_token(&refresh, TokenPurpose::Access, &config).is_err());
        assert!(verify_token(&refresh, TokenPurpose::Reset, &config).is_err());

        let access = issue_token(&user_id, Role::User, TokenPurpose::Access, &config).unwrap();
        assert!(verify_token(&access, TokenPurpose::Refresh, &config).is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let config = get_test_config();
        assert!(verify_token("not.a.token", TokenPurpose::Access, &config).is_err());
        assert!(verify_token("", TokenPurpose::Access, &config).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let config = get_test_config();
        let token =
            issue_token(&Uuid::new_v4(), Role::Admin, TokenPurpose::Access, &config).unwrap();

        let tampered = format!("{}X", token);
        assert!(verify_token(&tampered, TokenPurpose::Access, &config).is_err());
    }

    #[test]
    fn test_zero_ttl_token_rejected() {
        let mut config = get_test_config();
        config.access_token_expiry = 0;

        let token =
            issue_token(&Uuid::new_v4(), Role::User, TokenPurpose::Access, &config).unwrap();
        assert!(verify_token(&token, TokenPurpose::Access, &config).is_err());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let mut config = get_test_config();
        let token =
            issue_token(&Uuid::new_v4(), Role::User, TokenPurpose::Access, &config).unwrap();

        config.issuer = "someone-else".to_string();
        assert!(verify_token(&token, TokenPurpose::Access, &config).is_err());
    }

    #[test]
    fn test_failure_is_uniform_across_causes() {
        let config = get_test_config();
        let expired = {
            let mut c = config.clone();
            c.access_token_expiry = 0;
            issue_token(&Uuid::new_v4(), Role::User, TokenPurpose::Access, &c).unwrap()
        };
        let forged = issue_token(
            &Uuid::new_v4(),
            Role::User,
            TokenPurpose::Refresh,
            &config,
        )
        .unwrap();

        let expired_err = verify_token(&expired, TokenPurpose::Access, &config).unwrap_err();
        let forged_err = verify_token(&forged, TokenPurpose::Access, &config).unwrap_err();

        // Both causes surface as the same opaque failure.
        assert_eq!(expired_err.to_string(), forged_err.to_string());
    }
}
