use config::ConfigError;

use crate::auth::TokenPurpose;
use crate::error::AppError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub email: EmailSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// JWT authentication settings.
///
/// Each token purpose carries its own signing secret and lifetime: a leaked
/// reset secret cannot forge access tokens, and the three lifetimes are
/// tunable independently.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub access_token_expiry: i64,  // seconds (e.g., 900 for 15 minutes)
    pub refresh_secret: String,
    pub refresh_token_expiry: i64, // seconds (e.g., 604800 for 7 days)
    pub reset_secret: String,
    pub reset_token_expiry: i64,   // seconds (e.g., 600 for 10 minutes)
    pub issuer: String,
}

impl JwtSettings {
    /// Signing secret for a token purpose.
    pub fn secret_for(&self, purpose: TokenPurpose) -> &str {
        match purpose {
            TokenPurpose::Access => &self.access_secret,
            TokenPurpose::Refresh => &self.refresh_secret,
            TokenPurpose::Reset => &self.reset_secret,
        }
    }

    /// Lifetime in seconds for a token purpose.
    pub fn expiry_for(&self, purpose: TokenPurpose) -> i64 {
        match purpose {
            TokenPurpose::Access => self.access_token_expiry,
            TokenPurpose::Refresh => self.refresh_token_expiry,
            TokenPurpose::Reset => self.reset_token_expiry,
        }
    }

    /// Reject unusable token configuration at startup rather than at the
    /// first request that needs to sign or verify a token.
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, secret) in [
            ("jwt.access_secret", &self.access_secret),
            ("jwt.refresh_secret", &self.refresh_secret),
            ("jwt.reset_secret", &self.reset_secret),
        ] {
            if secret.is_empty() {
                return Err(AppError::Config(
                    crate::error::ConfigError::MissingRequired(name.to_string()),
                ));
            }
        }

        for (name, expiry) in [
            ("jwt.access_token_expiry", self.access_token_expiry),
            ("jwt.refresh_token_expiry", self.refresh_token_expiry),
            ("jwt.reset_token_expiry", self.reset_token_expiry),
        ] {
            if expiry <= 0 {
                return Err(AppError::Config(crate::error::ConfigError::InvalidValue(
                    name.to_string(),
                )));
            }
        }

        Ok(())
    }
}

/// Outbound email settings for the password-reset notifier.
#[derive(serde::Deserialize, Clone)]
pub struct EmailSettings {
    pub base_url: String,
    pub sender: String,
    pub reset_link_base: String,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_settings() -> JwtSettings {
        JwtSettings {
            access_secret: "access-secret-key-at-least-32-chars-long".to_string(),
            access_token_expiry: 900,
            refresh_secret: "refresh-secret-key-at-least-32-chars-xx".to_string(),
            refresh_token_expiry: 604800,
            reset_secret: "reset-secret-key-at-least-32-chars-long".to_string(),
            reset_token_expiry: 600,
            issuer: "test".to_string(),
        }
    }

    #[test]
    fn test_valid_jwt_settings_pass_validation() {
        assert!(jwt_settings().validate().is_ok());
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let mut settings = jwt_settings();
        settings.reset_secret = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_non_positive_expiry_is_rejected() {
        let mut settings = jwt_settings();
        settings.access_token_expiry = 0;
        assert!(settings.validate().is_err());

        let mut settings = jwt_settings();
        settings.refresh_token_expiry = -1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_secret_and_expiry_lookup_per_purpose() {
        let settings = jwt_settings();
        assert_eq!(settings.secret_for(TokenPurpose::Access), settings.access_secret);
        assert_eq!(settings.secret_for(TokenPurpose::Refresh), settings.refresh_secret);
        assert_eq!(settings.secret_for(TokenPurpose::Reset), settings.reset_secret);
        assert_eq!(settings.expiry_for(TokenPurpose::Access), 900);
        assert_eq!(settings.expiry_for(TokenPurpose::Refresh), 604800);
        assert_eq!(settings.expiry_for(TokenPurpose::Reset), 600);
    }
}
