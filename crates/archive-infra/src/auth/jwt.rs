//! Verification of bearer tokens issued by the hosted auth provider.
//!
//! The provider signs HS256 JWTs with a project secret; `sub` carries the user
//! id and `aud` is `authenticated` for signed-in users.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use uuid::Uuid;

use archive_core::ports::{AuthError, TokenClaims, TokenService};

const DEFAULT_AUDIENCE: &str = "authenticated";
const DEFAULT_SECRET: &str = "change-me-in-production";

/// JWT configuration that must not be used.
#[derive(Debug, thiserror::Error)]
pub enum JwtConfigError {
    #[error("AUTH_JWT_SECRET must be set when RUST_ENV is '{0}'")]
    DefaultSecretInProduction(String),
}

/// JWT verification configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Required `aud` claim; `None` disables the audience check.
    pub audience: Option<String>,
    /// Required `iss` claim; `None` disables the issuer check.
    pub issuer: Option<String>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            audience: Some(DEFAULT_AUDIENCE.to_string()),
            issuer: None,
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, JwtConfigError> {
        let secret = std::env::var("AUTH_JWT_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty())
            .unwrap_or_else(|| DEFAULT_SECRET.to_string());

        let audience = match std::env::var("AUTH_JWT_AUDIENCE") {
            Ok(aud) if aud.is_empty() => None,
            Ok(aud) => Some(aud),
            Err(_) => Some(DEFAULT_AUDIENCE.to_string()),
        };

        let config = Self {
            secret,
            audience,
            issuer: std::env::var("AUTH_JWT_ISSUER").ok(),
        };
        config.check_environment(std::env::var("RUST_ENV").ok().as_deref())?;
        Ok(config)
    }

    /// Refuse the built-in secret when `environment` is production.
    pub fn check_environment(&self, environment: Option<&str>) -> Result<(), JwtConfigError> {
        if self.secret != DEFAULT_SECRET {
            return Ok(());
        }

        match environment {
            Some(env @ ("production" | "prod")) => {
                Err(JwtConfigError::DefaultSecretInProduction(env.to_string()))
            }
            _ => {
                tracing::warn!("Using default JWT secret. Set AUTH_JWT_SECRET for production use.");
                Ok(())
            }
        }
    }
}

/// Provider claims we rely on.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: String,
    exp: i64,
}

/// JWT-based token verification.
pub struct JwtTokenService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match &config.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &config.issuer {
            validation.set_issuer(&[iss]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    pub fn from_env() -> Result<Self, JwtConfigError> {
        Ok(Self::new(JwtConfig::from_env()?))
    }
}

impl TokenService for JwtTokenService {
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken(e.to_string()),
                }
            })?;

        let user_id = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(TokenClaims {
            user_id,
            email: token_data.claims.email,
            exp: token_data.claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    #[derive(Serialize)]
    struct ProviderClaims<'a> {
        sub: &'a str,
        email: &'a str,
        aud: &'a str,
        exp: i64,
        role: &'a str,
    }

    fn sign(secret: &str, sub: &str, aud: &str, exp: i64) -> String {
        let claims = ProviderClaims {
            sub,
            email: "dana@school.edu",
            aud,
            exp,
            role: "authenticated",
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn service() -> JwtTokenService {
        JwtTokenService::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            ..Default::default()
        })
    }

    fn in_one_hour() -> i64 {
        (Utc::now() + TimeDelta::hours(1)).timestamp()
    }

    #[test]
    fn test_validate_provider_token() {
        let user_id = Uuid::new_v4();
        let token = sign("test-secret-key", &user_id.to_string(), "authenticated", in_one_hour());

        let claims = service().validate_token(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "dana@school.edu");
    }

    #[test]
    fn test_validate_invalid_token() {
        let result = service().validate_token("invalid-token");
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = sign("other-secret", &Uuid::new_v4().to_string(), "authenticated", in_one_hour());
        assert!(service().validate_token(&token).is_err());
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let token = sign("test-secret-key", &Uuid::new_v4().to_string(), "anon", in_one_hour());
        assert!(service().validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let expired = (Utc::now() - TimeDelta::hours(2)).timestamp();
        let token = sign("test-secret-key", &Uuid::new_v4().to_string(), "authenticated", expired);
        assert!(matches!(
            service().validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        let token = sign("test-secret-key", "service-role", "authenticated", in_one_hour());
        assert!(matches!(
            service().validate_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_default_secret_is_refused_in_production() {
        let config = JwtConfig::default();

        for env in ["production", "prod"] {
            assert!(matches!(
                config.check_environment(Some(env)),
                Err(JwtConfigError::DefaultSecretInProduction(_))
            ));
        }
        assert!(config.check_environment(Some("development")).is_ok());
        assert!(config.check_environment(None).is_ok());
    }

    #[test]
    fn test_custom_secret_is_accepted_in_production() {
        let config = JwtConfig {
            secret: "project-jwt-secret".to_string(),
            ..Default::default()
        };
        assert!(config.check_environment(Some("production")).is_ok());
    }
}
