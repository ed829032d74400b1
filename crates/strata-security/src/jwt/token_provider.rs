//! JWT token provider for creating and validating tokens.

use super::{Claims, TokenType};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use shaku::Component;
use std::sync::Arc;
use strata_config::SecurityConfig;
use strata_core::{Interface, StrataError, StrataResult, User};
use tracing::{debug, warn};

/// Access and refresh tokens issued together.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// Access token expiration timestamp.
    pub access_expires_at: i64,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: i64,
    /// Always `Bearer`.
    pub token_type: String,
}

/// Interface for token operations.
pub trait TokenProviderInterface: Interface + Send + Sync {
    /// Issues a pair for `user`; the access lifetime is the user's own
    /// `access_expiration_delta`.
    fn generate_tokens(&self, user: &User) -> StrataResult<TokenPair>;

    /// Validates signature, issuer, audience and expiry.
    fn validate_token(&self, token: &str) -> StrataResult<Claims>;

    fn validate_access_token(&self, token: &str) -> StrataResult<Claims>;

    fn validate_refresh_token(&self, token: &str) -> StrataResult<Claims>;
}

/// HS256 token provider.
#[derive(Component, Clone)]
#[shaku(interface = TokenProviderInterface)]
pub struct TokenProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: Arc<SecurityConfig>,
    validation: Validation,
}

impl TokenProvider {
    #[must_use]
    pub fn new(config: Arc<SecurityConfig>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.jwt_issuer]);
        validation.set_audience(&[&config.jwt_audience]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        Self {
            encoding_key,
            decoding_key,
            config,
            validation,
        }
    }

    /// Component parameters for registering a provider in a shaku module.
    #[must_use]
    pub fn parameters(config: Arc<SecurityConfig>) -> TokenProviderParameters {
        let provider = Self::new(config);
        TokenProviderParameters {
            encoding_key: provider.encoding_key,
            decoding_key: provider.decoding_key,
            config: provider.config,
            validation: provider.validation,
        }
    }

    fn access_lifetime(&self, user: &User) -> u64 {
        match user.access_expiration_delta {
            0 => self.config.jwt_access_expiration_secs,
            secs => u64::from(secs),
        }
    }

    fn encode_claims(&self, claims: &Claims) -> StrataResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            StrataError::Internal(format!("Failed to generate {} token: {e}", claims.token_type))
        })
    }

    fn expect_type(claims: Claims, expected: TokenType) -> StrataResult<Claims> {
        if claims.token_type == expected {
            Ok(claims)
        } else {
            Err(StrataError::InvalidToken(format!("Expected {expected} token")))
        }
    }
}

/// Ten years; keeps timestamp arithmetic in range.
const MAX_LIFETIME_SECS: i64 = 10 * 365 * 86_400;

fn lifetime(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(MAX_LIFETIME_SECS).min(MAX_LIFETIME_SECS))
}

impl TokenProviderInterface for TokenProvider {
    fn generate_tokens(&self, user: &User) -> StrataResult<TokenPair> {
        let session_id = uuid::Uuid::now_v7().to_string();
        let now = Utc::now();
        let access_secs = self.access_lifetime(user);

        let access = Claims::for_user(
            user,
            TokenType::Access,
            &self.config.jwt_issuer,
            &self.config.jwt_audience,
            now,
            lifetime(access_secs),
            &session_id,
        );
        let refresh = Claims::for_user(
            user,
            TokenType::Refresh,
            &self.config.jwt_issuer,
            &self.config.jwt_audience,
            now,
            lifetime(self.config.jwt_refresh_expiration_secs),
            &session_id,
        );

        let pair = TokenPair {
            access_token: self.encode_claims(&access)?,
            refresh_token: self.encode_claims(&refresh)?,
            expires_in: access_secs,
            access_expires_at: access.exp,
            refresh_expires_at: refresh.exp,
            token_type: "Bearer".to_string(),
        };
        debug!("Generated token pair for user {}", user.id);
        Ok(pair)
    }

    fn validate_token(&self, token: &str) -> StrataResult<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            warn!("Token validation failed: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => StrataError::TokenExpired,
                ErrorKind::InvalidSignature => {
                    StrataError::InvalidToken("Invalid token signature".to_string())
                }
                ErrorKind::InvalidIssuer => {
                    StrataError::InvalidToken("Invalid token issuer".to_string())
                }
                ErrorKind::InvalidAudience => {
                    StrataError::InvalidToken("Invalid token audience".to_string())
                }
                _ => StrataError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    fn validate_access_token(&self, token: &str) -> StrataResult<Claims> {
        Self::expect_type(self.validate_token(token)?, TokenType::Access)
    }

    fn validate_refresh_token(&self, token: &str) -> StrataResult<Claims> {
        Self::expect_type(self.validate_token(token)?, TokenType::Refresh)
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("issuer", &self.config.jwt_issuer)
            .field("audience", &self.config.jwt_audience)
            .finish_non_exhaustive()
    }
}
