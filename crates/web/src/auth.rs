//! Admin credential gate: a fixed username/password pair is exchanged for a
//! signed bearer token, which protected routes check via [`AdminIdentity`].

use std::{fmt, sync::Arc};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use axum_extra::{typed_header::TypedHeaderRejectionReason, TypedHeader};
use chrono::Utc;
use headers::{authorization::Bearer, Authorization};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{common::RouteErrorResponse, config::AuthConfig};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug)]
pub enum AuthError {
    /// No credential was presented.
    Missing,
    /// The presented credential is malformed, forged or not an admin's.
    Invalid,
    Expired,
    WrongCredentials,
    Signing(jsonwebtoken::errors::Error),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no token provided"),
            Self::Invalid => write!(f, "invalid token"),
            Self::Expired => write!(f, "token expired"),
            Self::WrongCredentials => write!(f, "invalid username or password"),
            Self::Signing(why) => write!(f, "could not sign token: {}", why),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<AuthError> for RouteErrorResponse {
    fn from(why: AuthError) -> Self {
        let status = match why {
            AuthError::Missing => StatusCode::FORBIDDEN,
            AuthError::Invalid | AuthError::Expired | AuthError::WrongCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status).with_message(why.to_string())
    }
}

pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_validity: chrono::Duration,
    admin_username: String,
    admin_password: String,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            token_validity: config.token_validity,
            admin_username: config.admin_username.clone(),
            admin_password: config.admin_password.clone(),
        }
    }

    /// Exchanges the admin credentials for a bearer token.
    pub fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        if username != self.admin_username || password != self.admin_password {
            warn!("rejected admin login for `{}`", username);
            return Err(AuthError::WrongCredentials);
        }
        self.issue(username)
    }

    pub fn issue(&self, username: &str) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_owned(),
            role: ADMIN_ROLE.to_owned(),
            iat: now.timestamp(),
            exp: (now + self.token_validity).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::Signing)?;
        Ok(IssuedToken { token, claims })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|why| match why.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => {
                    debug!("token rejected: {}", why);
                    AuthError::Invalid
                }
            })?
            .claims;
        if claims.role != ADMIN_ROLE {
            return Err(AuthError::Invalid);
        }
        Ok(claims)
    }
}

/// Extracting this from a request guards a handler: it runs only with a
/// valid admin bearer token, before the body is read.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub username: String,
    pub claims: Claims,
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminIdentity
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = RouteErrorResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        let bearer = match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
        {
            Ok(TypedHeader(Authorization(bearer))) => bearer,
            Err(why) => {
                let why = match why.reason() {
                    TypedHeaderRejectionReason::Missing => AuthError::Missing,
                    _ => AuthError::Invalid,
                };
                return Err(rejection(why, parts));
            }
        };
        let claims = tokens
            .verify(bearer.token())
            .map_err(|why| rejection(why, parts))?;
        Ok(AdminIdentity {
            username: claims.sub.clone(),
            claims,
        })
    }
}

fn rejection(why: AuthError, parts: &Parts) -> RouteErrorResponse {
    RouteErrorResponse::from(why)
        .with_method(&parts.method)
        .with_uri(parts.uri.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&AuthConfig::default())
    }

    #[test]
    fn login_issues_verifiable_token() {
        let tokens = service();
        let issued = tokens.login("admin", "admin123").unwrap();
        assert_eq!(issued.claims.exp - issued.claims.iat, 24 * 60 * 60);
        let claims = tokens.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "admin");
    }

    #[test]
    fn wrong_password_is_rejected() {
        assert!(matches!(
            service().login("admin", "nope"),
            Err(AuthError::WrongCredentials)
        ));
    }

    #[test]
    fn foreign_and_expired_tokens_are_rejected() {
        let tokens = service();
        let other = TokenService::new(&AuthConfig {
            secret: "another-secret".to_owned(),
            ..AuthConfig::default()
        });
        let forged = other.issue("admin").unwrap();
        assert!(matches!(tokens.verify(&forged.token), Err(AuthError::Invalid)));
        assert!(matches!(tokens.verify("garbage"), Err(AuthError::Invalid)));

        let expired = TokenService::new(&AuthConfig {
            token_validity: chrono::Duration::hours(-1),
            ..AuthConfig::default()
        })
        .issue("admin")
        .unwrap();
        assert!(matches!(tokens.verify(&expired.token), Err(AuthError::Expired)));
    }
}
