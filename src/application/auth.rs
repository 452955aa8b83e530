//! Login and bearer-token verification.
//!
//! Passwords are bcrypt hashes; sessions are stateless HS256 JWTs. A failed
//! login never reveals whether the email exists — unknown email and wrong
//! password produce the same error.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{RepoError, UsersRepo};

pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("missing or invalid bearer token")]
    InvalidToken,
    #[error("token expired")]
    Expired,
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("credential processing failed: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// The verified identity attached to a request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginReply {
    pub token: String,
    pub email: String,
    pub role: String,
}

pub struct AuthService {
    users: Arc<dyn UsersRepo>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: time::Duration,
    admin_email: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        secret: &str,
        token_ttl: std::time::Duration,
        admin_email: String,
    ) -> Self {
        Self {
            users,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl: time::Duration::try_from(token_ttl)
                .unwrap_or_else(|_| time::Duration::hours(24)),
            admin_email,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginReply, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let valid = bcrypt::verify(password, &user.password_hash)
            .map_err(|err| AuthError::Internal(format!("password verification failed: {err}")))?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            iat: now.unix_timestamp(),
            exp: (now + self.token_ttl).unix_timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Internal(format!("token signing failed: {err}")))?;

        Ok(LoginReply {
            token,
            email: user.email,
            role: user.role,
        })
    }

    /// Decode and validate a bearer token into a [`Principal`].
    ///
    /// Admin standing is granted by elevated role or by matching the
    /// configured administrator email.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let data = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|err| match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken,
        })?;

        let claims = data.claims;
        let is_admin = claims.role == ROLE_ADMIN || claims.email == self.admin_email;

        Ok(Principal {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            is_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::UserRecord;
    use async_trait::async_trait;

    struct OneUser(UserRecord);

    #[async_trait]
    impl UsersRepo for OneUser {
        async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
            Ok((self.0.email == email).then(|| self.0.clone()))
        }
    }

    fn service(role: &str, admin_email: &str) -> AuthService {
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: "owner@example.com".into(),
            // Low cost keeps the test quick; production uses DEFAULT_COST.
            password_hash: bcrypt::hash("correct horse", 4).unwrap(),
            role: role.into(),
            created_at: OffsetDateTime::now_utc(),
        };
        AuthService::new(
            Arc::new(OneUser(user)),
            "test-secret",
            std::time::Duration::from_secs(3600),
            admin_email.into(),
        )
    }

    #[tokio::test]
    async fn login_roundtrips_to_a_verifiable_principal() {
        let auth = service(ROLE_ADMIN, "owner@example.com");
        let reply = auth.login("owner@example.com", "correct horse").await.unwrap();

        let principal = auth.verify(&reply.token).unwrap();
        assert_eq!(principal.email, "owner@example.com");
        assert!(principal.is_admin);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let auth = service("viewer", "owner@example.com");

        let wrong_password = auth
            .login("owner@example.com", "wrong")
            .await
            .expect_err("must fail");
        let unknown_email = auth
            .login("nobody@example.com", "correct horse")
            .await
            .expect_err("must fail");

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn configured_admin_email_grants_admin_without_role() {
        let auth = service("viewer", "owner@example.com");
        let reply = auth.login("owner@example.com", "correct horse").await.unwrap();
        let principal = auth.verify(&reply.token).unwrap();
        assert!(principal.is_admin);
    }

    #[test]
    fn garbage_tokens_are_invalid() {
        let auth = service("viewer", "owner@example.com");
        assert!(matches!(
            auth.verify("not-a-jwt"),
            Err(AuthError::InvalidToken)
        ));
    }
}
