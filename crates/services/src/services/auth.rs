//! Account authentication: argon2 password hashing and HS256 access tokens.

use std::collections::HashSet;

use argon2::{
    Algorithm as Argon2Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use db::{
    models::user::{CreateUser, User, UserError, UserRole},
    validation::{ValidationError, validate_email, validate_username},
};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub const TOKEN_AUDIENCE: &str = "mirror-of-heart";
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("account is deactivated")]
    AccountDisabled,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Argon2id hashing with configurable cost.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl PasswordHasher {
    /// Custom memory (KiB) and iteration cost. Tests use tiny values.
    pub fn with_cost(m_cost: u32, t_cost: u32) -> Result<Self, AuthError> {
        let params =
            Params::new(m_cost, t_cost, 1, None).map_err(|e| AuthError::Hash(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Argon2Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Produce a PHC string (`$argon2id$v=19$...`).
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hash(e.to_string()))
    }

    /// A malformed stored hash verifies as false rather than erroring.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                warn!(error = %e, "stored password hash could not be parsed");
                false
            }
        }
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len == 0 {
        return Err(ValidationError::Required("password"));
    }
    if len < PASSWORD_MIN {
        return Err(ValidationError::TooShort {
            field: "password",
            min: PASSWORD_MIN,
        });
    }
    if len > PASSWORD_MAX {
        return Err(ValidationError::TooLong {
            field: "password",
            max: PASSWORD_MAX,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub fn validate_registration(req: &RegisterRequest) -> Result<(), ValidationError> {
    validate_username(req.username.trim())?;
    validate_email(&req.email.trim().to_lowercase())?;
    validate_password(&req.password)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtService {
    secret: SecretString,
    ttl: ChronoDuration,
}

impl JwtService {
    pub fn new(secret: SecretString, ttl_hours: i64) -> Self {
        Self {
            secret,
            ttl: ChronoDuration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user_id: Uuid, role: UserRole) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            aud: TOKEN_AUDIENCE.to_string(),
        };
        self.encode_claims(&claims).map(|token| IssuedToken { token, expires_at })
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        Ok(encode(&Header::new(Algorithm::HS256), claims, &key)?)
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.required_spec_claims = HashSet::from([
            "sub".to_string(),
            "exp".to_string(),
            "aud".to_string(),
        ]);
        validation.leeway = 30;

        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}

/// Registered or logged-in user plus a fresh token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Account flows backed by the users table.
#[derive(Clone)]
pub struct AuthService {
    hasher: PasswordHasher,
    jwt: JwtService,
    admin_emails: Vec<String>,
}

impl AuthService {
    pub fn new(hasher: PasswordHasher, jwt: JwtService, admin_emails: Vec<String>) -> Self {
        Self {
            hasher,
            jwt,
            admin_emails,
        }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    fn session(&self, user: User) -> Result<AuthSession, AuthError> {
        let issued = self.jwt.issue(user.id, user.role)?;
        Ok(AuthSession {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        })
    }

    pub async fn register(
        &self,
        pool: &SqlitePool,
        req: &RegisterRequest,
    ) -> Result<AuthSession, AuthError> {
        validate_registration(req)?;

        let email = req.email.trim().to_lowercase();
        let role = if self.admin_emails.contains(&email) {
            UserRole::Admin
        } else {
            UserRole::User
        };
        let password_hash = self.hasher.hash(&req.password)?;

        let user = User::create(
            pool,
            &CreateUser {
                username: req.username.trim().to_string(),
                email,
                password_hash,
                role,
            },
        )
        .await?;
        info!(user_id = %user.id, role = %user.role, "registered new account");
        self.session(user)
    }

    pub async fn login(&self, pool: &SqlitePool, req: &LoginRequest) -> Result<AuthSession, AuthError> {
        let Some(mut user) = User::find_by_email(pool, &req.email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        if !self.hasher.verify(&req.password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        User::touch_login(pool, user.id).await?;
        user.last_login_at = Some(Utc::now());
        self.session(user)
    }

    pub async fn change_password(
        &self,
        pool: &SqlitePool,
        user: &User,
        req: &ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        if !self.hasher.verify(&req.current_password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        validate_password(&req.new_password)?;
        let hash = self.hasher.hash(&req.new_password)?;
        User::update_password(pool, user.id, &hash).await?;
        info!(user_id = %user.id, "password changed");
        Ok(())
    }
}
