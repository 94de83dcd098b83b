use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};

use crate::AppState;
use crate::config::Config;
use crate::database::models::{AuthResponse, CreateUserInput, LoginInput, User, require_text};
use crate::database::repositories::UserRepository;
use crate::error::AppError;
use crate::middleware::RequestIdExt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    pub fn is_user(&self, user_id: &str) -> bool {
        self.sub == user_id
    }
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|token_data| token_data.claims)
}

impl FromRequest for Claims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|header| header.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = token else {
            return ready(Err(AppError::Unauthorized(
                "Missing or invalid authorization header".to_string(),
            )));
        };

        let Some(state) = req.app_data::<Data<AppState>>() else {
            log::error!("AppState is not registered as app data");
            return ready(Err(AppError::internal_server_error()));
        };

        let result = state.auth_service.verify_token(token);
        if result.is_err() {
            log::debug!(
                "Rejected token on {} (correlation_id={})",
                req.path(),
                req.correlation_id().unwrap_or_default()
            );
        }

        ready(result)
    }
}

#[derive(Clone)]
pub struct AuthService {
    user_repository: UserRepository,
    config: Config,
}

impl AuthService {
    pub fn new(user_repository: UserRepository, config: Config) -> Self {
        Self {
            user_repository,
            config,
        }
    }

    pub async fn register(&self, request: CreateUserInput) -> Result<AuthResponse, AppError> {
        let name = require_text("name", request.name)?;
        let email = require_text("email", request.email)?.to_lowercase();
        let password = require_text("password", request.password)?;

        if !email.contains('@') {
            return Err(AppError::bad_request("email must be a valid email address"));
        }

        if self.user_repository.email_exists(&email).await? {
            return Err(AppError::conflict("User already exists"));
        }

        let password_hash = hash_password(&password)?;
        let user = User::new(email, password_hash, name);

        let user = self
            .user_repository
            .create_user(&user)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "User already exists"))?;

        log::info!("Registered user {}", user.id);

        self.auth_response(user)
    }

    pub async fn login(&self, request: LoginInput) -> Result<AuthResponse, AppError> {
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let user = self
            .user_repository
            .find_by_email(&request.email.trim().to_lowercase())
            .await?
            .ok_or_else(invalid)?;

        if !verify(&request.password, &user.password_hash)? {
            return Err(invalid());
        }

        self.auth_response(user)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        decode_claims(token, &self.config.jwt_secret).map_err(|e| {
            log::debug!("Invalid token: {}", e);
            AppError::Unauthorized("Invalid token".to_string())
        })
    }

    pub fn generate_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(Duration::days(self.config.jwt_expiration_days))
            .ok_or_else(|| AppError::internal_server_error_message("Token expiry overflow"))?;

        let claims = Claims {
            sub: user.id.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?;

        Ok(token)
    }

    fn auth_response(&self, user: User) -> Result<AuthResponse, AppError> {
        let token = self.generate_token(&user)?;

        Ok(AuthResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            token,
        })
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    Ok(hash(password, DEFAULT_COST)?)
}
