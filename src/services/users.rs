use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::{JwtService, PasswordService},
    config::Config,
    database::Repository,
    errors::{AppError, Result},
    models::{
        AuthResponse, ChangePasswordRequest, LoginRequest, NewUser, RegisterRequest,
        UpdateProfileRequest, User,
    },
    services::items::required_name,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

const EMAIL_MAX: usize = 255;
pub const USER_NAME_MIN: usize = 2;
pub const USER_NAME_MAX: usize = 50;

pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = email.chars().count() <= EMAIL_MAX && match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(AppError::InvalidInput("A valid email address is required".to_string()))
    }
}

/// Display names are 2 to 50 characters after trimming.
pub fn validate_user_name(name: Option<&str>) -> Result<String> {
    let name = required_name(name, USER_NAME_MAX)?;
    if name.chars().count() < USER_NAME_MIN {
        return Err(AppError::InvalidInput(format!(
            "Name must be at least {} characters long",
            USER_NAME_MIN
        )));
    }
    Ok(name)
}

pub struct UserService {
    repository: Arc<dyn Repository>,
    jwt: JwtService,
    default_storage_limit: f64,
}

impl UserService {
    pub fn new(repository: Arc<dyn Repository>, config: &Config) -> Self {
        Self {
            repository,
            jwt: JwtService::new(&config.jwt_secret, config.jwt_expires_in_hours),
            default_storage_limit: config.default_storage_limit_gb,
        }
    }

    fn issue(&self, user: User) -> Result<AuthResponse> {
        let token = self.jwt.generate_token(user.id, &user.email)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        let email = normalize_email(request.email.as_deref().unwrap_or_default())?;
        let name = validate_user_name(request.name.as_deref())?;
        let password = request.password.unwrap_or_default();
        PasswordService::validate_password_strength(&password)?;

        let user = self
            .repository
            .create_user(NewUser {
                email,
                name,
                password_hash: PasswordService::hash_password(&password)?,
                storage_limit: self.default_storage_limit,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.issue(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        let (Some(email), Some(password)) = (request.email, request.password) else {
            return Err(AppError::InvalidInput("Email and password are required".to_string()));
        };
        let unauthorized = || AppError::Unauthorized(INVALID_CREDENTIALS.to_string());

        let email = normalize_email(&email).map_err(|_| unauthorized())?;
        let user = self
            .repository
            .find_user_by_email(&email)
            .await?
            .ok_or_else(unauthorized)?;

        if !PasswordService::verify_password(&password, &user.password_hash)? {
            return Err(unauthorized());
        }

        self.issue(user)
    }

    /// Resolves a bearer token to a live (not soft-deleted) user.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.jwt.verify_token(token)?;
        self.repository
            .find_user_by_id(claims.user_id()?)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User> {
        self.repository
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn update_profile(&self, user_id: Uuid, request: UpdateProfileRequest) -> Result<User> {
        match request.name.as_deref() {
            Some(name) => {
                let name = validate_user_name(Some(name))?;
                self.repository
                    .update_user_name(user_id, &name)
                    .await?
                    .ok_or_else(|| AppError::not_found("User"))
            }
            None => self.profile(user_id).await,
        }
    }

    pub async fn change_password(&self, user_id: Uuid, request: ChangePasswordRequest) -> Result<()> {
        let (Some(current_password), Some(new_password)) = (request.current_password, request.new_password)
        else {
            return Err(AppError::InvalidInput(
                "Current and new password are required".to_string(),
            ));
        };
        PasswordService::validate_password_strength(&new_password)?;

        let user = self.profile(user_id).await?;
        if !PasswordService::verify_password(&current_password, &user.password_hash)? {
            return Err(AppError::Unauthorized("Current password is incorrect".to_string()));
        }

        let password_hash = PasswordService::hash_password(&new_password)?;
        if !self.repository.update_user_password(user_id, &password_hash).await? {
            return Err(AppError::not_found("User"));
        }
        Ok(())
    }

    /// Soft delete; the account's tokens stop resolving immediately.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<()> {
        if !self.repository.soft_delete_user(user_id).await? {
            return Err(AppError::not_found("User"));
        }
        tracing::info!(user_id = %user_id, "Account deleted");
        Ok(())
    }
}
