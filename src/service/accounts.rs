//! Signup, login and user lookup.

use crate::error::AppError;
use crate::model::{LoginRequest, NewUser, SignupRequest, SignupResponse, User};
use crate::password::{hash_password, verify_password};
use crate::service::validation::{RequestValidator, MAX_USERNAME_LEN};
use crate::store::TodoStore;

pub struct AccountService;

impl AccountService {
    /// Register a user. Missing fields or a confirmation mismatch are validation errors; a taken
    /// username or email is a conflict.
    pub async fn signup(store: &dyn TodoStore, req: SignupRequest) -> Result<SignupResponse, AppError> {
        let username = RequestValidator::required("username", req.username.as_deref())?;
        let email = RequestValidator::required("email", req.email.as_deref())?;
        RequestValidator::required("password", req.password.as_deref())?;
        RequestValidator::required("confirm_password", req.confirm_password.as_deref())?;
        if req.password != req.confirm_password {
            return Err(AppError::Validation("passwords do not match".into()));
        }
        RequestValidator::max_length("username", username, MAX_USERNAME_LEN)?;
        RequestValidator::email("email", email)?;

        if store.identity_taken(username, email).await? {
            return Err(AppError::Conflict("username or email already exists".into()));
        }

        // Passwords are hashed exactly as typed, surrounding whitespace included.
        let password = req.password.unwrap_or_default();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;
        let user = store
            .insert_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;
        tracing::info!(user_id = user.id, username = %user.username, "user registered");
        Ok(SignupResponse {
            id: user.id,
            username: user.username,
        })
    }

    /// Verify credentials. Unknown user and wrong password fail identically.
    pub async fn login(store: &dyn TodoStore, req: LoginRequest) -> Result<User, AppError> {
        let username = RequestValidator::required("username", req.username.as_deref())?;
        RequestValidator::required("password", req.password.as_deref())?;
        let password = req.password.clone().unwrap_or_default();

        let Some(credentials) = store.find_credentials(username).await? else {
            tracing::debug!(username = %username, "login for unknown user");
            return Err(AppError::Unauthorized("invalid credentials".into()));
        };
        let stored = credentials.password_hash;
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        if !verified {
            tracing::debug!(user_id = credentials.user.id, "login with wrong password");
            return Err(AppError::Unauthorized("invalid credentials".into()));
        }
        Ok(credentials.user)
    }

    pub async fn get_user(store: &dyn TodoStore, id: i64) -> Result<User, AppError> {
        store
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))
    }
}
