//! The signed-in user, held explicitly and shared by clone.

use crate::client::{ApiClient, ClientError};
use crate::model::{SignupRequest, SignupResponse, User};
use std::sync::{Arc, RwLock};

#[derive(Clone, Default)]
pub struct SessionContext {
    user: Arc<RwLock<Option<User>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<User> {
        self.user.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.current().map(|u| u.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }

    fn set(&self, user: Option<User>) {
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = user;
    }

    /// Blank fields are rejected locally; otherwise the server decides.
    pub async fn login(&self, api: &ApiClient, username: &str, password: &str) -> Result<User, ClientError> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(ClientError::Validation("Please fill in all fields.".into()));
        }
        let user = api.login(username.trim(), password).await?;
        tracing::info!(user_id = user.id, "signed in");
        self.set(Some(user.clone()));
        Ok(user)
    }

    /// Register a new account. Does not sign in; the caller logs in afterwards.
    pub async fn signup(&self, api: &ApiClient, req: &SignupRequest) -> Result<SignupResponse, ClientError> {
        let fields = [&req.username, &req.email, &req.password, &req.confirm_password];
        if fields.iter().any(|f| f.as_deref().map_or(true, |v| v.trim().is_empty())) {
            return Err(ClientError::Validation("All fields are required".into()));
        }
        if req.password != req.confirm_password {
            return Err(ClientError::Validation("Passwords do not match".into()));
        }
        api.signup(req).await
    }

    /// Re-establish a session from a remembered user id.
    pub async fn resume(&self, api: &ApiClient, user_id: i64) -> Result<User, ClientError> {
        match api.get_user(user_id).await {
            Ok(user) => {
                tracing::info!(user_id, "session resumed");
                self.set(Some(user.clone()));
                Ok(user)
            }
            Err(e) => {
                self.set(None);
                Err(e)
            }
        }
    }

    pub fn logout(&self) {
        if let Some(id) = self.user_id() {
            tracing::info!(user_id = id, "signed out");
        }
        self.set(None);
    }
}
