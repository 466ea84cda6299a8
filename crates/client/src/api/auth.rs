//! Signup, login and logout.

use bazaar_core::{Email, UserProfile};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::wire;
use crate::error::Result;
use crate::query::Mutation;
use crate::state::Bazaar;

/// New vendor account and store.
///
/// `Debug` redacts the password.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub name: String,
    pub email: Email,
    pub password: SecretString,
    pub whatsapp_number: String,
    pub username: String,
    pub store_name: String,
    pub bio: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignupBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    whatsapp_number: &'a str,
    username: &'a str,
    storename: &'a str,
    bio: &'a str,
}

impl SignupRequest {
    fn body(&self) -> SignupBody<'_> {
        SignupBody {
            name: self.name.trim(),
            email: self.email.as_str(),
            password: self.password.expose_secret(),
            whatsapp_number: self.whatsapp_number.trim(),
            username: self.username.trim(),
            storename: self.store_name.trim(),
            bio: &self.bio,
        }
    }
}

/// Credentials for an existing account.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: Email,
    pub password: SecretString,
}

impl LoginRequest {
    #[must_use]
    pub fn new(email: Email, password: impl Into<SecretString>) -> Self {
        Self {
            email,
            password: password.into(),
        }
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Session lifecycle.
pub struct AuthApi<'a> {
    ctx: &'a Bazaar,
}

impl<'a> AuthApi<'a> {
    pub(crate) const fn new(ctx: &'a Bazaar) -> Self {
        Self { ctx }
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection, or a decode error when the response
    /// lacks a token or user.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<UserProfile> {
        let result = self
            .ctx
            .http()
            .post("auth/signup", &request.body())
            .await;
        self.establish(Mutation::Signup, result)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection (for example wrong credentials), or a
    /// decode error when the response lacks a token or user.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<UserProfile> {
        let body = LoginBody {
            email: request.email.as_str(),
            password: request.password.expose_secret(),
        };
        let result = self.ctx.http().post("auth/login", &body).await;
        self.establish(Mutation::Login, result)
    }

    /// Sign out and drop everything cached for the account.
    pub fn logout(&self) {
        self.ctx.session().logout();
        self.ctx.reset_account_state();
        info!("Signed out");
    }

    /// Commit token and user as one unit. Cached data of a different
    /// previous account is dropped first.
    fn establish(&self, mutation: Mutation, result: Result<serde_json::Value>) -> Result<UserProfile> {
        let (token, user) = result.and_then(wire::normalize_auth).inspect_err(|e| {
            warn!(mutation = mutation.name(), error = %e, "Authentication failed");
        })?;

        let previous = self.ctx.session().user().map(|u| u.id);
        if previous.as_ref() != Some(&user.id) {
            self.ctx.reset_account_state();
        }
        self.ctx.session().establish(token, user.clone());
        info!(user_id = %user.id, role = user.role.as_str(), "Signed in");
        Ok(user)
    }
}
