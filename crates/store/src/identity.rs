use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{AuthError, Subscription};

/// Stable identifier the identity provider assigns to an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	pub email: String,
	pub password: String,
}

impl Credentials {
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			email: email.into(),
			password: password.into(),
		}
	}
}

// Keep passwords out of logs.
impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
	async fn sign_in(&self, credentials: &Credentials) -> Result<UserId, AuthError>;

	/// Creates the account and signs it in.
	async fn sign_up(&self, credentials: &Credentials) -> Result<UserId, AuthError>;

	async fn sign_out(&self) -> Result<(), AuthError>;

	/// Session change notifications. The current state is always delivered first.
	fn on_session_change(&self) -> Subscription<Option<UserId>>;

	fn current_user(&self) -> Option<UserId>;
}
