use crate::{navigation::Route, spot::OwnerId};

use std::sync::Arc;

use sb_store::{AuthError, Credentials, IdentityProvider};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, instrument, Instrument};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
	/// The identity provider hasn't reported yet.
	#[default]
	Unknown,
	Authenticated(OwnerId),
	Unauthenticated,
}

impl SessionState {
	#[must_use]
	pub const fn is_known(&self) -> bool {
		!matches!(self, Self::Unknown)
	}

	#[must_use]
	pub const fn owner(&self) -> Option<&OwnerId> {
		match self {
			Self::Authenticated(owner) => Some(owner),
			Self::Unknown | Self::Unauthenticated => None,
		}
	}
}

/// What a protected screen should render for the current session.
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
	Loading,
	Redirect(Route),
	Granted(OwnerId),
}

impl From<&SessionState> for Access {
	fn from(state: &SessionState) -> Self {
		match state {
			SessionState::Unknown => Self::Loading,
			SessionState::Authenticated(owner) => Self::Granted(owner.clone()),
			SessionState::Unauthenticated => Self::Redirect(Route::Login),
		}
	}
}

/// Tracks the identity provider's session and gates protected screens on it.
///
/// The state only ever changes in response to provider notifications, so a successful
/// [`SessionGuard::sign_in`] is observed once the provider announces it.
pub struct SessionGuard {
	identity: Arc<dyn IdentityProvider>,
	state_tx: Arc<watch::Sender<SessionState>>,
	listener: JoinHandle<()>,
}

impl SessionGuard {
	/// Must be called from within a tokio runtime.
	pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
		let (state_tx, _) = watch::channel(SessionState::Unknown);
		let state_tx = Arc::new(state_tx);

		let mut session_changes = identity.on_session_change();

		let listener = tokio::spawn({
			let state_tx = Arc::clone(&state_tx);
			async move {
				while let Some(user) = session_changes.next_snapshot().await {
					let next = user.map_or(SessionState::Unauthenticated, SessionState::Authenticated);

					state_tx.send_if_modified(|current| {
						if *current == next {
							return false;
						}

						info!(from = ?current, to = ?next, "Session changed");
						*current = next;
						true
					});
				}

				debug!("Identity provider closed the session stream");
			}
			.in_current_span()
		});

		Self {
			identity,
			state_tx,
			listener,
		}
	}

	#[must_use]
	pub fn state(&self) -> SessionState {
		self.state_tx.borrow().clone()
	}

	/// Receiver that observes every later state change.
	#[must_use]
	pub fn subscribe(&self) -> watch::Receiver<SessionState> {
		self.state_tx.subscribe()
	}

	#[must_use]
	pub fn access(&self) -> Access {
		Access::from(&*self.state_tx.borrow())
	}

	#[must_use]
	pub fn owner(&self) -> Option<OwnerId> {
		self.state_tx.borrow().owner().cloned()
	}

	/// Resolves once the provider has reported whether a user is signed in.
	pub async fn wait_until_known(&self) -> SessionState {
		self.wait_for(SessionState::is_known).await
	}

	pub async fn wait_for(&self, mut predicate: impl FnMut(&SessionState) -> bool) -> SessionState {
		let mut state_rx = self.state_tx.subscribe();

		let state = match state_rx.wait_for(|state| predicate(state)).await {
			Ok(state) => state.clone(),
			// We hold the sender, receivers can't observe it closing
			Err(_) => self.state(),
		};

		state
	}

	#[instrument(skip(self), err)]
	pub async fn sign_in(&self, credentials: &Credentials) -> Result<OwnerId, AuthError> {
		self.identity.sign_in(credentials).await
	}

	#[instrument(skip(self), err)]
	pub async fn sign_up(&self, credentials: &Credentials) -> Result<OwnerId, AuthError> {
		self.identity.sign_up(credentials).await
	}

	#[instrument(skip(self), err)]
	pub async fn sign_out(&self) -> Result<(), AuthError> {
		self.identity.sign_out().await
	}
}

impl Drop for SessionGuard {
	fn drop(&mut self) {
		self.listener.abort();
	}
}
