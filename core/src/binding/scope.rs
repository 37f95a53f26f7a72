use crate::{
	error::{report_error, Error},
	navigation::{Navigation, Route},
	session::{SessionGuard, SessionState},
	spot::OwnerId,
};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// A binding whose data belongs to one owner.
#[async_trait]
pub trait OwnerScoped: Send {
	async fn open(&mut self, owner: &OwnerId) -> Result<(), Error>;

	fn close(&mut self);
}

/// Opens, reopens and closes an owner scoped binding as the session changes.
///
/// Nothing is opened while the session is unknown. Losing the session closes the binding and
/// sends the screen back to the login route.
pub struct SessionScope<B> {
	state_rx: watch::Receiver<SessionState>,
	applied: SessionState,
	binding: B,
	navigation_tx: mpsc::UnboundedSender<Navigation>,
}

impl<B: OwnerScoped> SessionScope<B> {
	pub fn new(guard: &SessionGuard, binding: B) -> (Self, mpsc::UnboundedReceiver<Navigation>) {
		let (navigation_tx, navigation_rx) = mpsc::unbounded_channel();

		(
			Self {
				state_rx: guard.subscribe(),
				applied: SessionState::Unknown,
				binding,
				navigation_tx,
			},
			navigation_rx,
		)
	}

	#[must_use]
	pub const fn binding(&self) -> &B {
		&self.binding
	}

	pub fn binding_mut(&mut self) -> &mut B {
		&mut self.binding
	}

	/// Brings the binding in line with the current session state.
	pub async fn sync(&mut self) {
		let state = self.state_rx.borrow_and_update().clone();
		if state == self.applied {
			return;
		}

		match &state {
			SessionState::Unknown => {}
			SessionState::Authenticated(owner) => {
				debug!(%owner, "Opening owner scoped binding");
				report_error(&self.binding.open(owner).await);
			}
			SessionState::Unauthenticated => {
				info!("Session lost, redirecting to login");
				self.binding.close();
				// The receiver is gone only when nobody renders this screen anymore
				self.navigation_tx
					.send(Navigation::Replace(Route::Login))
					.ok();
			}
		}

		self.applied = state;
	}

	/// Waits for the next session change and applies it. Returns `false` once the guard is gone.
	pub async fn follow(&mut self) -> bool {
		if self.state_rx.changed().await.is_err() {
			return false;
		}

		self.sync().await;
		true
	}

	/// Keeps the binding in sync until the guard goes away, then hands the binding back.
	pub async fn run(mut self) -> B {
		self.sync().await;
		while self.follow().await {}

		self.binding
	}
}
