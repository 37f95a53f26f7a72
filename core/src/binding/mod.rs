//! Screen state fed by live subscriptions.
//!
//! Every screen keeps its own mirror of the data it shows, owned by a [`LiveBinding`]. The
//! binding holds at most one live subscription and forwards its snapshots into the mirror;
//! presentation reads the mirror through a [`BindingView`].

use std::sync::Arc;

use futures::StreamExt;
use sb_store::{Subscription, SubscriptionGuard};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, trace, Instrument};

mod detail;
mod form;
mod list;
mod map;
mod scope;

pub use detail::{or_not_available, SpotDetailBinding, NOT_AVAILABLE};
pub use form::{CreateForm, EditForm};
pub use list::SpotListBinding;
pub use map::{MapPicker, Marker, Region, SPOT_DELTA};
pub use scope::{OwnerScoped, SessionScope};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ViewState<T> {
	#[default]
	Loading,
	Ready(T),
	NotFound,
	/// Display message for a remote failure.
	Failed(String),
}

impl<T> ViewState<T> {
	#[must_use]
	pub const fn ready(&self) -> Option<&T> {
		match self {
			Self::Ready(value) => Some(value),
			Self::Loading | Self::NotFound | Self::Failed(_) => None,
		}
	}

	#[must_use]
	pub const fn is_loading(&self) -> bool {
		matches!(self, Self::Loading)
	}
}

#[derive(Debug)]
struct Mirror<T> {
	/// Bumped whenever the forwarding subscription is replaced or cancelled. A forwarder only
	/// writes while the epoch it was started with is still current.
	epoch: u64,
	view: ViewState<T>,
}

/// Local mirror fed by at most one live subscription.
///
/// Once [`LiveBinding::cancel`] returns, the backend listener is unregistered and no snapshot
/// from the cancelled subscription reaches the mirror: the epoch is checked under the mirror's
/// write lock. Dropping the binding cancels it.
#[derive(Debug)]
pub struct LiveBinding<T> {
	mirror_tx: Arc<watch::Sender<Mirror<T>>>,
	/// Released by `advance` on the calling thread, independent of the forwarder task.
	guard: Option<SubscriptionGuard>,
	forwarder: Option<JoinHandle<()>>,
}

impl<T> LiveBinding<T>
where
	T: Clone + PartialEq + Send + Sync + 'static,
{
	#[must_use]
	pub fn new() -> Self {
		let (mirror_tx, _) = watch::channel(Mirror {
			epoch: 0,
			view: ViewState::Loading,
		});

		Self {
			mirror_tx: Arc::new(mirror_tx),
			guard: None,
			forwarder: None,
		}
	}

	#[must_use]
	pub fn view(&self) -> BindingView<T> {
		BindingView {
			mirror_rx: self.mirror_tx.subscribe(),
		}
	}

	#[must_use]
	pub fn current(&self) -> ViewState<T> {
		self.mirror_tx.borrow().view.clone()
	}

	/// Whether a subscription is still feeding the mirror. Turns `false` once the store ends the
	/// stream, even without a cancel.
	#[must_use]
	pub fn is_bound(&self) -> bool {
		self.forwarder
			.as_ref()
			.is_some_and(|forwarder| !forwarder.is_finished())
	}

	/// Starts mirroring `subscription`, cancelling whatever was bound before.
	///
	/// The mirror goes back to [`ViewState::Loading`] until the first snapshot arrives. Must be
	/// called from within a tokio runtime.
	pub fn bind<S, F>(&mut self, subscription: Subscription<S>, mut to_view: F)
	where
		S: Send + 'static,
		F: FnMut(S) -> ViewState<T> + Send + 'static,
	{
		let epoch = self.advance(Some(ViewState::Loading));

		let mirror_tx = Arc::clone(&self.mirror_tx);
		let (mut source, guard) = subscription.into_parts();
		self.guard = Some(guard);

		self.forwarder = Some(tokio::spawn(async move {
			while let Some(snapshot) = source.next().await {
				let view = to_view(snapshot);
				let mut stale = false;

				mirror_tx.send_if_modified(|mirror| {
					if mirror.epoch != epoch {
						stale = true;
						false
					} else if mirror.view == view {
						false
					} else {
						mirror.view = view;
						true
					}
				});

				if stale {
					trace!(epoch, "Dropping snapshot from a cancelled subscription");
					return;
				}
			}

			debug!(epoch, "Subscription ended");
		}
		.in_current_span()));
	}

	/// Stops mirroring. The last delivered view stays on screen.
	pub fn cancel(&mut self) {
		self.advance(None);
	}

	/// Stops mirroring and resets the view to [`ViewState::Loading`].
	pub fn clear(&mut self) {
		self.advance(Some(ViewState::Loading));
	}

	/// Stops mirroring and shows `message` instead.
	pub fn fail(&mut self, message: impl Into<String>) {
		self.advance(Some(ViewState::Failed(message.into())));
	}

	/// Invalidates the running forwarder and optionally replaces the view, in one write.
	fn advance(&mut self, view: Option<ViewState<T>>) -> u64 {
		let mut epoch = 0;

		self.mirror_tx.send_if_modified(|mirror| {
			mirror.epoch += 1;
			epoch = mirror.epoch;

			match view {
				Some(view) if view != mirror.view => {
					mirror.view = view;
					true
				}
				_ => false,
			}
		});

		if let Some(guard) = self.guard.take() {
			guard.release();
			debug!(epoch, "Cancelled live binding");
		}

		if let Some(forwarder) = self.forwarder.take() {
			forwarder.abort();
		}

		epoch
	}
}

impl<T> Default for LiveBinding<T>
where
	T: Clone + PartialEq + Send + Sync + 'static,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Drop for LiveBinding<T> {
	fn drop(&mut self) {
		if let Some(guard) = self.guard.take() {
			guard.release();
		}

		if let Some(forwarder) = self.forwarder.take() {
			forwarder.abort();
		}
	}
}

/// Read handle on a [`LiveBinding`]'s mirror, for presentation.
#[derive(Debug, Clone)]
pub struct BindingView<T> {
	mirror_rx: watch::Receiver<Mirror<T>>,
}

impl<T: Clone> BindingView<T> {
	#[must_use]
	pub fn current(&self) -> ViewState<T> {
		self.mirror_rx.borrow().view.clone()
	}

	/// Waits for the view to change. `None` once the binding is gone.
	pub async fn changed(&mut self) -> Option<ViewState<T>> {
		self.mirror_rx.changed().await.ok()?;

		Some(self.mirror_rx.borrow_and_update().view.clone())
	}

	/// Waits until the view satisfies `predicate`, checking the current view first.
	pub async fn wait_for(
		&mut self,
		mut predicate: impl FnMut(&ViewState<T>) -> bool,
	) -> Option<ViewState<T>> {
		self.mirror_rx
			.wait_for(|mirror| predicate(&mirror.view))
			.await
			.ok()
			.map(|mirror| mirror.view.clone())
	}
}

#[cfg(test)]
mod tests {
	use std::{
		sync::{
			atomic::{AtomicBool, Ordering},
			Arc,
		},
		time::Duration,
	};

	use tokio::{sync::mpsc, time::timeout};
	use tracing_test::traced_test;

	use super::*;

	fn subscription() -> (mpsc::UnboundedSender<u32>, Subscription<u32>, Arc<AtomicBool>) {
		let released = Arc::new(AtomicBool::new(false));
		let (tx, rx) = mpsc::unbounded_channel();

		let subscription = Subscription::new(rx, {
			let released = Arc::clone(&released);
			move || released.store(true, Ordering::SeqCst)
		});

		(tx, subscription, released)
	}

	async fn settle() {
		for _ in 0..16 {
			tokio::task::yield_now().await;
		}
	}

	#[tokio::test]
	#[traced_test]
	async fn mirrors_snapshots_in_order() {
		let (tx, subscription, _) = subscription();
		let mut binding = LiveBinding::new();
		let mut view = binding.view();

		assert_eq!(view.current(), ViewState::Loading);

		binding.bind(subscription, ViewState::Ready);
		tx.send(1).unwrap();
		assert_eq!(
			view.wait_for(|state| *state == ViewState::Ready(1)).await,
			Some(ViewState::Ready(1))
		);

		tx.send(2).unwrap();
		assert_eq!(view.changed().await, Some(ViewState::Ready(2)));
	}

	#[tokio::test]
	#[traced_test]
	async fn cancel_stops_every_later_emission() {
		let (tx, subscription, released) = subscription();
		let mut binding = LiveBinding::new();
		let mut view = binding.view();

		binding.bind(subscription, ViewState::Ready);
		tx.send(1).unwrap();
		view.wait_for(|state| *state == ViewState::Ready(1)).await;

		binding.cancel();
		assert!(released.load(Ordering::SeqCst));

		tx.send(2).ok();
		settle().await;

		assert!(!binding.is_bound());
		assert_eq!(binding.current(), ViewState::Ready(1));
		assert!(
			timeout(Duration::from_millis(50), view.changed())
				.await
				.is_err(),
			"no emission may follow a cancel"
		);
	}

	#[tokio::test]
	async fn rebinding_replaces_the_previous_subscription() {
		let (first_tx, first, first_released) = subscription();
		let (second_tx, second, _) = subscription();
		let mut binding = LiveBinding::new();
		let mut view = binding.view();

		binding.bind(first, ViewState::Ready);
		first_tx.send(1).unwrap();
		view.wait_for(|state| *state == ViewState::Ready(1)).await;

		binding.bind(second, |n| ViewState::Ready(n * 100));
		assert!(first_released.load(Ordering::SeqCst));
		assert_eq!(binding.current(), ViewState::Loading);

		first_tx.send(2).ok();
		second_tx.send(3).unwrap();

		assert_eq!(
			view.wait_for(|state| state.ready().is_some()).await,
			Some(ViewState::Ready(300))
		);
	}

	#[tokio::test]
	#[traced_test]
	async fn stream_closed_by_the_store_unbinds() {
		let (tx, subscription, released) = subscription();
		let mut binding = LiveBinding::new();
		let mut view = binding.view();

		binding.bind(subscription, ViewState::Ready);
		tx.send(5).unwrap();
		view.wait_for(|state| *state == ViewState::Ready(5)).await;
		assert!(binding.is_bound());

		drop(tx);
		settle().await;

		assert!(!binding.is_bound());
		assert_eq!(binding.current(), ViewState::Ready(5));
		assert!(logs_contain("Subscription ended"));

		// The listener stays registered until the binding lets go of it
		assert!(!released.load(Ordering::SeqCst));
		binding.cancel();
		assert!(released.load(Ordering::SeqCst));
	}

	#[tokio::test]
	async fn clear_and_fail_replace_the_view() {
		let (tx, subscription, _) = subscription();
		let mut binding = LiveBinding::new();
		let mut view = binding.view();

		binding.bind(subscription, ViewState::Ready);
		tx.send(7).unwrap();
		view.wait_for(|state| *state == ViewState::Ready(7)).await;

		binding.fail("remote store error: store is unavailable");
		assert!(matches!(binding.current(), ViewState::Failed(_)));

		binding.clear();
		assert!(binding.current().is_loading());
	}

	#[tokio::test]
	async fn view_ends_with_the_binding() {
		let binding = LiveBinding::<u32>::new();
		let mut view = binding.view();

		drop(binding);
		assert_eq!(view.changed().await, None);
	}
}
