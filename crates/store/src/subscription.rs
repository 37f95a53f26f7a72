use std::{
	fmt,
	pin::Pin,
	task::{Context, Poll},
};

use futures::{
	stream::BoxStream,
	FutureExt, Stream, StreamExt,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

type Unsubscribe = Box<dyn FnOnce() + Send>;

/// Handle to a standing read on the backend.
///
/// Yields snapshots in emission order until cancelled. Releasing the handle, either through
/// [`Subscription::cancel`] or by dropping it, unregisters the listener on the backend side; any
/// snapshot still buffered is discarded with it.
pub struct Subscription<T> {
	source: BoxStream<'static, T>,
	guard: SubscriptionGuard,
}

/// Keeps a backend listener registered. Dropping it unregisters the listener right away, on the
/// calling thread.
pub struct SubscriptionGuard {
	unsubscribe: Option<Unsubscribe>,
}

impl<T: Send + 'static> Subscription<T> {
	pub fn new(rx: mpsc::UnboundedReceiver<T>, unsubscribe: impl FnOnce() + Send + 'static) -> Self {
		Self {
			source: UnboundedReceiverStream::new(rx).boxed(),
			guard: SubscriptionGuard {
				unsubscribe: Some(Box::new(unsubscribe)),
			},
		}
	}

	/// Waits for the next snapshot. `None` means the backend went away.
	pub async fn next_snapshot(&mut self) -> Option<T> {
		self.source.next().await
	}

	/// Returns an already delivered snapshot without waiting.
	pub fn try_next_snapshot(&mut self) -> Option<T> {
		self.source.next().now_or_never().flatten()
	}

	/// Converts every snapshot, keeping the same backend listener.
	#[must_use]
	pub fn map<U, F>(self, f: F) -> Subscription<U>
	where
		U: Send + 'static,
		F: FnMut(T) -> U + Send + 'static,
	{
		Subscription {
			source: self.source.map(f).boxed(),
			guard: self.guard,
		}
	}

	/// Separates the snapshot stream from the listener registration, so the two can live in
	/// different places. Snapshots buffered before the guard is dropped are still yielded.
	#[must_use]
	pub fn into_parts(self) -> (BoxStream<'static, T>, SubscriptionGuard) {
		(self.source, self.guard)
	}

	pub fn cancel(self) {
		self.guard.release();
	}
}

impl SubscriptionGuard {
	pub fn release(mut self) {
		self.unregister();
	}

	#[must_use]
	pub const fn is_active(&self) -> bool {
		self.unsubscribe.is_some()
	}

	fn unregister(&mut self) {
		if let Some(unsubscribe) = self.unsubscribe.take() {
			unsubscribe();
		}
	}
}

impl Drop for SubscriptionGuard {
	fn drop(&mut self) {
		self.unregister();
	}
}

impl<T> Stream for Subscription<T> {
	type Item = T;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.get_mut().source.poll_next_unpin(cx)
	}
}

impl<T> fmt::Debug for Subscription<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.guard.is_active())
			.finish_non_exhaustive()
	}
}

impl fmt::Debug for SubscriptionGuard {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SubscriptionGuard")
			.field("active", &self.is_active())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	};

	use super::*;

	#[tokio::test]
	async fn unsubscribes_exactly_once() {
		let calls = Arc::new(AtomicUsize::new(0));
		let (tx, rx) = mpsc::unbounded_channel::<u32>();

		let sub = Subscription::new(rx, {
			let calls = Arc::clone(&calls);
			move || {
				calls.fetch_add(1, Ordering::SeqCst);
			}
		});

		tx.send(1).unwrap();
		let mut mapped = sub.map(|n| n * 10);
		assert_eq!(mapped.next_snapshot().await, Some(10));

		mapped.cancel();
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn drop_releases_listener() {
		let calls = Arc::new(AtomicUsize::new(0));
		let (_tx, rx) = mpsc::unbounded_channel::<()>();

		drop(Subscription::new(rx, {
			let calls = Arc::clone(&calls);
			move || {
				calls.fetch_add(1, Ordering::SeqCst);
			}
		}));

		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn guard_outlives_split_stream() {
		let calls = Arc::new(AtomicUsize::new(0));
		let (tx, rx) = mpsc::unbounded_channel::<u32>();

		let (mut source, guard) = Subscription::new(rx, {
			let calls = Arc::clone(&calls);
			move || {
				calls.fetch_add(1, Ordering::SeqCst);
			}
		})
		.into_parts();

		tx.send(7).unwrap();
		assert_eq!(source.next().await, Some(7));

		// Dropping the stream alone keeps the listener registered
		drop(source);
		assert_eq!(calls.load(Ordering::SeqCst), 0);

		drop(guard);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}
}
