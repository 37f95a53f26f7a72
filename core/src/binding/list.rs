use crate::{
	error::Error,
	repository::SpotRepository,
	spot::{OwnerId, Spot, SpotId},
};

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{BindingView, LiveBinding, OwnerScoped, ViewState};

/// The signed in user's spots, kept live.
#[derive(Debug)]
pub struct SpotListBinding {
	repository: SpotRepository,
	binding: LiveBinding<Vec<Spot>>,
	owner: Option<OwnerId>,
}

impl SpotListBinding {
	#[must_use]
	pub fn new(repository: SpotRepository) -> Self {
		Self {
			repository,
			binding: LiveBinding::new(),
			owner: None,
		}
	}

	#[must_use]
	pub fn view(&self) -> BindingView<Vec<Spot>> {
		self.binding.view()
	}

	#[must_use]
	pub fn current(&self) -> ViewState<Vec<Spot>> {
		self.binding.current()
	}

	#[must_use]
	pub const fn owner(&self) -> Option<&OwnerId> {
		self.owner.as_ref()
	}

	/// Starts listing `owner`'s spots. Reopening for the same owner keeps the running
	/// subscription.
	#[instrument(skip(self), err)]
	pub async fn open(&mut self, owner: &OwnerId) -> Result<(), Error> {
		if self.binding.is_bound() && self.owner.as_ref() == Some(owner) {
			return Ok(());
		}

		// The previous owner's listener goes before the next one is registered
		self.owner = None;
		self.binding.clear();

		match self.repository.subscribe_by_owner(owner).await {
			Ok(subscription) => {
				self.binding.bind(subscription, ViewState::Ready);
				self.owner = Some(owner.clone());
				Ok(())
			}
			Err(e) => {
				self.binding.fail(e.to_string());
				Err(e)
			}
		}
	}

	/// Drops the subscription along with everything it showed.
	pub fn close(&mut self) {
		if let Some(owner) = self.owner.take() {
			debug!(%owner, "Closing spot list");
		}
		self.binding.clear();
	}

	/// The removal shows up through the live subscription, the mirror is never patched here.
	pub async fn delete(&self, id: &SpotId) -> Result<(), Error> {
		self.repository.delete(id).await
	}
}

#[async_trait]
impl OwnerScoped for SpotListBinding {
	async fn open(&mut self, owner: &OwnerId) -> Result<(), Error> {
		Self::open(self, owner).await
	}

	fn close(&mut self) {
		Self::close(self);
	}
}

#[cfg(test)]
mod tests {
	use crate::spot::{Coordinates, NewSpot};

	use std::sync::Arc;

	use sb_store::{MemoryBackend, StoreError};
	use tracing_test::traced_test;

	use super::*;

	fn list() -> (MemoryBackend, SpotRepository, SpotListBinding) {
		let backend = MemoryBackend::new();
		let repository = SpotRepository::new(Arc::new(backend.clone()), "goals");
		let list = SpotListBinding::new(repository.clone());
		(backend, repository, list)
	}

	fn spot(name: &str) -> NewSpot {
		NewSpot {
			name: name.into(),
			coordinates: Some(Coordinates::new(10.29, 123.9).unwrap()),
			..Default::default()
		}
	}

	fn names(state: &ViewState<Vec<Spot>>) -> Vec<String> {
		state
			.ready()
			.map(|spots| spots.iter().map(|spot| spot.name.clone()).collect())
			.unwrap_or_default()
	}

	#[tokio::test]
	#[traced_test]
	async fn follows_creates_and_deletes() {
		let (_, repository, mut list) = list();
		let owner = OwnerId::new("owner-1");
		let mut view = list.view();

		list.open(&owner).await.unwrap();
		assert_eq!(
			view.wait_for(|state| state.ready().is_some()).await,
			Some(ViewState::Ready(Vec::new()))
		);

		let id = repository.create(&owner, spot("Basilica del Santo Niño")).await.unwrap();
		let state = view.wait_for(|state| names(state).len() == 1).await.unwrap();
		assert_eq!(names(&state), ["Basilica del Santo Niño"]);

		list.delete(&id).await.unwrap();
		view.wait_for(|state| *state == ViewState::Ready(Vec::new()))
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn close_forgets_the_owner() {
		let (_, repository, mut list) = list();
		let owner = OwnerId::new("owner-1");
		repository.create(&owner, spot("Fort San Pedro")).await.unwrap();

		list.open(&owner).await.unwrap();
		list.view()
			.wait_for(|state| names(state).len() == 1)
			.await
			.unwrap();

		list.close();
		assert_eq!(list.owner(), None);
		assert_eq!(list.current(), ViewState::Loading);
	}

	#[tokio::test]
	async fn remote_failure_becomes_display_state() {
		let (backend, _, mut list) = list();
		backend.set_offline(true);

		assert!(matches!(
			list.open(&OwnerId::new("owner-1")).await,
			Err(Error::RemoteStore(StoreError::Unavailable))
		));
		assert!(matches!(list.current(), ViewState::Failed(_)));
	}

	#[tokio::test]
	#[traced_test]
	async fn switching_owners_keeps_one_listener() {
		let (backend, _, mut list) = list();

		list.open(&OwnerId::new("owner-1")).await.unwrap();
		assert_eq!(backend.live_subscriptions(), 1);

		list.open(&OwnerId::new("owner-2")).await.unwrap();
		assert_eq!(backend.live_subscriptions(), 1);
		assert_eq!(list.owner(), Some(&OwnerId::new("owner-2")));

		// Same owner again keeps the running subscription
		list.open(&OwnerId::new("owner-2")).await.unwrap();
		assert_eq!(backend.live_subscriptions(), 1);

		list.close();
		assert_eq!(backend.live_subscriptions(), 0);
	}
}
