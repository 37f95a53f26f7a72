use crate::{
	error::Error,
	spot::{NewSpot, OwnerId, Spot, SpotId, SpotPatch, OWNER_FIELD},
};

use std::{fmt, sync::Arc};

use chrono::Utc;
use sb_store::{DocumentSnapshot, DocumentStore, Filter, QuerySnapshot, StoreError, Subscription};
use tracing::{debug, info, instrument, warn};

/// Spot operations on top of a [`DocumentStore`] collection.
///
/// Writes never touch a local mirror: a caller sees its own write only once an open subscription
/// delivers the next snapshot.
#[derive(Clone)]
pub struct SpotRepository {
	store: Arc<dyn DocumentStore>,
	collection: Arc<str>,
}

impl SpotRepository {
	pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<Arc<str>>) -> Self {
		Self {
			store,
			collection: collection.into(),
		}
	}

	#[must_use]
	pub fn collection(&self) -> &str {
		&self.collection
	}

	/// Live set of every spot owned by `owner`, redelivered in full on each change.
	#[instrument(skip(self), err)]
	pub async fn subscribe_by_owner(
		&self,
		owner: &OwnerId,
	) -> Result<Subscription<Vec<Spot>>, Error> {
		let subscription = self
			.store
			.subscribe_query(
				&self.collection,
				Filter::field_eq(OWNER_FIELD, owner.as_str()),
			)
			.await?;

		debug!("Subscribed to owner spots");

		Ok(subscription.map(spots_from_snapshot))
	}

	/// Live view of one spot; `None` whenever it doesn't exist.
	#[instrument(skip(self), err)]
	pub async fn subscribe_one(&self, id: &SpotId) -> Result<Subscription<Option<Spot>>, Error> {
		let subscription = self.store.subscribe_doc(&self.collection, id).await?;

		debug!("Subscribed to spot");

		Ok(subscription.map(spot_from_snapshot))
	}

	/// One-shot read, used to seed the edit form.
	pub async fn get(&self, id: &SpotId) -> Result<Option<Spot>, Error> {
		self.store
			.get(&self.collection, id)
			.await?
			.map(|doc| Spot::from_document(id.clone(), doc))
			.transpose()
			.map_err(|e| StoreError::from(e).into())
	}

	#[instrument(skip(self, spot), fields(name = %spot.name), err)]
	pub async fn create(&self, owner: &OwnerId, spot: NewSpot) -> Result<SpotId, Error> {
		spot.validate()?;

		let doc = spot
			.into_document(owner.clone(), Utc::now())
			.map_err(StoreError::from)?;
		let id = self.store.create(&self.collection, doc).await?;

		info!(%id, "Created spot");

		Ok(id)
	}

	#[instrument(skip(self, patch), err)]
	pub async fn update(&self, id: &SpotId, patch: SpotPatch) -> Result<(), Error> {
		patch.validate()?;

		let doc = patch.into_document(Utc::now()).map_err(StoreError::from)?;
		self.store.update(&self.collection, id, doc).await?;

		info!("Updated spot");

		Ok(())
	}

	/// Removing a spot that is already gone succeeds.
	#[instrument(skip(self), err)]
	pub async fn delete(&self, id: &SpotId) -> Result<(), Error> {
		self.store.delete(&self.collection, id).await?;

		info!("Deleted spot");

		Ok(())
	}
}

impl fmt::Debug for SpotRepository {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SpotRepository")
			.field("collection", &self.collection)
			.finish_non_exhaustive()
	}
}

fn spots_from_snapshot(snapshot: QuerySnapshot) -> Vec<Spot> {
	snapshot
		.docs
		.into_iter()
		.filter_map(|doc| {
			Spot::from_document(doc.id.clone(), doc.data)
				.map_err(|e| warn!(id = %doc.id, ?e, "Skipping malformed spot document"))
				.ok()
		})
		.collect()
}

fn spot_from_snapshot(snapshot: DocumentSnapshot) -> Option<Spot> {
	let DocumentSnapshot { id, data } = snapshot;

	data.and_then(|doc| {
		Spot::from_document(id.clone(), doc)
			.map_err(|e| warn!(%id, ?e, "Malformed spot document, treating as absent"))
			.ok()
	})
}

#[cfg(test)]
mod tests {
	use crate::{error::ValidationError, spot::Coordinates};

	use sb_store::{Credentials, IdentityProvider, MemoryBackend};
	use serde_json::json;
	use tracing_test::traced_test;

	use super::*;

	const COLLECTION: &str = "goals";

	fn repository() -> (MemoryBackend, SpotRepository) {
		let backend = MemoryBackend::new();
		let repository = SpotRepository::new(Arc::new(backend.clone()), COLLECTION);
		(backend, repository)
	}

	fn spot(name: &str, latitude: f64, longitude: f64) -> NewSpot {
		NewSpot {
			name: name.into(),
			coordinates: Some(Coordinates::new(latitude, longitude).unwrap()),
			..Default::default()
		}
	}

	#[tokio::test]
	#[traced_test]
	async fn create_then_read_back() {
		let (_, repository) = repository();
		let owner = OwnerId::new("owner-1");

		let id = repository
			.create(&owner, spot("Magellan's Cross", 12.0, 123.0))
			.await
			.unwrap();

		let stored = repository.get(&id).await.unwrap().unwrap();
		assert_eq!(stored.id, id);
		assert_eq!(stored.name, "Magellan's Cross");
		assert_eq!(
			stored.coordinates,
			Some(Coordinates {
				latitude: 12.0,
				longitude: 123.0
			})
		);
		assert_eq!(stored.owner_id, owner);
		assert!(stored.updated_at.is_none());
	}

	#[tokio::test]
	async fn invalid_writes_never_reach_the_store() {
		let (backend, repository) = repository();
		let owner = OwnerId::new("owner-1");
		let mut all = backend
			.subscribe_query(COLLECTION, Filter::All)
			.await
			.unwrap();
		assert!(all.next_snapshot().await.unwrap().is_empty());

		assert!(matches!(
			repository.create(&owner, spot("  ", 10.0, 123.0)).await,
			Err(Error::Validation(ValidationError::MissingName))
		));
		assert!(matches!(
			repository
				.create(
					&owner,
					NewSpot {
						name: "Sirao Garden".into(),
						..Default::default()
					}
				)
				.await,
			Err(Error::Validation(ValidationError::MissingCoordinates))
		));

		let id = repository
			.create(&owner, spot("Sirao Garden", 10.4, 123.87))
			.await
			.unwrap();
		assert_eq!(all.next_snapshot().await.unwrap().len(), 1);

		for patch in [
			SpotPatch {
				name: String::new(),
				location: "Busay".into(),
				..Default::default()
			},
			SpotPatch {
				name: "Sirao Garden".into(),
				location: " ".into(),
				..Default::default()
			},
		] {
			assert!(matches!(
				repository.update(&id, patch).await,
				Err(Error::Validation(_))
			));
		}

		let stored = repository.get(&id).await.unwrap().unwrap();
		assert!(stored.updated_at.is_none());
		assert!(all.try_next_snapshot().is_none());
	}

	#[tokio::test]
	async fn update_keeps_coordinates() {
		let (_, repository) = repository();
		let owner = OwnerId::new("owner-1");
		let id = repository
			.create(&owner, spot("Temple of Leah", 10.37, 123.87))
			.await
			.unwrap();

		repository
			.update(
				&id,
				SpotPatch {
					name: "Temple of Leah".into(),
					category: "Landmark".into(),
					location: "Busay, Cebu City".into(),
					description: "Roman-inspired temple".into(),
				},
			)
			.await
			.unwrap();

		let stored = repository.get(&id).await.unwrap().unwrap();
		assert_eq!(stored.category, "Landmark");
		assert_eq!(stored.location, "Busay, Cebu City");
		assert_eq!(stored.coordinates.map(|c| c.latitude), Some(10.37));
		assert!(stored.updated_at.is_some());
	}

	#[tokio::test]
	async fn owner_subscription_only_sees_own_spots() {
		let (backend, repository) = repository();
		let alice = backend
			.sign_up(&Credentials::new("alice@cebu.ph", "password"))
			.await
			.unwrap();
		let bob = OwnerId::new("bob");

		let mut spots = repository.subscribe_by_owner(&alice).await.unwrap();
		assert!(spots.next_snapshot().await.unwrap().is_empty());

		repository.create(&bob, spot("Osmeña Peak", 9.9, 123.4)).await.unwrap();
		repository.create(&alice, spot("Kawasan Falls", 9.8, 123.37)).await.unwrap();
		repository.create(&bob, spot("Tumalog Falls", 9.4, 123.4)).await.unwrap();
		repository.create(&alice, spot("Moalboal", 9.95, 123.39)).await.unwrap();

		for _ in 0..2 {
			let snapshot = spots.next_snapshot().await.unwrap();
			assert!(snapshot.iter().all(|spot| spot.owner_id == alice));
		}
	}

	#[tokio::test]
	#[traced_test]
	async fn malformed_documents_are_skipped() {
		let (backend, repository) = repository();
		let owner = OwnerId::new("owner-1");

		let mut broken = sb_store::Document::new();
		broken.insert("userId".into(), json!("owner-1"));
		broken.insert("coords".into(), json!("not coordinates"));
		backend.create(COLLECTION, broken).await.unwrap();

		repository.create(&owner, spot("Bantayan", 11.2, 123.7)).await.unwrap();

		let mut spots = repository.subscribe_by_owner(&owner).await.unwrap();
		let snapshot = spots.next_snapshot().await.unwrap();
		assert_eq!(snapshot.len(), 1);
		assert_eq!(snapshot[0].name, "Bantayan");
		assert!(logs_contain("Skipping malformed spot document"));
	}

	#[tokio::test]
	async fn remote_failures_are_tagged() {
		let (backend, repository) = repository();
		backend.set_offline(true);

		assert!(matches!(
			repository.delete(&SpotId::from("any")).await,
			Err(Error::RemoteStore(StoreError::Unavailable))
		));
		assert!(matches!(
			repository
				.subscribe_by_owner(&OwnerId::new("owner-1"))
				.await,
			Err(Error::RemoteStore(StoreError::Unavailable))
		));
	}
}
