use crate::{
	error::Error,
	repository::SpotRepository,
	spot::{OwnerId, Spot, SpotId},
};

use async_trait::async_trait;
use sb_geocode::{describe_location, Geocoder};
use tracing::{debug, instrument, warn};

use super::{
	map::{Marker, Region, SPOT_DELTA},
	BindingView, LiveBinding, OwnerScoped, ViewState,
};

/// Shown in place of an empty category or description.
pub const NOT_AVAILABLE: &str = "N/A";

/// One spot, kept live. A spot that stops existing turns the view into
/// [`ViewState::NotFound`].
///
/// Under a [`SessionScope`](super::SessionScope) the binding remembers which spot it shows, opens
/// it once the session is authenticated and lets go of it when the session ends.
#[derive(Debug)]
pub struct SpotDetailBinding {
	repository: SpotRepository,
	binding: LiveBinding<Spot>,
	/// Spot the screen was navigated to, kept across closes.
	target: Option<SpotId>,
	/// Spot the live subscription is currently open for.
	spot_id: Option<SpotId>,
	address: Option<String>,
}

impl SpotDetailBinding {
	#[must_use]
	pub fn new(repository: SpotRepository) -> Self {
		Self {
			repository,
			binding: LiveBinding::new(),
			target: None,
			spot_id: None,
			address: None,
		}
	}

	/// A detail screen for `id` that doesn't subscribe until it is opened.
	#[must_use]
	pub fn for_spot(repository: SpotRepository, id: SpotId) -> Self {
		Self {
			target: Some(id),
			..Self::new(repository)
		}
	}

	#[must_use]
	pub fn view(&self) -> BindingView<Spot> {
		self.binding.view()
	}

	#[must_use]
	pub fn current(&self) -> ViewState<Spot> {
		self.binding.current()
	}

	#[must_use]
	pub const fn spot_id(&self) -> Option<&SpotId> {
		self.spot_id.as_ref()
	}

	#[must_use]
	pub const fn target(&self) -> Option<&SpotId> {
		self.target.as_ref()
	}

	/// Starts showing `id`, releasing whatever spot was shown before.
	#[instrument(skip(self), err)]
	pub async fn open(&mut self, id: &SpotId) -> Result<(), Error> {
		self.address = None;
		self.target = Some(id.clone());
		self.spot_id = None;
		self.binding.clear();

		match self.repository.subscribe_one(id).await {
			Ok(subscription) => {
				self.binding.bind(subscription, |spot| {
					spot.map_or(ViewState::NotFound, ViewState::Ready)
				});
				self.spot_id = Some(id.clone());
				Ok(())
			}
			Err(e) => {
				self.binding.fail(e.to_string());
				self.spot_id = None;
				Err(e)
			}
		}
	}

	/// Stops following the spot. The last view stays on screen.
	pub fn close(&mut self) {
		self.spot_id = None;
		self.address = None;
		self.binding.cancel();
	}

	/// Human readable address of the shown spot, once resolved.
	#[must_use]
	pub fn address(&self) -> Option<&str> {
		self.address.as_deref()
	}

	/// One-shot permission request and reverse geocode for the shown spot.
	///
	/// Denial or failure only leaves the address empty, the rest of the screen is unaffected.
	pub async fn resolve_address(&mut self, geocoder: &dyn Geocoder) -> Option<&str> {
		let coordinates = self
			.binding
			.current()
			.ready()
			.and_then(|spot| spot.coordinates)?;

		match describe_location(geocoder, coordinates.latitude, coordinates.longitude).await {
			Ok(address) => {
				debug!(%address, "Resolved spot address");
				self.address = Some(address);
			}
			Err(e) => {
				warn!(?e, "Error getting address");
				self.address = None;
			}
		}

		self.address()
	}

	#[must_use]
	pub fn map_region(&self) -> Option<Region> {
		self.binding
			.current()
			.ready()
			.and_then(|spot| spot.coordinates)
			.map(|coordinates| Region::around(coordinates, SPOT_DELTA))
	}

	#[must_use]
	pub fn marker(&self) -> Option<Marker> {
		let view = self.binding.current();
		let spot = view.ready()?;

		spot.coordinates.map(|coordinates| Marker {
			coordinates,
			title: spot.display_name().to_owned(),
		})
	}
}

#[async_trait]
impl OwnerScoped for SpotDetailBinding {
	async fn open(&mut self, owner: &OwnerId) -> Result<(), Error> {
		let Some(target) = self.target.clone() else {
			return Ok(());
		};

		if self.binding.is_bound() && self.spot_id.as_ref() == Some(&target) {
			return Ok(());
		}

		debug!(%owner, spot_id = %target, "Opening spot detail");
		Self::open(self, &target).await
	}

	/// Nothing of the spot stays on screen once the session is gone.
	fn close(&mut self) {
		Self::close(self);
		self.binding.clear();
	}
}

/// `value`, or [`NOT_AVAILABLE`] when it is blank.
#[must_use]
pub fn or_not_available(value: &str) -> &str {
	if value.trim().is_empty() {
		NOT_AVAILABLE
	} else {
		value
	}
}
