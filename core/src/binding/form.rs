use crate::{
	error::{Error, ValidationError},
	navigation::{CreateParams, FormPrefill, Navigation, Route},
	repository::SpotRepository,
	spot::{Coordinates, NewSpot, OwnerId, SpotId, SpotPatch},
};

use sb_geocode::{label_location, Geocoder};
use tracing::{debug, warn};

/// Input state of the create screen.
///
/// Submitting never touches a list mirror; the new spot shows up once the list subscription
/// delivers it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateForm {
	pub name: String,
	pub category: String,
	pub location: String,
	pub description: String,
	coordinates: Option<Coordinates>,
	error: Option<ValidationError>,
}

impl CreateForm {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub const fn coordinates(&self) -> Option<Coordinates> {
		self.coordinates
	}

	/// Inline message from the last rejected submit.
	#[must_use]
	pub const fn error(&self) -> Option<ValidationError> {
		self.error
	}

	/// Restores text carried through navigation, then applies a pin picked on the map.
	pub async fn apply(&mut self, params: CreateParams, geocoder: &dyn Geocoder) {
		let CreateParams { prefill, pending } = params;

		if let Some(name) = prefill.name {
			self.name = name;
		}
		if let Some(category) = prefill.category {
			self.category = category;
		}
		if let Some(description) = prefill.description {
			self.description = description;
		}

		if let Some(coordinates) = pending {
			self.set_coordinates(coordinates, geocoder).await;
		}
	}

	/// Sets the pin and fills the location with the provider's name for the place.
	///
	/// When the lookup is denied or fails, a typed location is kept and an empty one becomes
	/// the raw coordinates.
	pub async fn set_coordinates(&mut self, coordinates: Coordinates, geocoder: &dyn Geocoder) {
		self.coordinates = Some(coordinates);

		match label_location(geocoder, coordinates.latitude, coordinates.longitude).await {
			Ok(location) => {
				debug!(%location, "Filled location from pin");
				self.location = location;
			}
			Err(e) => {
				warn!(?e, "Failed to look up picked location");
				if self.location.trim().is_empty() {
					self.location = coordinates.to_string();
				}
			}
		}
	}

	/// Opens the map picker, carrying the text typed so far.
	#[must_use]
	pub fn pick_on_map(&self) -> Navigation {
		Navigation::Push(Route::MapPicker(FormPrefill {
			name: Some(self.name.clone()),
			category: Some(self.category.clone()),
			description: Some(self.description.clone()),
		}))
	}

	/// Creates the spot for `owner`, clears the form and heads to the list.
	///
	/// On failure the input is kept as typed.
	pub async fn submit(
		&mut self,
		repository: &SpotRepository,
		owner: &OwnerId,
	) -> Result<Navigation, Error> {
		let spot = NewSpot {
			name: self.name.clone(),
			category: self.category.clone(),
			location: self.location.clone(),
			coordinates: self.coordinates,
			description: self.description.clone(),
		};

		match repository.create(owner, spot).await {
			Ok(_) => {
				*self = Self::default();
				Ok(Navigation::Push(Route::SpotList))
			}
			Err(Error::Validation(e)) => {
				self.error = Some(e);
				Err(e.into())
			}
			Err(e) => Err(e),
		}
	}
}

/// Input state of the edit screen, seeded by a one-shot read.
///
/// Only name, category, location and description are editable.
#[derive(Debug, Clone, PartialEq)]
pub struct EditForm {
	id: SpotId,
	pub name: String,
	pub category: String,
	pub location: String,
	pub description: String,
	error: Option<ValidationError>,
}

impl EditForm {
	pub async fn load(repository: &SpotRepository, id: &SpotId) -> Result<Self, Error> {
		let spot = repository
			.get(id)
			.await?
			.ok_or_else(|| Error::NotFound(id.clone()))?;

		Ok(Self {
			id: spot.id,
			name: spot.name,
			category: spot.category,
			location: spot.location,
			description: spot.description,
			error: None,
		})
	}

	#[must_use]
	pub const fn id(&self) -> &SpotId {
		&self.id
	}

	#[must_use]
	pub const fn error(&self) -> Option<ValidationError> {
		self.error
	}

	pub async fn submit(&mut self, repository: &SpotRepository) -> Result<Navigation, Error> {
		let patch = SpotPatch {
			name: self.name.clone(),
			category: self.category.clone(),
			location: self.location.clone(),
			description: self.description.clone(),
		};

		match repository.update(&self.id, patch).await {
			Ok(()) => {
				self.error = None;
				Ok(Navigation::Push(Route::SpotList))
			}
			Err(Error::Validation(e)) => {
				self.error = Some(e);
				Err(e.into())
			}
			Err(e) => Err(e),
		}
	}
}
