use crate::{
	navigation::{CreateParams, FormPrefill, Navigation, Route},
	spot::Coordinates,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Zoom used when a map is centred on a single spot.
pub const SPOT_DELTA: f64 = 0.01;

/// Visible map area, centred on a point and spanning `delta` degrees each way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
	pub latitude: f64,
	pub longitude: f64,
	pub latitude_delta: f64,
	pub longitude_delta: f64,
}

impl Region {
	#[must_use]
	pub const fn around(coordinates: Coordinates, delta: f64) -> Self {
		Self {
			latitude: coordinates.latitude,
			longitude: coordinates.longitude,
			latitude_delta: delta,
			longitude_delta: delta,
		}
	}
}

impl Default for Region {
	/// Cebu City.
	fn default() -> Self {
		Self {
			latitude: 10.3157,
			longitude: 123.8854,
			latitude_delta: 0.05,
			longitude_delta: 0.05,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
	pub coordinates: Coordinates,
	pub title: String,
}

/// Map screen used to drop a pin for a new spot.
///
/// The create form's text travels through as [`FormPrefill`] so nothing typed so far is lost.
#[derive(Debug, Clone)]
pub struct MapPicker {
	region: Region,
	prefill: FormPrefill,
	selected: Option<Coordinates>,
}

impl MapPicker {
	#[must_use]
	pub const fn new(region: Region, prefill: FormPrefill) -> Self {
		Self {
			region,
			prefill,
			selected: None,
		}
	}

	#[must_use]
	pub const fn region(&self) -> Region {
		self.region
	}

	#[must_use]
	pub const fn selected(&self) -> Option<Coordinates> {
		self.selected
	}

	pub fn tap(&mut self, coordinates: Coordinates) {
		debug!(%coordinates, "Pin dropped");
		self.selected = Some(coordinates);
	}

	#[must_use]
	pub fn marker(&self) -> Option<Marker> {
		self.selected.map(|coordinates| Marker {
			coordinates,
			title: "Selected Spot".to_owned(),
		})
	}

	#[must_use]
	pub fn status(&self) -> String {
		self.selected.map_or_else(
			|| "Tap on the map to drop a pin".to_owned(),
			|coordinates| coordinates.short(),
		)
	}

	/// Replaces the map with the create screen, so going back never lands on a stale form.
	/// Does nothing until a pin was dropped.
	#[must_use]
	pub fn confirm(&self) -> Option<Navigation> {
		self.selected.map(|coordinates| {
			Navigation::Replace(Route::CreateSpot(CreateParams {
				prefill: self.prefill.clone(),
				pending: Some(coordinates),
			}))
		})
	}

	#[must_use]
	pub const fn cancel(&self) -> Navigation {
		Navigation::Back
	}
}
