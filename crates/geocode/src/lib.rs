#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

mod fixed;
mod nominatim;
mod place;

pub use fixed::FixedGeocoder;
pub use nominatim::{NominatimGeocoder, DEFAULT_NOMINATIM_URL};
pub use place::Place;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
	Granted,
	Denied,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
	#[error("location permission was denied")]
	CapabilityDenied,
	#[error("reverse geocoding request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("geocoding provider error: {0}")]
	Provider(String),
	#[error("no place found <lat={latitude}, lng={longitude}>")]
	NoResult { latitude: f64, longitude: f64 },
}

/// Reverse geocoding capability, gated behind a device location permission.
#[async_trait]
pub trait Geocoder: Send + Sync {
	async fn request_permission(&self) -> Permission;

	async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Place, GeocodeError>;
}

/// Asks for permission, then reverse geocodes the coordinates.
pub async fn locate(
	geocoder: &dyn Geocoder,
	latitude: f64,
	longitude: f64,
) -> Result<Place, GeocodeError> {
	if geocoder.request_permission().await == Permission::Denied {
		warn!("Permission to access location was denied");
		return Err(GeocodeError::CapabilityDenied);
	}

	let place = geocoder.reverse_geocode(latitude, longitude).await?;
	debug!(?place, "Reverse geocoded");

	Ok(place)
}

/// Address built from the structured fields, as shown under a spot.
pub async fn describe_location(
	geocoder: &dyn Geocoder,
	latitude: f64,
	longitude: f64,
) -> Result<String, GeocodeError> {
	locate(geocoder, latitude, longitude)
		.await?
		.describe()
		.ok_or(GeocodeError::NoResult {
			latitude,
			longitude,
		})
}

/// Provider's one-line name for the place, as filled into a new spot's location.
pub async fn label_location(
	geocoder: &dyn Geocoder,
	latitude: f64,
	longitude: f64,
) -> Result<String, GeocodeError> {
	locate(geocoder, latitude, longitude)
		.await?
		.label()
		.ok_or(GeocodeError::NoResult {
			latitude,
			longitude,
		})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn denial_skips_lookup() {
		let geocoder = FixedGeocoder::denied();

		assert!(matches!(
			describe_location(&geocoder, 10.3, 123.9).await,
			Err(GeocodeError::CapabilityDenied)
		));
		assert_eq!(geocoder.lookups(), 0);
	}

	#[tokio::test]
	async fn empty_place_is_no_result() {
		let geocoder = FixedGeocoder::granted(Place::default());

		assert!(matches!(
			describe_location(&geocoder, 10.3, 123.9).await,
			Err(GeocodeError::NoResult { .. })
		));
	}

	#[tokio::test]
	async fn label_prefers_the_provider_name() {
		let geocoder = FixedGeocoder::granted(Place {
			name: Some("Fuente Osmeña".into()),
			city: Some("Cebu City".into()),
			display_name: Some(
				"Fuente Osmeña Circle, Cebu City, Central Visayas, Philippines".into(),
			),
			..Default::default()
		});

		assert_eq!(
			label_location(&geocoder, 10.31, 123.89).await.unwrap(),
			"Fuente Osmeña Circle, Cebu City, Central Visayas, Philippines"
		);
		assert_eq!(
			describe_location(&geocoder, 10.31, 123.89).await.unwrap(),
			"Fuente Osmeña, Cebu City"
		);
	}
}
