use crate::{GeocodeError, Geocoder, Permission, Place};

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

/// Geocoder with a canned answer, for tests and offline runs.
#[derive(Debug)]
pub struct FixedGeocoder {
	permission: Permission,
	place: Option<Place>,
	lookups: AtomicUsize,
}

impl FixedGeocoder {
	#[must_use]
	pub const fn granted(place: Place) -> Self {
		Self {
			permission: Permission::Granted,
			place: Some(place),
			lookups: AtomicUsize::new(0),
		}
	}

	#[must_use]
	pub const fn denied() -> Self {
		Self {
			permission: Permission::Denied,
			place: None,
			lookups: AtomicUsize::new(0),
		}
	}

	/// Permission is granted but every lookup fails.
	#[must_use]
	pub const fn failing() -> Self {
		Self {
			permission: Permission::Granted,
			place: None,
			lookups: AtomicUsize::new(0),
		}
	}

	pub fn lookups(&self) -> usize {
		self.lookups.load(Ordering::Relaxed)
	}
}

#[async_trait]
impl Geocoder for FixedGeocoder {
	async fn request_permission(&self) -> Permission {
		self.permission
	}

	async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Place, GeocodeError> {
		self.lookups.fetch_add(1, Ordering::Relaxed);

		self.place.clone().ok_or_else(|| {
			GeocodeError::Provider(format!("no fixture for <lat={latitude}, lng={longitude}>"))
		})
	}
}
